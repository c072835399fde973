//! Phase de-energisation.

use std::cell::Cell;

use gt_core::{GridError, GridResult, PhaseCode, PhaseSet, PhaseStatus, SinglePhaseKind, TerminalId};
use gt_network::Network;
use gt_trace::{
    NetworkStateOperators, NetworkTrace, NetworkTraceStep, StepPath, TraceContext, stop_at_open,
};

use crate::phase_weighted_queue;

/// Payload of a removal step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EbbPhases {
    pending: PhaseSet,
    cleared: Cell<PhaseSet>,
}

impl EbbPhases {
    fn new(pending: PhaseSet) -> Self {
        Self {
            pending,
            cleared: Cell::new(PhaseSet::EMPTY),
        }
    }

    /// Nominal phases to clear at the arrival terminal.
    pub fn pending(&self) -> PhaseSet {
        self.pending
    }

    /// Nominal phases that were energised there and have been cleared.
    pub fn cleared(&self) -> PhaseSet {
        self.cleared.get()
    }
}

/// Removes traced phases outward from a terminal.
///
/// Only phases that were still energised when reached are carried on, so
/// removal ebbs away where the network is already de-energised.
pub struct RemovePhases<'s> {
    state: &'s dyn NetworkStateOperators,
}

impl<'s> RemovePhases<'s> {
    pub fn new(state: &'s dyn NetworkStateOperators) -> Self {
        Self { state }
    }

    /// De-energise every terminal of `network`. Returns how many changed.
    pub fn remove_all(&self, network: &Network) -> usize {
        let cleared = network
            .terminals()
            .iter()
            .filter(|t| self.state.set_phase_status(t, PhaseStatus::DE_ENERGISED))
            .count();
        tracing::info!(cleared, state = %self.state.state(), "traced phases removed");
        cleared
    }

    /// Remove `phases` (all nominal phases when `None`) from `terminal` and
    /// everything they energised from it.
    pub fn run_from_terminal(
        &self,
        network: &Network,
        terminal: TerminalId,
        phases: Option<PhaseCode>,
    ) -> GridResult<()> {
        let state = self.state;
        let nominal = network.try_terminal(terminal)?.phases();
        let code = phases.unwrap_or(nominal);
        let pending = PhaseSet::from(code).intersection(PhaseSet::from(nominal));
        if pending.is_empty() {
            return Err(GridError::InvalidPhase {
                what: format!("terminal {terminal} carries none of {code}"),
            });
        }

        let mut trace = NetworkTrace::basic(
            network,
            state,
            phase_weighted_queue(network),
            |current: &NetworkTraceStep<EbbPhases>, _: &TraceContext<'_>, next: &StepPath| {
                EbbPhases::new(carried_phases(current.data.cleared(), next))
            },
        );
        trace
            .add_queue_condition(|next, current| {
                Ok(!next.data.pending.is_empty() && !current.data.cleared().is_empty())
            })
            .add_queue_condition(stop_at_open(network, state))
            .add_step_action(move |step, _| {
                let to = network.try_terminal(step.path.to_terminal)?;
                let mut status = state.phase_status(to);
                let mut cleared = PhaseSet::EMPTY;
                for phase in step.data.pending.iter() {
                    if status.clear(phase)? {
                        cleared.insert(phase);
                    }
                }
                state.set_phase_status(to, status);
                step.data.cleared.set(cleared);
                Ok(())
            });
        trace.run(terminal, EbbPhases::new(pending), Some(code), false)
    }
}

/// Arrival phases of `next` fed by phases cleared at its departure terminal.
///
/// Phases created by the hop itself, such as an added neutral, go with them.
fn carried_phases(cleared: PhaseSet, next: &StepPath) -> PhaseSet {
    let mut carried: PhaseSet = next
        .nominal_phase_paths
        .iter()
        .filter(|p| p.from != SinglePhaseKind::None && cleared.contains(p.from))
        .map(|p| p.to)
        .collect();
    if !carried.is_empty() {
        for created in next.nominal_phase_paths.iter().filter(|p| p.from == SinglePhaseKind::None) {
            carried.insert(created.to);
        }
    }
    carried
}
