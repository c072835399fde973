//! Phase energisation.

use std::cell::Cell;

use gt_core::{GridError, GridResult, PhaseDirection, SinglePhaseKind, TerminalId};
use gt_network::{EquipmentKind, Network, Terminal};
use gt_trace::{NetworkStateOperators, NetworkTrace, StepPath, stop_at_open, terminal_phase_paths};

use crate::phase_weighted_queue;

/// Energises phases outward from sources.
///
/// Each step copies the phases energising its departure terminal onto its
/// arrival terminal. Crossing a node marks the arrival terminal `IN` and the
/// departure terminal `OUT`.
/// A path continues only while its last step energised something new.
/// Phases open at a switch are not carried through it.
pub struct SetPhases<'s> {
    state: &'s dyn NetworkStateOperators,
}

impl<'s> SetPhases<'s> {
    pub fn new(state: &'s dyn NetworkStateOperators) -> Self {
        Self { state }
    }

    /// Energise every energy source terminal with its nominal phases and
    /// flow them through the network.
    pub fn run(&self, network: &Network) -> GridResult<()> {
        let sources: Vec<TerminalId> = network
            .equipment_list()
            .iter()
            .filter(|eq| matches!(eq.kind(), EquipmentKind::EnergySource))
            .flat_map(|eq| eq.terminals().iter().copied())
            .collect();

        for terminal in &sources {
            let nominal = network.try_terminal(*terminal)?.phases();
            self.apply(network, *terminal, nominal.single_phases())?;
        }
        for terminal in &sources {
            self.flow_from(network, *terminal)?;
        }
        tracing::info!(sources = sources.len(), state = %self.state.state(), "phases set");
        Ok(())
    }

    /// Energise `terminal` with `phases` (its nominal phases when `None`) and
    /// flow them outward.
    ///
    /// `phases` pairs with the terminal's nominal phases in order, so it must
    /// have the same length.
    pub fn run_terminal(
        &self,
        network: &Network,
        terminal: TerminalId,
        phases: Option<&[SinglePhaseKind]>,
    ) -> GridResult<()> {
        let t = network.try_terminal(terminal)?;
        let phases = phases.unwrap_or(t.phases().single_phases());
        self.apply(network, terminal, phases)?;
        self.flow_from(network, terminal)
    }

    fn apply(&self, network: &Network, terminal: TerminalId, phases: &[SinglePhaseKind]) -> GridResult<()> {
        let t = network.try_terminal(terminal)?;
        let nominal = t.phases().single_phases();
        if phases.len() != nominal.len() {
            return Err(GridError::tracing(format!(
                "cannot apply {} phases to {} with nominal phases {}",
                phases.len(),
                t.mrid(),
                t.phases()
            )));
        }

        let mut status = self.state.phase_status(t);
        for (nominal, phase) in nominal.iter().zip(phases) {
            // Unresolved phases are left for tracing to fill in.
            let phase = if phase.is_xy() { SinglePhaseKind::None } else { *phase };
            status.set_phase(*nominal, phase)?;
        }
        self.state.set_phase_status(t, status);
        Ok(())
    }

    /// Copy the phases energising `from` onto `to`, both terminals of the same
    /// equipment, without tracing further. Returns whether anything changed.
    pub fn spread(&self, network: &Network, from: TerminalId, to: TerminalId) -> GridResult<bool> {
        let from_terminal = network.try_terminal(from)?;
        let to_terminal = network.try_terminal(to)?;
        let (Some(from_equipment), Some(to_equipment)) = (from_terminal.equipment(), to_terminal.equipment())
        else {
            return Ok(false);
        };
        let nominal_phase_paths = terminal_phase_paths(
            network,
            from_terminal,
            to_terminal,
            from_terminal.phases().to_phase_set(),
        )?;
        let path = StepPath {
            from_terminal: from,
            to_terminal: to,
            from_equipment,
            to_equipment,
            nominal_phase_paths,
        };
        flow_phases(network, self.state, &path)
    }

    /// Flow the phases already energising `terminal` outward, without
    /// applying anything to it first.
    pub fn flow_from(&self, network: &Network, terminal: TerminalId) -> GridResult<()> {
        let state = self.state;
        let phases = network.try_terminal(terminal)?.phases();
        let mut trace = NetworkTrace::branching(
            network,
            state,
            phase_weighted_queue(network),
            phase_weighted_queue(network),
            |_, _, _| Cell::new(false),
        );
        trace
            .add_queue_condition(stop_at_open(network, state))
            .add_queue_condition(|_, current| Ok(current.data.get()))
            .add_step_action(move |step, _| {
                let flowed = step.is_start() || flow_phases(network, state, &step.path)?;
                step.data.set(flowed);
                Ok(())
            });
        trace.run(terminal, Cell::new(true), Some(phases), false)
    }
}

/// Copy phases along `path`. Returns whether any phase was newly energised.
fn flow_phases(
    network: &Network,
    state: &dyn NetworkStateOperators,
    path: &StepPath,
) -> GridResult<bool> {
    let from = network.try_terminal(path.from_terminal)?;
    let to = network.try_terminal(path.to_terminal)?;
    let through = if path.traced_internally() {
        Some(network.try_equipment(path.to_equipment)?)
    } else {
        None
    };

    let from_status = state.phase_status(from);
    let mut from_out = from_status;
    let mut to_status = state.phase_status(to);
    let mut changed = false;

    for phase_path in &path.nominal_phase_paths {
        if let Some(equipment) = through {
            let switched = match phase_path.from {
                SinglePhaseKind::None => phase_path.to,
                phase => phase,
            };
            if state.is_open(equipment, Some(switched))? {
                continue;
            }
        }

        let phase = match phase_path.from {
            SinglePhaseKind::None if phase_path.to.is_xy() => to_status.phase(phase_path.to)?,
            SinglePhaseKind::None => phase_path.to,
            nominal => from_status.phase(nominal)?,
        };
        if phase == SinglePhaseKind::None {
            continue;
        }

        changed |= to_status
            .set_phase(phase_path.to, phase)
            .map_err(|err| conflict_context(err, from, to))?;
        if path.traced_externally() {
            to_status.add_direction(phase_path.to, PhaseDirection::IN)?;
            from_out.add_direction(phase_path.from, PhaseDirection::OUT)?;
        }
    }

    state.set_phase_status(from, from_out);
    state.set_phase_status(to, to_status);
    Ok(changed)
}

fn conflict_context(err: GridError, from: &Terminal, to: &Terminal) -> GridError {
    if matches!(err, GridError::PhaseConflict { .. }) {
        tracing::error!(
            from = from.mrid(),
            to = to.mrid(),
            "{err}; check for missing open points or incorrect upstream phases"
        );
    }
    err
}

