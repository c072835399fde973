//! Feeder direction assignment.

use std::collections::HashSet;

use gt_core::{FeederDirection, GridResult, TerminalId};
use gt_network::Network;
use gt_trace::{
    NetworkStateOperators, NetworkTrace, NetworkTraceStep, StepPath, TraceContext, stop_at_open,
};

use crate::phase_weighted_queue;

/// Assigns [`FeederDirection`]s outward from feeder heads.
///
/// Starting from a head terminal seeded `DOWNSTREAM`, each external hop
/// arrives `UPSTREAM` and each internal hop arrives `DOWNSTREAM`. Busbar
/// sections are tagged `CONNECTOR`. Directions only ever accumulate, so
/// terminals fed from more than one side end up `BOTH`.
///
/// Tracing never crosses open equipment and stops at other feeder heads and
/// at substation transformers.
pub struct SetDirection<'s> {
    state: &'s dyn NetworkStateOperators,
}

impl<'s> SetDirection<'s> {
    pub fn new(state: &'s dyn NetworkStateOperators) -> Self {
        Self { state }
    }

    /// Apply directions from every feeder head terminal in `network`.
    pub fn run(&self, network: &Network) -> GridResult<()> {
        let mut heads = 0_usize;
        for feeder in network.feeders() {
            let Some(head) = feeder.head_terminal() else {
                tracing::warn!(feeder = feeder.mrid(), "feeder has no head terminal, skipping");
                continue;
            };
            self.run_terminal(network, head)?;
            heads += 1;
        }
        tracing::info!(feeders = heads, state = %self.state.state(), "feeder directions applied");
        Ok(())
    }

    /// Apply `DOWNSTREAM` at `terminal` and propagate from it.
    pub fn run_terminal(&self, network: &Network, terminal: TerminalId) -> GridResult<()> {
        let state = self.state;
        // Terminals already BOTH that have been given their one extra pass this run.
        let mut reprocessed = HashSet::new();
        let mut trace = NetworkTrace::branching(
            network,
            state,
            phase_weighted_queue(network),
            phase_weighted_queue(network),
            move |current: &NetworkTraceStep<FeederDirection>, context: &TraceContext<'_>, next: &StepPath| {
                next_direction(current, context, next, &mut reprocessed)
            },
        );
        trace
            .add_queue_condition(|next, _| Ok(next.data != FeederDirection::NONE))
            .add_queue_condition(stop_at_open(network, state))
            .add_stop_condition(move |step| {
                if network.is_feeder_head_terminal(step.path.to_terminal) {
                    return Ok(true);
                }
                Ok(network
                    .try_equipment(step.path.to_equipment)?
                    .is_substation_transformer())
            })
            .add_step_action(move |step, _| {
                let terminal = network.try_terminal(step.path.to_terminal)?;
                state.add_direction(terminal, step.data);
                Ok(())
            });
        trace.run(terminal, FeederDirection::DOWNSTREAM, None, false)
    }
}

/// Direction to apply at the end of `next`, or `NONE` to end the path there.
///
/// A terminal already holding the direction ends the path, except that a
/// terminal already `BOTH` is passed through once more per run. That one
/// extra pass lets loops settle without revisiting them indefinitely.
fn next_direction(
    current: &NetworkTraceStep<FeederDirection>,
    context: &TraceContext<'_>,
    next: &StepPath,
    reprocessed: &mut HashSet<TerminalId>,
) -> FeederDirection {
    if current.data == FeederDirection::NONE {
        return FeederDirection::NONE;
    }

    let onto_busbar = context
        .network
        .equipment(next.to_equipment)
        .is_some_and(|eq| eq.is_busbar());
    let direction = if onto_busbar {
        FeederDirection::CONNECTOR
    } else if next.traced_internally() {
        FeederDirection::DOWNSTREAM
    } else {
        FeederDirection::UPSTREAM
    };

    let Some(terminal) = context.network.terminal(next.to_terminal) else {
        return FeederDirection::NONE;
    };
    let existing = context.state.direction(terminal);
    if !existing.contains(direction) {
        direction
    } else if existing == FeederDirection::BOTH && reprocessed.insert(next.to_terminal) {
        direction
    } else {
        FeederDirection::NONE
    }
}
