//! Clearing feeder directions.

use std::cell::RefCell;

use gt_core::{FeederDirection, GridResult, TerminalId};
use gt_network::Network;
use gt_trace::{NetworkStateOperators, NetworkTrace, stop_at_open};

use crate::phase_weighted_queue;

/// Resets feeder directions to `NONE`.
///
/// Clearing is unconditional, including on equipment fed from more than one
/// feeder. Directions that should survive are reapplied afterwards with
/// [`SetDirection`](crate::SetDirection) from the feeder heads reported by
/// [`ClearDirection::run_terminal`].
pub struct ClearDirection<'s> {
    state: &'s dyn NetworkStateOperators,
}

impl<'s> ClearDirection<'s> {
    pub fn new(state: &'s dyn NetworkStateOperators) -> Self {
        Self { state }
    }

    /// Clear every terminal of `network`. Returns how many changed.
    pub fn clear_all(&self, network: &Network) -> usize {
        let cleared = network
            .terminals()
            .iter()
            .filter(|t| self.state.set_direction(t, FeederDirection::NONE))
            .count();
        tracing::info!(cleared, state = %self.state.state(), "feeder directions cleared");
        cleared
    }

    /// Clear directions outward from `terminal` through every terminal that
    /// still has one.
    ///
    /// Returns the feeder head terminals encountered, including `terminal`
    /// itself when it is a head.
    pub fn run_terminal(&self, network: &Network, terminal: TerminalId) -> GridResult<Vec<TerminalId>> {
        let state = self.state;
        let heads = RefCell::new(Vec::new());
        {
            let mut trace =
                NetworkTrace::basic(network, state, phase_weighted_queue(network), |_, _, _| ());
            trace
                .add_queue_condition(stop_at_open(network, state))
                .add_queue_condition(move |next, _| {
                    let terminal = network.try_terminal(next.path.to_terminal)?;
                    Ok(state.direction(terminal) != FeederDirection::NONE)
                })
                .add_step_action(|step, _| {
                    let to = step.path.to_terminal;
                    state.set_direction(network.try_terminal(to)?, FeederDirection::NONE);
                    if network.is_feeder_head_terminal(to) {
                        heads.borrow_mut().push(to);
                    }
                    Ok(())
                });
            trace.run(terminal, (), None, false)?;
        }
        Ok(heads.into_inner())
    }
}
