//! Feeder equipment assignment.

use std::cell::RefCell;
use std::collections::BTreeSet;

use gt_core::{EquipmentId, FeederId, GridError, GridResult, TerminalId};
use gt_network::Network;
use gt_trace::{NetworkStateOperators, NetworkTrace, stop_at_open};
use gt_traversal::Queue;

/// Records on each [`Feeder`](gt_network::Feeder) the equipment it reaches.
///
/// Tracing starts at the feeder head and shares its boundaries with
/// [`SetDirection`](crate::SetDirection): open equipment is never crossed,
/// another feeder's head terminal ends a path without being assigned, and a
/// substation transformer is assigned but not passed through.
pub struct AssignToFeeders<'s> {
    state: &'s dyn NetworkStateOperators,
}

impl<'s> AssignToFeeders<'s> {
    pub fn new(state: &'s dyn NetworkStateOperators) -> Self {
        Self { state }
    }

    /// Assign equipment to every feeder of `network` in the active state.
    pub fn run(&self, network: &mut Network) -> GridResult<()> {
        let mut assignments = Vec::new();
        for feeder in network.feeders() {
            let Some(head) = feeder.head_terminal() else {
                tracing::warn!(feeder = feeder.mrid(), "feeder has no head terminal, skipping");
                continue;
            };
            assignments.push((feeder.id(), self.reached_from(network, head)?));
        }

        let state = self.state.state();
        let feeders = assignments.len();
        for (feeder, equipment) in assignments {
            network.feeder_mut(feeder)?.set_equipment(state, equipment);
        }
        tracing::info!(feeders, %state, "feeder equipment assigned");
        Ok(())
    }

    /// Assign equipment to a single feeder.
    pub fn run_feeder(&self, network: &mut Network, feeder: FeederId) -> GridResult<()> {
        let head = network
            .feeder(feeder)
            .ok_or_else(|| GridError::not_found(format!("feeder {feeder}")))?
            .head_terminal()
            .ok_or_else(|| GridError::tracing(format!("feeder {feeder} has no head terminal")))?;
        let equipment = self.reached_from(network, head)?;
        network.feeder_mut(feeder)?.set_equipment(self.state.state(), equipment);
        Ok(())
    }

    /// Equipment reached tracing from the feeder head terminal `head`.
    pub fn reached_from(&self, network: &Network, head: TerminalId) -> GridResult<BTreeSet<EquipmentId>> {
        let state = self.state;
        let reached = RefCell::new(BTreeSet::new());
        {
            let mut trace = NetworkTrace::basic(network, state, Queue::fifo(), |_, _, _| ());
            trace
                .add_queue_condition(stop_at_open(network, state))
                .add_stop_condition(move |step| {
                    let to = step.path.to_terminal;
                    if to != head && network.is_feeder_head_terminal(to) {
                        return Ok(true);
                    }
                    Ok(network
                        .try_equipment(step.path.to_equipment)?
                        .is_substation_transformer())
                })
                .add_step_action(|step, stopping| {
                    let to = step.path.to_terminal;
                    if !(stopping && network.is_feeder_head_terminal(to)) {
                        reached.borrow_mut().insert(step.path.to_equipment);
                    }
                    Ok(())
                });
            trace.run(head, (), None, false)?;
        }
        Ok(reached.into_inner())
    }
}
