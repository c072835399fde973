//! gt-algorithms: derived-state algorithms for gridtrace networks.
//!
//! Contains:
//! - set_direction / clear_direction (feeder direction per terminal)
//! - set_phases / remove_phases (phase energisation and ebbing)
//! - phase_inferrer (filling phases left unset by upstream data errors)
//! - assign_to_feeders (feeder equipment membership)
//! - swer (single-wire-earth-return classification)
//!
//! Every algorithm is constructed for one network state through a
//! [`NetworkStateOperators`](gt_trace::NetworkStateOperators), so the same
//! code serves NORMAL and CURRENT.
//!
//! A loaded network is expected to be processed in this order: directions,
//! then phases (and phase inference), then feeder assignment.

pub mod assign_to_feeders;
pub mod clear_direction;
pub mod phase_inferrer;
pub mod remove_phases;
pub mod set_direction;
pub mod set_phases;
pub mod swer;

// Re-exports for public API
pub use assign_to_feeders::AssignToFeeders;
pub use clear_direction::ClearDirection;
pub use phase_inferrer::{InferredPhases, PhaseInferrer};
pub use remove_phases::{EbbPhases, RemovePhases};
pub use set_direction::SetDirection;
pub use set_phases::SetPhases;
pub use swer::{FindSwerEquipment, SwerEquipment, SwerOptions};

use gt_network::Network;
use gt_trace::NetworkTraceStep;
use gt_traversal::Queue;

/// Queue processing steps onto terminals with more nominal phases first.
pub(crate) fn phase_weighted_queue<'a, D: 'a>(network: &'a Network) -> Queue<'a, NetworkTraceStep<D>> {
    Queue::priority(move |step: &NetworkTraceStep<D>| {
        let phases = network
            .terminal(step.path.to_terminal)
            .map_or(0, |t| t.phases().num_phases());
        -(phases as i64)
    })
}
