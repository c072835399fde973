//! gt-trace: terminal-to-terminal tracing over a gridtrace network.
//!
//! Provides:
//! - `NetworkTraceStep` / `StepPath`: the items a network trace queues
//! - `StepPathProvider`: internal/external hop alternation with busbar handling
//! - Connectivity phase paths, including the transformer phase table and
//!   resolution of unknown X/Y phases
//! - `NetworkStateOperators`: NORMAL / CURRENT views of state-dependent data
//! - Reusable conditions such as `stop_at_open`
//! - `NetworkTrace`: basic or branching traversal over terminals
//!
//! # Example
//!
//! ```
//! use gt_core::PhaseCode;
//! use gt_network::{EquipmentKind, NetworkBuilder};
//! use gt_trace::{NORMAL, NetworkTrace};
//! use gt_traversal::Queue;
//!
//! let mut builder = NetworkBuilder::new(PhaseCode::ABC);
//! let n1 = builder.add_node("n1");
//! let a = builder.add_equipment("a", EquipmentKind::AcLineSegment, &[None, Some(n1)]).unwrap();
//! let b = builder.add_equipment("b", EquipmentKind::EnergyConsumer, &[Some(n1)]).unwrap();
//! let network = builder.build().unwrap();
//!
//! let mut reached = Vec::new();
//! {
//!     let mut trace = NetworkTrace::basic(&network, &NORMAL, Queue::fifo(), |_, _, _| ());
//!     trace.add_step_action(|step, _| {
//!         reached.push(step.path.to_equipment);
//!         Ok(())
//!     });
//!     trace.run(network.terminal_at(a, 2).unwrap(), (), None, true).unwrap();
//! }
//! assert_eq!(reached, vec![a, b]);
//! ```

pub mod conditions;
pub mod connectivity;
pub mod network_trace;
pub mod operators;
pub mod path_provider;
pub mod step;
pub mod xy_phases;

// Re-exports for ergonomics
pub use conditions::{stop_at_equipment, stop_at_open};
pub use connectivity::{straight_phase_paths, terminal_phase_paths, transformer_phase_paths};
pub use network_trace::{
    NetworkTrace, NetworkTraceActionType, NetworkTraceOptions, QueueKind, TraceContext,
};
pub use operators::{
    CURRENT, CurrentNetworkStateOperators, NORMAL, NetworkStateOperators,
    NormalNetworkStateOperators, operators_for,
};
pub use path_provider::StepPathProvider;
pub use step::{NetworkTraceStep, StepPath};
pub use xy_phases::{X_PRIORITY, XyCandidatePhasePaths, Y_PRIORITY, is_after, is_before};
