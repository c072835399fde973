//! gt-core: stable foundation for gridtrace.
//!
//! Contains:
//! - ids (stable compact IDs for equipment, terminals, nodes and feeders)
//! - error (shared error taxonomy)
//! - units (uom SI voltage type + constructors)
//! - phases (single phases, phase codes, phase sets, nominal phase paths)
//! - traced_phases (per-terminal phase energisation records)
//! - direction (feeder direction flag lattice)
//! - state (NORMAL / CURRENT network state selector)

pub mod direction;
pub mod error;
pub mod ids;
pub mod phases;
pub mod state;
pub mod traced_phases;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use direction::FeederDirection;
pub use error::{GridError, GridResult};
pub use ids::*;
pub use phases::{NominalPhasePath, PhaseCode, PhaseSet, SinglePhaseKind};
pub use state::NetworkState;
pub use traced_phases::{PhaseDirection, PhaseStatus, TracedPhases};
pub use units::*;
