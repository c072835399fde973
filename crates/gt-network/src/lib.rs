//! gt-network: graph model layer for gridtrace.
//!
//! Provides:
//! - Arena-backed network container (equipment, terminals, connectivity nodes, feeders)
//! - Terminal attachment and connection operations with structural checks
//! - Incremental network builder with validation
//!
//! # Example
//!
//! ```
//! use gt_core::PhaseCode;
//! use gt_network::{EquipmentKind, NetworkBuilder};
//!
//! let mut builder = NetworkBuilder::new(PhaseCode::ABC);
//! let n1 = builder.add_node("n1");
//! let source = builder.add_equipment("source", EquipmentKind::EnergySource, &[Some(n1)]).unwrap();
//! let line = builder.add_equipment("line", EquipmentKind::AcLineSegment, &[Some(n1), None]).unwrap();
//! let network = builder.build().unwrap();
//!
//! assert_eq!(network.equipment_count(), 2);
//! assert_eq!(network.node(n1).unwrap().terminals().len(), 2);
//! assert_eq!(network.equipment(line).unwrap().terminals().len(), 2);
//! # let _ = source;
//! ```

pub mod builder;
pub mod equipment;
pub mod error;
pub mod feeder;
pub mod network;
pub mod node;
pub mod terminal;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::NetworkBuilder;
pub use equipment::{
    ConductingEquipment, EquipmentKind, PowerTransformer, Switch, SwitchKind,
    TransformerFunctionKind,
};
pub use error::{NetworkError, NetworkResult};
pub use feeder::Feeder;
pub use network::Network;
pub use node::ConnectivityNode;
pub use terminal::Terminal;
