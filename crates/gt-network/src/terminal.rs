//! Terminals: connection points on equipment.

use std::cell::Cell;

use gt_core::{
    EquipmentId, FeederDirection, NetworkState, NodeId, PhaseCode, TerminalId, TracedPhases,
};

/// An electrical connection point on a piece of equipment.
///
/// The owning equipment is write-once. The connectivity node reference is a
/// non-owning back-link; the node's membership list is the owning side.
///
/// Feeder directions and traced phases are derived state written by tracing
/// algorithms. They live in `Cell`s so a trace holding `&Network` can update
/// them without exclusive access to the graph.
#[derive(Debug, Clone)]
pub struct Terminal {
    pub(crate) id: TerminalId,
    pub(crate) mrid: String,
    pub(crate) phases: PhaseCode,
    pub(crate) sequence_number: u32,
    pub(crate) equipment: Option<EquipmentId>,
    pub(crate) node: Option<NodeId>,
    normal_direction: Cell<FeederDirection>,
    current_direction: Cell<FeederDirection>,
    traced_phases: Cell<TracedPhases>,
}

impl Terminal {
    pub(crate) fn new(id: TerminalId, mrid: String, phases: PhaseCode, sequence_number: u32) -> Self {
        Self {
            id,
            mrid,
            phases,
            sequence_number,
            equipment: None,
            node: None,
            normal_direction: Cell::new(FeederDirection::NONE),
            current_direction: Cell::new(FeederDirection::NONE),
            traced_phases: Cell::new(TracedPhases::default()),
        }
    }

    pub fn id(&self) -> TerminalId {
        self.id
    }

    pub fn mrid(&self) -> &str {
        &self.mrid
    }

    /// Nominal phases of this terminal.
    pub fn phases(&self) -> PhaseCode {
        self.phases
    }

    /// 1-based position on the owning equipment, or 0 while unattached.
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    pub fn equipment(&self) -> Option<EquipmentId> {
        self.equipment
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn is_connected(&self) -> bool {
        self.node.is_some()
    }

    fn direction_cell(&self, state: NetworkState) -> &Cell<FeederDirection> {
        match state {
            NetworkState::Normal => &self.normal_direction,
            NetworkState::Current => &self.current_direction,
        }
    }

    pub fn feeder_direction(&self, state: NetworkState) -> FeederDirection {
        self.direction_cell(state).get()
    }

    /// Replace the stored direction, returning whether it changed.
    pub fn set_feeder_direction(&self, state: NetworkState, direction: FeederDirection) -> bool {
        self.direction_cell(state).replace(direction) != direction
    }

    pub fn traced_phases(&self) -> TracedPhases {
        self.traced_phases.get()
    }

    /// Replace the traced phase record, returning whether it changed.
    pub fn set_traced_phases(&self, traced: TracedPhases) -> bool {
        self.traced_phases.replace(traced) != traced
    }
}
