use std::collections::BTreeSet;

use gt_core::{EquipmentId, FeederId, NetworkState, TerminalId};

/// An energisation path originating at a head terminal.
///
/// Equipment membership is derived by feeder assignment, separately for each
/// network state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feeder {
    pub(crate) id: FeederId,
    pub(crate) mrid: String,
    pub(crate) head_terminal: Option<TerminalId>,
    normal_equipment: BTreeSet<EquipmentId>,
    current_equipment: BTreeSet<EquipmentId>,
}

impl Feeder {
    pub(crate) fn new(id: FeederId, mrid: String, head_terminal: Option<TerminalId>) -> Self {
        Self {
            id,
            mrid,
            head_terminal,
            normal_equipment: BTreeSet::new(),
            current_equipment: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> FeederId {
        self.id
    }

    pub fn mrid(&self) -> &str {
        &self.mrid
    }

    pub fn head_terminal(&self) -> Option<TerminalId> {
        self.head_terminal
    }

    pub fn equipment(&self, state: NetworkState) -> &BTreeSet<EquipmentId> {
        match state {
            NetworkState::Normal => &self.normal_equipment,
            NetworkState::Current => &self.current_equipment,
        }
    }

    pub fn set_equipment(&mut self, state: NetworkState, equipment: BTreeSet<EquipmentId>) {
        match state {
            NetworkState::Normal => self.normal_equipment = equipment,
            NetworkState::Current => self.current_equipment = equipment,
        }
    }
}
