//! Access to the state-dependent parts of a network.
//!
//! Every tracing algorithm is written against [`NetworkStateOperators`], so a
//! single implementation serves both the NORMAL and the CURRENT state.

use std::collections::BTreeSet;

use gt_core::{
    EquipmentId, FeederDirection, GridResult, NetworkState, PhaseStatus, SinglePhaseKind,
};
use gt_network::{ConductingEquipment, Feeder, Terminal};

pub trait NetworkStateOperators {
    /// The network state every other method reads and writes.
    fn state(&self) -> NetworkState;

    /// Open state of `equipment`, on `phase` or on any phase when `None`.
    fn is_open(
        &self,
        equipment: &ConductingEquipment,
        phase: Option<SinglePhaseKind>,
    ) -> GridResult<bool> {
        equipment.is_open(self.state(), phase)
    }

    fn is_in_service(&self, equipment: &ConductingEquipment) -> bool {
        equipment.in_service_for(self.state())
    }

    fn direction(&self, terminal: &Terminal) -> FeederDirection {
        terminal.feeder_direction(self.state())
    }

    /// Replace the direction of `terminal`, returning whether it changed.
    fn set_direction(&self, terminal: &Terminal, direction: FeederDirection) -> bool {
        terminal.set_feeder_direction(self.state(), direction)
    }

    /// Union `direction` into `terminal`, returning whether it changed.
    fn add_direction(&self, terminal: &Terminal, direction: FeederDirection) -> bool {
        let existing = self.direction(terminal);
        let updated = existing + direction;
        updated != existing && self.set_direction(terminal, updated)
    }

    /// Remove `direction` from `terminal`, returning whether it changed.
    fn remove_direction(&self, terminal: &Terminal, direction: FeederDirection) -> bool {
        let existing = self.direction(terminal);
        let updated = existing - direction;
        updated != existing && self.set_direction(terminal, updated)
    }

    fn phase_status(&self, terminal: &Terminal) -> PhaseStatus {
        terminal.traced_phases().get(self.state())
    }

    /// Replace the phase record of `terminal`, returning whether it changed.
    fn set_phase_status(&self, terminal: &Terminal, status: PhaseStatus) -> bool {
        let mut traced = terminal.traced_phases();
        *traced.get_mut(self.state()) = status;
        terminal.set_traced_phases(traced)
    }

    /// Equipment assigned to `feeder` in this state.
    fn feeder_equipment<'f>(&self, feeder: &'f Feeder) -> &'f BTreeSet<EquipmentId> {
        feeder.equipment(self.state())
    }
}

/// Operators over the normal (as designed) state of the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalNetworkStateOperators;

/// Operators over the current (as operated) state of the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentNetworkStateOperators;

impl NetworkStateOperators for NormalNetworkStateOperators {
    fn state(&self) -> NetworkState {
        NetworkState::Normal
    }
}

impl NetworkStateOperators for CurrentNetworkStateOperators {
    fn state(&self) -> NetworkState {
        NetworkState::Current
    }
}

pub static NORMAL: NormalNetworkStateOperators = NormalNetworkStateOperators;
pub static CURRENT: CurrentNetworkStateOperators = CurrentNetworkStateOperators;

/// The operators for `state`.
pub fn operators_for(state: NetworkState) -> &'static dyn NetworkStateOperators {
    match state {
        NetworkState::Normal => &NORMAL,
        NetworkState::Current => &CURRENT,
    }
}
