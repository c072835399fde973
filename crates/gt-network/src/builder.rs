//! Incremental network builder.

use gt_core::{EquipmentId, FeederId, GridResult, NodeId, PhaseCode, TerminalId, Voltage};

use crate::equipment::EquipmentKind;
use crate::error::NetworkResult;
use crate::network::Network;

/// Convenience layer over [`Network`] for assembling networks in code.
///
/// Terminals are named `<equipment>-t<n>` and take the builder's default
/// phases unless given explicitly. Call `build()` to validate and take the
/// finished network.
#[derive(Debug)]
pub struct NetworkBuilder {
    network: Network,
    default_phases: PhaseCode,
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new(PhaseCode::ABC)
    }
}

impl NetworkBuilder {
    /// Create a new empty builder whose terminals default to `default_phases`.
    pub fn new(default_phases: PhaseCode) -> Self {
        Self {
            network: Network::new(),
            default_phases,
        }
    }

    /// Get or create a node by name.
    pub fn add_node(&mut self, mrid: &str) -> NodeId {
        self.network.node_or_insert(mrid)
    }

    /// Add equipment with one terminal per entry of `nodes`, each connected
    /// to that node when given.
    pub fn add_equipment(
        &mut self,
        mrid: &str,
        kind: EquipmentKind,
        nodes: &[Option<NodeId>],
    ) -> NetworkResult<EquipmentId> {
        let phases = self.default_phases;
        let terminals: Vec<_> = nodes.iter().map(|n| (*n, phases)).collect();
        self.add_equipment_with_phases(mrid, kind, &terminals)
    }

    /// Add equipment whose terminals carry explicit phases.
    pub fn add_equipment_with_phases(
        &mut self,
        mrid: &str,
        kind: EquipmentKind,
        terminals: &[(Option<NodeId>, PhaseCode)],
    ) -> NetworkResult<EquipmentId> {
        let eq = self.network.add_equipment(mrid, kind)?;
        for (i, (node, phases)) in terminals.iter().enumerate() {
            let t = self
                .network
                .create_terminal(format!("{mrid}-t{}", i + 1), *phases, None)?;
            self.network.add_terminal(eq, t)?;
            if let Some(node) = node {
                self.network.connect(t, *node)?;
            }
        }
        Ok(eq)
    }

    pub fn set_base_voltage(&mut self, equipment: EquipmentId, voltage: Voltage) {
        if let Some(eq) = self.network.equipment_mut(equipment) {
            eq.base_voltage = Some(voltage);
        }
    }

    /// Add a feeder headed at terminal `sequence_number` of `equipment`.
    pub fn add_feeder(
        &mut self,
        mrid: &str,
        equipment: EquipmentId,
        sequence_number: u32,
    ) -> NetworkResult<FeederId> {
        let head = self.terminal(equipment, sequence_number);
        self.network.add_feeder(mrid, head)
    }

    pub fn terminal(&self, equipment: EquipmentId, sequence_number: u32) -> Option<TerminalId> {
        self.network.terminal_at(equipment, sequence_number)
    }

    /// Direct access for adjustments the builder does not cover.
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    /// Validate and return the network.
    pub fn build(self) -> GridResult<Network> {
        self.network.validate()?;
        Ok(self.network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_basic() {
        let mut builder = NetworkBuilder::new(PhaseCode::ABCN);
        let n1 = builder.add_node("n1");
        let n2 = builder.add_node("n2");
        assert_eq!(builder.add_node("n1"), n1);

        let line = builder
            .add_equipment("line", EquipmentKind::AcLineSegment, &[Some(n1), Some(n2)])
            .unwrap();
        let t2 = builder.terminal(line, 2).unwrap();

        let network = builder.build().unwrap();
        let t2 = network.terminal(t2).unwrap();
        assert_eq!(t2.mrid(), "line-t2");
        assert_eq!(t2.phases(), PhaseCode::ABCN);
        assert_eq!(t2.node(), Some(n2));
    }

    #[test]
    fn builder_feeder_head() {
        let mut builder = NetworkBuilder::default();
        let n1 = builder.add_node("n1");
        let cb = builder
            .add_equipment("cb", EquipmentKind::Other, &[None, Some(n1)])
            .unwrap();
        let feeder = builder.add_feeder("f1", cb, 2).unwrap();
        let network = builder.build().unwrap();

        let head = network.feeder(feeder).unwrap().head_terminal().unwrap();
        assert!(network.is_feeder_head_terminal(head));
        assert_eq!(network.terminal(head).unwrap().sequence_number(), 2);
    }

    #[test]
    fn builder_propagates_duplicates() {
        let mut builder = NetworkBuilder::default();
        builder.add_equipment("x", EquipmentKind::Junction, &[None]).unwrap();
        assert!(builder.add_equipment("x", EquipmentKind::Junction, &[None]).is_err());
    }
}
