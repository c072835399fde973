//! Next-hop generation for network traces.

use gt_core::{EquipmentId, GridError, GridResult, TerminalId};
use gt_network::{Network, Terminal};

use crate::connectivity::terminal_phase_paths;
use crate::operators::NetworkStateOperators;
use crate::step::StepPath;

/// Produces the candidate hops out of a step.
///
/// - After an internal hop, tracing steps externally to the other terminals
///   at the node. A busbar section at the node is stepped to alone, and the
///   busbar then steps to the rest.
/// - After an external hop onto a busbar, tracing steps to the remaining
///   terminals at the node, skipping where it came from and other busbars.
/// - After any other external hop, tracing steps internally to the other
///   terminals of the equipment.
///
/// Equipment out of service in the active state is never stepped onto. When
/// the step tracks phases, candidates that no phase wires through are dropped.
pub struct StepPathProvider<'a> {
    network: &'a Network,
    state: &'a dyn NetworkStateOperators,
}

impl<'a> StepPathProvider<'a> {
    pub fn new(network: &'a Network, state: &'a dyn NetworkStateOperators) -> Self {
        Self { network, state }
    }

    pub fn next_paths(&self, path: &StepPath) -> GridResult<Vec<StepPath>> {
        let arrival = self.network.try_terminal(path.to_terminal)?;
        let arrived_on = self.network.try_equipment(path.to_equipment)?;

        let candidates: Vec<TerminalId> = if path.traced_internally() {
            let external: Vec<_> = self.network.connected_terminals(path.to_terminal).collect();
            let busbars: Vec<_> = external
                .iter()
                .copied()
                .filter(|t| self.on_busbar(*t))
                .collect();
            if busbars.is_empty() { external } else { busbars }
        } else if arrived_on.is_busbar() {
            self.network
                .connected_terminals(path.to_terminal)
                .filter(|t| *t != path.from_terminal && !self.on_busbar(*t))
                .collect()
        } else {
            self.network.other_terminals(path.to_terminal).collect()
        };

        let mut paths = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if let Some(next) = self.path_to(path, arrival, candidate)? {
                paths.push(next);
            }
        }
        Ok(paths)
    }

    fn path_to(
        &self,
        path: &StepPath,
        arrival: &Terminal,
        candidate: TerminalId,
    ) -> GridResult<Option<StepPath>> {
        let terminal = self.network.try_terminal(candidate)?;
        let to_equipment = owner(terminal)?;
        if !self.state.is_in_service(self.network.try_equipment(to_equipment)?) {
            return Ok(None);
        }

        let nominal_phase_paths = if path.nominal_phase_paths.is_empty() {
            Vec::new()
        } else {
            let paths = terminal_phase_paths(self.network, arrival, terminal, path.to_phases())?;
            if paths.is_empty() {
                return Ok(None);
            }
            paths
        };

        Ok(Some(StepPath {
            from_terminal: path.to_terminal,
            to_terminal: candidate,
            from_equipment: path.to_equipment,
            to_equipment,
            nominal_phase_paths,
        }))
    }

    fn on_busbar(&self, terminal: TerminalId) -> bool {
        self.network
            .terminal(terminal)
            .and_then(Terminal::equipment)
            .and_then(|eq| self.network.equipment(eq))
            .is_some_and(|eq| eq.is_busbar())
    }
}

/// The equipment owning `terminal`; tracing cannot continue without one.
pub(crate) fn owner(terminal: &Terminal) -> GridResult<EquipmentId> {
    terminal.equipment().ok_or_else(|| {
        GridError::tracing(format!("terminal {} has no equipment", terminal.mrid()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::{CURRENT, NORMAL};
    use gt_core::{NominalPhasePath, PhaseCode, SinglePhaseKind};
    use gt_network::{EquipmentKind, NetworkBuilder};

    fn start(network: &Network, terminal: TerminalId) -> StepPath {
        let eq = network.terminal(terminal).unwrap().equipment().unwrap();
        StepPath {
            from_terminal: terminal,
            to_terminal: terminal,
            from_equipment: eq,
            to_equipment: eq,
            nominal_phase_paths: Vec::new(),
        }
    }

    fn targets(paths: &[StepPath]) -> Vec<TerminalId> {
        paths.iter().map(|p| p.to_terminal).collect()
    }

    #[test]
    fn internal_then_external_alternate() {
        let mut builder = NetworkBuilder::new(PhaseCode::ABC);
        let n1 = builder.add_node("n1");
        let a = builder
            .add_equipment("a", EquipmentKind::AcLineSegment, &[None, Some(n1)])
            .unwrap();
        let b = builder
            .add_equipment("b", EquipmentKind::AcLineSegment, &[Some(n1), None])
            .unwrap();
        let network = builder.build().unwrap();
        let provider = StepPathProvider::new(&network, &NORMAL);

        let a2 = network.terminal_at(a, 2).unwrap();
        let b1 = network.terminal_at(b, 1).unwrap();
        let b2 = network.terminal_at(b, 2).unwrap();

        let external = provider.next_paths(&start(&network, a2)).unwrap();
        assert_eq!(targets(&external), vec![b1]);
        assert!(external[0].traced_externally());

        let internal = provider.next_paths(&external[0]).unwrap();
        assert_eq!(targets(&internal), vec![b2]);
        assert!(internal[0].traced_internally());
    }

    #[test]
    fn busbars_are_visited_before_the_rest_of_the_node() {
        let mut builder = NetworkBuilder::new(PhaseCode::ABC);
        let bus = builder.add_node("bus");
        let src = builder
            .add_equipment("src", EquipmentKind::AcLineSegment, &[None, Some(bus)])
            .unwrap();
        let bb = builder
            .add_equipment("bb", EquipmentKind::BusbarSection, &[Some(bus)])
            .unwrap();
        let out1 = builder
            .add_equipment("out1", EquipmentKind::AcLineSegment, &[Some(bus), None])
            .unwrap();
        let out2 = builder
            .add_equipment("out2", EquipmentKind::AcLineSegment, &[Some(bus), None])
            .unwrap();
        let network = builder.build().unwrap();
        let provider = StepPathProvider::new(&network, &NORMAL);

        let src2 = network.terminal_at(src, 2).unwrap();
        let to_bus = provider.next_paths(&start(&network, src2)).unwrap();
        assert_eq!(targets(&to_bus), vec![network.terminal_at(bb, 1).unwrap()]);

        let from_bus = provider.next_paths(&to_bus[0]).unwrap();
        assert_eq!(
            targets(&from_bus),
            vec![network.terminal_at(out1, 1).unwrap(), network.terminal_at(out2, 1).unwrap()]
        );
    }

    #[test]
    fn out_of_service_equipment_is_skipped() {
        let mut builder = NetworkBuilder::new(PhaseCode::ABC);
        let n1 = builder.add_node("n1");
        let a = builder
            .add_equipment("a", EquipmentKind::AcLineSegment, &[None, Some(n1)])
            .unwrap();
        let b = builder
            .add_equipment("b", EquipmentKind::AcLineSegment, &[Some(n1), None])
            .unwrap();
        builder.network_mut().equipment_mut(b).unwrap().in_service = false;
        let network = builder.build().unwrap();

        let a2 = network.terminal_at(a, 2).unwrap();
        let normal = StepPathProvider::new(&network, &NORMAL);
        let current = StepPathProvider::new(&network, &CURRENT);
        assert_eq!(normal.next_paths(&start(&network, a2)).unwrap().len(), 1);
        assert!(current.next_paths(&start(&network, a2)).unwrap().is_empty());
    }

    #[test]
    fn phase_tracking_drops_unwired_candidates() {
        let mut builder = NetworkBuilder::new(PhaseCode::ABC);
        let n1 = builder.add_node("n1");
        let a = builder
            .add_equipment_with_phases("a", EquipmentKind::AcLineSegment, &[(Some(n1), PhaseCode::A)])
            .unwrap();
        builder
            .add_equipment_with_phases("b", EquipmentKind::EnergyConsumer, &[(Some(n1), PhaseCode::BN)])
            .unwrap();
        let c = builder
            .add_equipment_with_phases("c", EquipmentKind::EnergyConsumer, &[(Some(n1), PhaseCode::AN)])
            .unwrap();
        let network = builder.build().unwrap();
        let provider = StepPathProvider::new(&network, &NORMAL);

        let mut from = start(&network, network.terminal_at(a, 1).unwrap());
        from.nominal_phase_paths = vec![NominalPhasePath::straight(SinglePhaseKind::A)];
        let paths = provider.next_paths(&from).unwrap();
        assert_eq!(targets(&paths), vec![network.terminal_at(c, 1).unwrap()]);
        assert_eq!(paths[0].to_phases().len(), 1);
    }
}
