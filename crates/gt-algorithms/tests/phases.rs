//! Phase energisation and removal.

use gt_algorithms::{InferredPhases, PhaseInferrer, RemovePhases, SetPhases};
use gt_core::{
    EquipmentId, GridError, NetworkState, PhaseCode, PhaseDirection, SinglePhaseKind, TerminalId,
};
use gt_network::{
    EquipmentKind, Network, NetworkBuilder, PowerTransformer, Switch, SwitchKind,
    TransformerFunctionKind,
};
use gt_trace::{CURRENT, NORMAL, NetworkStateOperators};

use SinglePhaseKind as P;

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn t(network: &Network, equipment: EquipmentId, sequence_number: u32) -> TerminalId {
    network.terminal_at(equipment, sequence_number).unwrap()
}

/// `(nominal, phase)` pairs energised at `terminal`.
fn energised(
    network: &Network,
    state: &dyn NetworkStateOperators,
    terminal: TerminalId,
) -> Vec<(SinglePhaseKind, SinglePhaseKind)> {
    state.phase_status(network.terminal(terminal).unwrap()).energised().collect()
}

fn direction(
    network: &Network,
    state: &dyn NetworkStateOperators,
    terminal: TerminalId,
    nominal: SinglePhaseKind,
) -> PhaseDirection {
    state
        .phase_status(network.terminal(terminal).unwrap())
        .direction(nominal)
        .unwrap()
}

fn all_de_energised(network: &Network, state: &dyn NetworkStateOperators) -> bool {
    network
        .terminals()
        .iter()
        .all(|t| state.phase_status(t).is_de_energised())
}

/// source(ABC) - n1 - tx(ABC / ABCN) - n2 - line(ABCN) - n3 - load(ABCN)
fn transformer_network() -> (Network, [EquipmentId; 4]) {
    let mut builder = NetworkBuilder::new(PhaseCode::ABCN);
    let n1 = builder.add_node("n1");
    let n2 = builder.add_node("n2");
    let n3 = builder.add_node("n3");
    let source = builder
        .add_equipment_with_phases("source", EquipmentKind::EnergySource, &[(Some(n1), PhaseCode::ABC)])
        .unwrap();
    let tx = builder
        .add_equipment_with_phases(
            "tx",
            EquipmentKind::PowerTransformer(PowerTransformer::new(
                TransformerFunctionKind::DistributionTransformer,
            )),
            &[(Some(n1), PhaseCode::ABC), (Some(n2), PhaseCode::ABCN)],
        )
        .unwrap();
    let line = builder
        .add_equipment("line", EquipmentKind::AcLineSegment, &[Some(n2), Some(n3)])
        .unwrap();
    let load = builder
        .add_equipment("load", EquipmentKind::EnergyConsumer, &[Some(n3)])
        .unwrap();
    (builder.build().unwrap(), [source, tx, line, load])
}

#[test]
fn sources_energise_through_transformers() {
    init_logging();
    let (network, [source, tx, line, load]) = transformer_network();
    SetPhases::new(&NORMAL).run(&network).unwrap();

    let abc = vec![(P::A, P::A), (P::B, P::B), (P::C, P::C)];
    let abcn = vec![(P::A, P::A), (P::B, P::B), (P::C, P::C), (P::N, P::N)];
    assert_eq!(energised(&network, &NORMAL, t(&network, source, 1)), abc);
    assert_eq!(energised(&network, &NORMAL, t(&network, tx, 1)), abc);
    assert_eq!(energised(&network, &NORMAL, t(&network, tx, 2)), abcn);
    assert_eq!(energised(&network, &NORMAL, t(&network, line, 2)), abcn);
    assert_eq!(energised(&network, &NORMAL, t(&network, load, 1)), abcn);

    assert!(all_de_energised(&network, &CURRENT));
}

#[test]
fn energy_enters_at_in_terminals_and_leaves_at_out_terminals() {
    let (network, [source, _, line, load]) = transformer_network();
    SetPhases::new(&NORMAL).run(&network).unwrap();

    assert_eq!(direction(&network, &NORMAL, t(&network, source, 1), P::A), PhaseDirection::OUT);
    assert_eq!(direction(&network, &NORMAL, t(&network, line, 1), P::N), PhaseDirection::IN);
    assert_eq!(direction(&network, &NORMAL, t(&network, line, 2), P::N), PhaseDirection::OUT);
    assert_eq!(direction(&network, &NORMAL, t(&network, load, 1), P::B), PhaseDirection::IN);
}

#[test]
fn open_phases_are_not_carried_through_a_switch() {
    let mut builder = NetworkBuilder::new(PhaseCode::ABC);
    let n1 = builder.add_node("n1");
    let n2 = builder.add_node("n2");
    let mut switch = Switch::new(SwitchKind::Fuse);
    switch.set_open(NetworkState::Normal, true, Some(P::B)).unwrap();
    let source = builder
        .add_equipment("source", EquipmentKind::EnergySource, &[Some(n1)])
        .unwrap();
    builder
        .add_equipment("fuse", EquipmentKind::Switch(switch), &[Some(n1), Some(n2)])
        .unwrap();
    let load = builder
        .add_equipment("load", EquipmentKind::EnergyConsumer, &[Some(n2)])
        .unwrap();
    let network = builder.build().unwrap();

    let states: [&dyn NetworkStateOperators; 2] = [&NORMAL, &CURRENT];
    for state in states {
        SetPhases::new(state).run_terminal(&network, t(&network, source, 1), None).unwrap();
    }

    assert_eq!(
        energised(&network, &NORMAL, t(&network, load, 1)),
        vec![(P::A, P::A), (P::C, P::C)]
    );
    assert_eq!(
        energised(&network, &CURRENT, t(&network, load, 1)),
        vec![(P::A, P::A), (P::B, P::B), (P::C, P::C)]
    );
}

#[test]
fn crossing_phases_are_reported() {
    let mut builder = NetworkBuilder::new(PhaseCode::ABC);
    let n1 = builder.add_node("n1");
    let n2 = builder.add_node("n2");
    let s1 = builder
        .add_equipment("s1", EquipmentKind::EnergySource, &[Some(n1)])
        .unwrap();
    builder
        .add_equipment("line", EquipmentKind::AcLineSegment, &[Some(n1), Some(n2)])
        .unwrap();
    let s2 = builder
        .add_equipment("s2", EquipmentKind::EnergySource, &[Some(n2)])
        .unwrap();
    let network = builder.build().unwrap();

    let set = SetPhases::new(&NORMAL);
    set.run_terminal(&network, t(&network, s1, 1), None).unwrap();
    let err = set
        .run_terminal(&network, t(&network, s2, 1), Some(&[P::B, P::C, P::A]))
        .unwrap_err();
    assert!(matches!(err, GridError::PhaseConflict { .. }), "{err}");
}

#[test]
fn applied_phases_must_match_the_terminal() {
    let (network, [source, ..]) = transformer_network();
    let err = SetPhases::new(&NORMAL)
        .run_terminal(&network, t(&network, source, 1), Some(&[P::A]))
        .unwrap_err();
    assert!(matches!(err, GridError::Tracing { .. }));
}

#[test]
fn removing_what_was_set_de_energises_everything() {
    let (network, [source, ..]) = transformer_network();
    SetPhases::new(&NORMAL).run(&network).unwrap();
    assert!(!all_de_energised(&network, &NORMAL));

    RemovePhases::new(&NORMAL)
        .run_from_terminal(&network, t(&network, source, 1), None)
        .unwrap();
    assert!(all_de_energised(&network, &NORMAL));
}

#[test]
fn removal_of_a_subset_leaves_other_phases() {
    let (network, [source, tx, _, load]) = transformer_network();
    SetPhases::new(&NORMAL).run(&network).unwrap();

    RemovePhases::new(&NORMAL)
        .run_from_terminal(&network, t(&network, tx, 2), Some(PhaseCode::B))
        .unwrap();

    assert_eq!(
        energised(&network, &NORMAL, t(&network, load, 1)),
        vec![(P::A, P::A), (P::C, P::C), (P::N, P::N)]
    );
    assert_eq!(energised(&network, &NORMAL, t(&network, tx, 2)).len(), 3);
    // Tracing leaves the start terminal across its node, never back through tx.
    assert_eq!(energised(&network, &NORMAL, t(&network, tx, 1)).len(), 3);
    assert_eq!(energised(&network, &NORMAL, t(&network, source, 1)).len(), 3);
}

#[test]
fn removal_needs_a_phase_the_terminal_carries() {
    let (network, [source, ..]) = transformer_network();
    let err = RemovePhases::new(&NORMAL)
        .run_from_terminal(&network, t(&network, source, 1), Some(PhaseCode::N))
        .unwrap_err();
    assert!(matches!(err, GridError::InvalidPhase { .. }));
}

#[test]
fn remove_all_counts_changed_terminals() {
    let (network, _) = transformer_network();
    SetPhases::new(&CURRENT).run(&network).unwrap();

    let remove = RemovePhases::new(&CURRENT);
    assert_eq!(remove.remove_all(&network), network.terminals().len());
    assert_eq!(remove.remove_all(&network), 0);
}

fn phase(
    network: &Network,
    state: &dyn NetworkStateOperators,
    terminal: TerminalId,
    nominal: SinglePhaseKind,
) -> SinglePhaseKind {
    state
        .phase_status(network.terminal(terminal).unwrap())
        .phase(nominal)
        .unwrap()
}

#[test]
fn unknown_phases_take_the_feeding_phase() {
    init_logging();
    // source(AN) - n1 - spur(XN) - n2 - load(XN)
    let mut builder = NetworkBuilder::new(PhaseCode::XN);
    let n1 = builder.add_node("n1");
    let n2 = builder.add_node("n2");
    let source = builder
        .add_equipment_with_phases("source", EquipmentKind::EnergySource, &[(Some(n1), PhaseCode::AN)])
        .unwrap();
    let spur = builder
        .add_equipment("spur", EquipmentKind::AcLineSegment, &[Some(n1), Some(n2)])
        .unwrap();
    let load = builder
        .add_equipment("load", EquipmentKind::EnergyConsumer, &[Some(n2)])
        .unwrap();
    let network = builder.build().unwrap();

    SetPhases::new(&NORMAL).run(&network).unwrap();

    for terminal in [t(&network, spur, 1), t(&network, spur, 2), t(&network, load, 1)] {
        assert_eq!(phase(&network, &NORMAL, terminal, P::X), P::A);
        assert_eq!(phase(&network, &NORMAL, terminal, P::N), P::N);
    }
    assert_eq!(direction(&network, &NORMAL, t(&network, spur, 1), P::X), PhaseDirection::IN);
    assert_eq!(direction(&network, &NORMAL, t(&network, source, 1), P::A), PhaseDirection::OUT);
    assert!(all_de_energised(&network, &CURRENT));
}

#[test]
fn missing_nominal_phases_are_inferred_from_the_nominal_code() {
    init_logging();
    // source(AB) - n1 - feed(AB) - n2 - line(ABC) - n3 - load(ABC)
    let mut builder = NetworkBuilder::new(PhaseCode::ABC);
    let n1 = builder.add_node("n1");
    let n2 = builder.add_node("n2");
    let n3 = builder.add_node("n3");
    builder
        .add_equipment_with_phases("source", EquipmentKind::EnergySource, &[(Some(n1), PhaseCode::AB)])
        .unwrap();
    builder
        .add_equipment_with_phases(
            "feed",
            EquipmentKind::AcLineSegment,
            &[(Some(n1), PhaseCode::AB), (Some(n2), PhaseCode::AB)],
        )
        .unwrap();
    let line = builder
        .add_equipment("line", EquipmentKind::AcLineSegment, &[Some(n2), Some(n3)])
        .unwrap();
    let load = builder
        .add_equipment("load", EquipmentKind::EnergyConsumer, &[Some(n3)])
        .unwrap();
    let network = builder.build().unwrap();

    SetPhases::new(&NORMAL).run(&network).unwrap();
    assert_eq!(phase(&network, &NORMAL, t(&network, load, 1), P::C), P::None);

    let inferred = PhaseInferrer::new(&NORMAL).run(&network).unwrap();

    assert_eq!(inferred, vec![InferredPhases { equipment: line, suspect: false }]);
    for terminal in [t(&network, line, 1), t(&network, line, 2), t(&network, load, 1)] {
        assert_eq!(
            energised(&network, &NORMAL, terminal),
            vec![(P::A, P::A), (P::B, P::B), (P::C, P::C)]
        );
    }
    assert!(PhaseInferrer::new(&NORMAL).run(&network).unwrap().is_empty());
}

#[test]
fn unresolved_unknown_phases_are_guessed_and_flagged() {
    init_logging();
    // source(A) - n1 - feed(A) - n2 - spur(XY) - n3 - load(XY)
    let mut builder = NetworkBuilder::new(PhaseCode::XY);
    let n1 = builder.add_node("n1");
    let n2 = builder.add_node("n2");
    let n3 = builder.add_node("n3");
    builder
        .add_equipment_with_phases("source", EquipmentKind::EnergySource, &[(Some(n1), PhaseCode::A)])
        .unwrap();
    builder
        .add_equipment_with_phases(
            "feed",
            EquipmentKind::AcLineSegment,
            &[(Some(n1), PhaseCode::A), (Some(n2), PhaseCode::A)],
        )
        .unwrap();
    let spur = builder
        .add_equipment("spur", EquipmentKind::AcLineSegment, &[Some(n2), Some(n3)])
        .unwrap();
    let load = builder
        .add_equipment("load", EquipmentKind::EnergyConsumer, &[Some(n3)])
        .unwrap();
    let network = builder.build().unwrap();

    SetPhases::new(&NORMAL).run(&network).unwrap();
    assert_eq!(phase(&network, &NORMAL, t(&network, spur, 1), P::X), P::A);
    assert_eq!(phase(&network, &NORMAL, t(&network, spur, 1), P::Y), P::None);

    let inferred = PhaseInferrer::new(&NORMAL).run(&network).unwrap();

    assert_eq!(inferred, vec![InferredPhases { equipment: spur, suspect: true }]);
    for terminal in [t(&network, spur, 1), t(&network, spur, 2), t(&network, load, 1)] {
        assert_eq!(phase(&network, &NORMAL, terminal, P::X), P::A);
        assert_eq!(phase(&network, &NORMAL, terminal, P::Y), P::C);
    }
}
