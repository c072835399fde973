//! Integration tests for gt-network.

use gt_core::{FeederDirection, GridError, NetworkState, PhaseCode, SinglePhaseKind};
use gt_network::{EquipmentKind, Network, NetworkBuilder, NetworkError, Switch, SwitchKind};

#[test]
fn build_three_way_junction() {
    // Build: X -- J -- Y
    //             |
    //             Z
    let mut builder = NetworkBuilder::new(PhaseCode::ABC);
    let j = builder.add_node("j");
    let x = builder.add_equipment("x", EquipmentKind::AcLineSegment, &[None, Some(j)]).unwrap();
    let y = builder.add_equipment("y", EquipmentKind::AcLineSegment, &[Some(j), None]).unwrap();
    let z = builder.add_equipment("z", EquipmentKind::AcLineSegment, &[Some(j), None]).unwrap();
    let xt2 = builder.terminal(x, 2).unwrap();
    let yt1 = builder.terminal(y, 1).unwrap();
    let zt1 = builder.terminal(z, 1).unwrap();

    let network = builder.build().unwrap();

    assert_eq!(network.node(j).unwrap().terminals(), &[xt2, yt1, zt1]);
    let mut others: Vec<_> = network.connected_terminals(xt2).collect();
    others.sort();
    assert_eq!(others, vec![yt1, zt1]);
    assert_eq!(network.other_terminals(xt2).count(), 1);
}

#[test]
fn derived_state_is_tracked_per_network_state() {
    let mut builder = NetworkBuilder::new(PhaseCode::ABC);
    let n = builder.add_node("n");
    let eq = builder.add_equipment("eq", EquipmentKind::Junction, &[Some(n)]).unwrap();
    let t = builder.terminal(eq, 1).unwrap();
    let network = builder.build().unwrap();

    let terminal = network.terminal(t).unwrap();
    assert!(terminal.set_feeder_direction(NetworkState::Normal, FeederDirection::UPSTREAM));
    assert!(!terminal.set_feeder_direction(NetworkState::Normal, FeederDirection::UPSTREAM));
    assert_eq!(terminal.feeder_direction(NetworkState::Current), FeederDirection::NONE);

    let mut traced = terminal.traced_phases();
    traced
        .get_mut(NetworkState::Current)
        .set_phase(SinglePhaseKind::A, SinglePhaseKind::A)
        .unwrap();
    assert!(terminal.set_traced_phases(traced));
    assert!(terminal.traced_phases().normal.is_de_energised());
}

#[test]
fn switch_state_is_reachable_through_the_network() {
    let mut builder = NetworkBuilder::new(PhaseCode::ABC);
    let sw = builder
        .add_equipment("sw", EquipmentKind::Switch(Switch::new(SwitchKind::Breaker)), &[None, None])
        .unwrap();
    let mut network = builder.build().unwrap();

    network
        .equipment_mut(sw)
        .and_then(|eq| eq.as_switch_mut())
        .unwrap()
        .set_open(NetworkState::Normal, true, None)
        .unwrap();

    let eq = network.equipment(sw).unwrap();
    assert!(eq.is_open(NetworkState::Normal, None).unwrap());
    assert!(!eq.is_open(NetworkState::Current, None).unwrap());
}

#[test]
fn structural_errors_convert_to_grid_errors() {
    let mut network = Network::new();
    let a = network.add_equipment("a", EquipmentKind::Junction).unwrap();
    let b = network.add_equipment("b", EquipmentKind::Junction).unwrap();
    let t = network.create_terminal("t", PhaseCode::A, None).unwrap();
    network.add_terminal(a, t).unwrap();

    let err = network.add_terminal(b, t).unwrap_err();
    assert!(matches!(err, NetworkError::Reparent { .. }));
    let grid: GridError = err.into();
    assert!(matches!(grid, GridError::Structural { .. }));

    let missing: GridError = network.try_equipment(gt_core::Id::from_index(9)).unwrap_err().into();
    assert!(matches!(missing, GridError::NotFound { .. }));
}
