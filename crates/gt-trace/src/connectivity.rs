//! Which nominal phases wire through a hop.

use gt_core::{GridError, GridResult, NominalPhasePath, PhaseCode, PhaseSet, SinglePhaseKind};
use gt_network::{ConductingEquipment, Network, Terminal};

use crate::xy_phases::{xy_phase_paths, xy_phases};

use SinglePhaseKind::{A, B, C, N, X, Y};

// Struct literals so the table slices are promoted to 'static.
macro_rules! p {
    ($from:expr, $to:expr) => {
        NominalPhasePath {
            from: $from,
            to: $to,
        }
    };
}

/// A neutral created by the transformer winding rather than carried through it.
const ADD_NEUTRAL: NominalPhasePath = p!(SinglePhaseKind::None, N);

/// Phase paths from a transformer terminal with phases `from` to one with
/// phases `to`. Pairs the table does not list wire nothing through.
pub fn transformer_phase_paths(from: PhaseCode, to: PhaseCode) -> &'static [NominalPhasePath] {
    use PhaseCode as P;
    match (from, to) {
        (P::ABCN, P::ABCN) => &[p!(A, A), p!(B, B), p!(C, C), p!(N, N)],
        (P::ABCN, P::ABC) => &[p!(A, A), p!(B, B), p!(C, C)],
        (P::ABC, P::ABCN) => &[p!(A, A), p!(B, B), p!(C, C), ADD_NEUTRAL],
        (P::ABC, P::ABC) => &[p!(A, A), p!(B, B), p!(C, C)],

        (P::AN, P::AN) => &[p!(A, A), p!(N, N)],
        (P::AN, P::XN) => &[p!(A, X), p!(N, N)],
        (P::AN, P::AB) => &[p!(A, A), p!(SinglePhaseKind::None, B)],
        (P::AN, P::XY) => &[p!(A, X), p!(SinglePhaseKind::None, Y)],
        (P::AN, P::X) => &[p!(A, X)],
        (P::AN, P::A) => &[p!(A, A)],

        (P::BN, P::BN) => &[p!(B, B), p!(N, N)],
        (P::BN, P::XN) => &[p!(B, X), p!(N, N)],
        (P::BN, P::BC) => &[p!(B, B), p!(SinglePhaseKind::None, C)],
        (P::BN, P::XY) => &[p!(B, X), p!(SinglePhaseKind::None, Y)],
        (P::BN, P::B) => &[p!(B, B)],
        (P::BN, P::X) => &[p!(B, X)],

        (P::CN, P::CN) => &[p!(C, C), p!(N, N)],
        (P::CN, P::XN) => &[p!(C, X), p!(N, N)],
        (P::CN, P::AC) => &[p!(C, C), p!(SinglePhaseKind::None, A)],
        (P::CN, P::XY) => &[p!(C, X), p!(SinglePhaseKind::None, Y)],
        (P::CN, P::C) => &[p!(C, C)],
        (P::CN, P::X) => &[p!(C, X)],

        (P::XN, P::AN) => &[p!(X, A), p!(N, N)],
        (P::XN, P::BN) => &[p!(X, B), p!(N, N)],
        (P::XN, P::CN) => &[p!(X, C), p!(N, N)],
        (P::XN, P::XN) => &[p!(X, X), p!(N, N)],
        (P::XN, P::AB) => &[p!(X, A), p!(SinglePhaseKind::None, B)],
        (P::XN, P::BC) => &[p!(X, B), p!(SinglePhaseKind::None, C)],
        (P::XN, P::AC) => &[p!(X, C), p!(SinglePhaseKind::None, A)],
        (P::XN, P::XY) => &[p!(X, X), p!(SinglePhaseKind::None, Y)],
        (P::XN, P::A) => &[p!(X, A)],
        (P::XN, P::B) => &[p!(X, B)],
        (P::XN, P::C) => &[p!(X, C)],
        (P::XN, P::X) => &[p!(X, X)],

        (P::AB, P::AN) => &[p!(A, A), ADD_NEUTRAL],
        (P::AB, P::XN) => &[p!(A, X), ADD_NEUTRAL],
        (P::AB, P::AB) => &[p!(A, A), p!(B, B)],
        (P::AB, P::XY) => &[p!(A, X), p!(B, Y)],
        (P::AB, P::A) => &[p!(A, A)],
        (P::AB, P::X) => &[p!(A, X)],

        (P::BC, P::BN) => &[p!(B, B), ADD_NEUTRAL],
        (P::BC, P::XN) => &[p!(B, X), ADD_NEUTRAL],
        (P::BC, P::BC) => &[p!(B, B), p!(C, C)],
        (P::BC, P::XY) => &[p!(B, X), p!(C, Y)],
        (P::BC, P::B) => &[p!(B, B)],
        (P::BC, P::X) => &[p!(B, X)],

        (P::AC, P::CN) => &[p!(C, C), ADD_NEUTRAL],
        (P::AC, P::XN) => &[p!(C, X), ADD_NEUTRAL],
        (P::AC, P::AC) => &[p!(A, A), p!(C, C)],
        (P::AC, P::XY) => &[p!(A, X), p!(C, Y)],
        (P::AC, P::C) => &[p!(C, C)],
        (P::AC, P::X) => &[p!(C, X)],

        (P::XY, P::AN) => &[p!(X, A), ADD_NEUTRAL],
        (P::XY, P::BN) => &[p!(X, B), ADD_NEUTRAL],
        (P::XY, P::CN) => &[p!(X, C), ADD_NEUTRAL],
        (P::XY, P::XN) => &[p!(X, X), ADD_NEUTRAL],
        (P::XY, P::AB) => &[p!(X, A), p!(Y, B)],
        (P::XY, P::BC) => &[p!(X, B), p!(Y, C)],
        (P::XY, P::AC) => &[p!(X, A), p!(Y, C)],
        (P::XY, P::XY) => &[p!(X, X), p!(Y, Y)],
        (P::XY, P::A) => &[p!(X, A)],
        (P::XY, P::B) => &[p!(X, B)],
        (P::XY, P::C) => &[p!(X, C)],
        (P::XY, P::X) => &[p!(X, X)],

        (P::A, P::AN) => &[p!(A, A), ADD_NEUTRAL],
        (P::A, P::XN) => &[p!(A, X), ADD_NEUTRAL],
        (P::A, P::AB) => &[p!(A, A), p!(SinglePhaseKind::None, B)],
        (P::A, P::XY) => &[p!(A, X), p!(SinglePhaseKind::None, Y)],
        (P::A, P::A) => &[p!(A, A)],
        (P::A, P::X) => &[p!(A, X)],

        (P::B, P::BN) => &[p!(B, B), ADD_NEUTRAL],
        (P::B, P::XN) => &[p!(B, X), ADD_NEUTRAL],
        (P::B, P::BC) => &[p!(B, B), p!(SinglePhaseKind::None, C)],
        (P::B, P::XY) => &[p!(B, X), p!(SinglePhaseKind::None, Y)],
        (P::B, P::B) => &[p!(B, B)],
        (P::B, P::X) => &[p!(B, X)],

        (P::C, P::CN) => &[p!(C, C), ADD_NEUTRAL],
        (P::C, P::XN) => &[p!(C, X), ADD_NEUTRAL],
        (P::C, P::AC) => &[p!(C, C), p!(SinglePhaseKind::None, A)],
        (P::C, P::XY) => &[p!(C, X), p!(SinglePhaseKind::None, Y)],
        (P::C, P::C) => &[p!(C, C)],
        (P::C, P::X) => &[p!(C, X)],

        (P::X, P::AN) => &[p!(X, A), ADD_NEUTRAL],
        (P::X, P::BN) => &[p!(X, B), ADD_NEUTRAL],
        (P::X, P::CN) => &[p!(X, C), ADD_NEUTRAL],
        (P::X, P::XN) => &[p!(X, X), ADD_NEUTRAL],
        (P::X, P::AB) => &[p!(X, A), p!(SinglePhaseKind::None, B)],
        (P::X, P::BC) => &[p!(X, B), p!(SinglePhaseKind::None, C)],
        (P::X, P::AC) => &[p!(X, C), p!(SinglePhaseKind::None, A)],
        (P::X, P::XY) => &[p!(X, X), p!(SinglePhaseKind::None, Y)],
        (P::X, P::A) => &[p!(X, A)],
        (P::X, P::B) => &[p!(X, B)],
        (P::X, P::C) => &[p!(X, C)],
        (P::X, P::X) => &[p!(X, X)],

        _ => &[],
    }
}

/// Straight-through paths for every phase both codes carry.
///
/// Secondary phases (`S1`, `S2`) never wire straight through, and neither
/// does anything between an X/Y code and an A/B/C code; those are resolved by
/// [`xy_phase_paths`].
pub fn straight_phase_paths(from: PhaseCode, to: PhaseCode) -> Vec<NominalPhasePath> {
    let from_xy = xy_phases(from) != PhaseCode::None;
    let to_xy = xy_phases(to) != PhaseCode::None;
    if from_xy != to_xy {
        return Vec::new();
    }
    from.single_phases()
        .iter()
        .copied()
        .filter(|phase| to.contains(*phase))
        .filter(|phase| !matches!(phase, SinglePhaseKind::S1 | SinglePhaseKind::S2))
        .map(NominalPhasePath::straight)
        .collect()
}

/// Phase paths for a hop from `from` to `to`, restricted to paths leaving on
/// one of the `include` phases.
///
/// Hops inside a power transformer follow the transformer table; a phase the
/// winding creates is carried whenever any included phase gets through. A hop
/// across a node between X/Y and A/B/C terminals resolves X and Y from the
/// terminals around the node. Every other hop is straight through.
pub fn terminal_phase_paths(
    network: &Network,
    from: &Terminal,
    to: &Terminal,
    include: PhaseSet,
) -> GridResult<Vec<NominalPhasePath>> {
    let include = include.intersection(from.phases().to_phase_set());
    let internal = from.equipment().is_some() && from.equipment() == to.equipment();

    if internal && owning_equipment(network, from)?.as_power_transformer().is_some() {
        let table = transformer_phase_paths(from.phases(), to.phases());
        let carried: Vec<_> = table
            .iter()
            .copied()
            .filter(|path| include.contains(path.from))
            .collect();
        if carried.is_empty() {
            return Ok(carried);
        }
        let created = table
            .iter()
            .copied()
            .filter(|path| path.from == SinglePhaseKind::None);
        return Ok(carried.into_iter().chain(created).collect());
    }

    let from_xy = xy_phases(from.phases()) != PhaseCode::None;
    let to_xy = xy_phases(to.phases()) != PhaseCode::None;
    let paths = if !internal && from_xy != to_xy {
        xy_phase_paths(network, from, to)?
    } else {
        straight_phase_paths(from.phases(), to.phases())
    };
    Ok(paths
        .into_iter()
        .filter(|path| include.contains(path.from) && to.phases().contains(path.to))
        .collect())
}

fn owning_equipment<'n>(network: &'n Network, terminal: &Terminal) -> GridResult<&'n ConductingEquipment> {
    let id = terminal.equipment().ok_or_else(|| {
        GridError::tracing(format!("terminal {} has no equipment", terminal.mrid()))
    })?;
    Ok(network.try_equipment(id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gt_network::{EquipmentKind, NetworkBuilder, PowerTransformer, TransformerFunctionKind};

    #[test]
    fn straight_paths_need_the_phase_on_both_sides() {
        let paths = straight_phase_paths(PhaseCode::ABCN, PhaseCode::BC);
        assert_eq!(paths, vec![NominalPhasePath::straight(B), NominalPhasePath::straight(C)]);
        assert!(straight_phase_paths(PhaseCode::S12, PhaseCode::S12N).is_empty());
        assert!(straight_phase_paths(PhaseCode::AN, PhaseCode::XN).is_empty());
    }

    #[test]
    fn unknown_phases_resolve_against_the_node() {
        let mut builder = NetworkBuilder::new(PhaseCode::ABC);
        let n1 = builder.add_node("n1");
        let feed = builder
            .add_equipment("feed", EquipmentKind::AcLineSegment, &[None, Some(n1)])
            .unwrap();
        let spur = builder
            .add_equipment_with_phases(
                "spur",
                EquipmentKind::AcLineSegment,
                &[(Some(n1), PhaseCode::XY), (None, PhaseCode::XY)],
            )
            .unwrap();
        let network = builder.build().unwrap();
        let feed_t2 = network.terminal(network.terminal_at(feed, 2).unwrap()).unwrap();
        let spur_t1 = network.terminal(network.terminal_at(spur, 1).unwrap()).unwrap();

        let down = terminal_phase_paths(&network, feed_t2, spur_t1, PhaseCode::ABC.to_phase_set()).unwrap();
        assert_eq!(down, vec![p!(A, X), p!(C, Y)]);

        let up = terminal_phase_paths(&network, spur_t1, feed_t2, PhaseCode::XY.to_phase_set()).unwrap();
        assert_eq!(up, vec![p!(X, A), p!(Y, C)]);
    }

    #[test]
    fn shared_neutral_wires_through_with_the_unknown_phase() {
        let mut builder = NetworkBuilder::new(PhaseCode::AN);
        let n1 = builder.add_node("n1");
        let feed = builder
            .add_equipment("feed", EquipmentKind::AcLineSegment, &[None, Some(n1)])
            .unwrap();
        let spur = builder
            .add_equipment_with_phases(
                "spur",
                EquipmentKind::AcLineSegment,
                &[(Some(n1), PhaseCode::XN), (None, PhaseCode::XN)],
            )
            .unwrap();
        let network = builder.build().unwrap();
        let feed_t2 = network.terminal(network.terminal_at(feed, 2).unwrap()).unwrap();
        let spur_t1 = network.terminal(network.terminal_at(spur, 1).unwrap()).unwrap();

        let paths = terminal_phase_paths(&network, feed_t2, spur_t1, PhaseCode::AN.to_phase_set()).unwrap();
        assert_eq!(paths, vec![NominalPhasePath::straight(N), p!(A, X)]);
    }

    #[test]
    fn every_table_entry_lands_on_the_target_phases() {
        for from in PhaseCode::ALL {
            for to in PhaseCode::ALL {
                for path in transformer_phase_paths(from, to) {
                    assert!(to.contains(path.to), "{from} -> {to}: {path:?}");
                    assert!(
                        path.from == SinglePhaseKind::None || from.contains(path.from),
                        "{from} -> {to}: {path:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn transformer_adds_a_neutral_when_fed() {
        let mut builder = NetworkBuilder::new(PhaseCode::ABC);
        let tx = builder
            .add_equipment_with_phases(
                "tx",
                EquipmentKind::PowerTransformer(PowerTransformer::new(
                    TransformerFunctionKind::DistributionTransformer,
                )),
                &[(None, PhaseCode::ABC), (None, PhaseCode::ABCN)],
            )
            .unwrap();
        let network = builder.build().unwrap();
        let hv = network.terminal(network.terminal_at(tx, 1).unwrap()).unwrap();
        let lv = network.terminal(network.terminal_at(tx, 2).unwrap()).unwrap();

        let paths = terminal_phase_paths(&network, hv, lv, PhaseCode::AB.to_phase_set()).unwrap();
        assert_eq!(paths, vec![p!(A, A), p!(B, B), ADD_NEUTRAL]);

        let none = terminal_phase_paths(&network, hv, lv, PhaseSet::EMPTY).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn other_equipment_is_straight_through() {
        let mut builder = NetworkBuilder::new(PhaseCode::ABC);
        let line = builder
            .add_equipment_with_phases(
                "line",
                EquipmentKind::AcLineSegment,
                &[(None, PhaseCode::ABC), (None, PhaseCode::AN)],
            )
            .unwrap();
        let network = builder.build().unwrap();
        let t1 = network.terminal(network.terminal_at(line, 1).unwrap()).unwrap();
        let t2 = network.terminal(network.terminal_at(line, 2).unwrap()).unwrap();

        let paths = terminal_phase_paths(&network, t1, t2, PhaseCode::ABC.to_phase_set()).unwrap();
        assert_eq!(paths, vec![NominalPhasePath::straight(A)]);
    }
}
