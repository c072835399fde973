//! Resolving unknown X/Y phases against the known phases around a node.
//!
//! A terminal labelled with X and/or Y is wired to some of A, B and C, but the
//! model does not say which. When such a terminal meets A/B/C terminals at a
//! node, each neighbouring primary code votes for the phases X and Y could be.
//! Phases already traced onto an X/Y terminal in the normal state are taken
//! as known and win over any vote.

use std::collections::HashSet;

use gt_core::{
    GridResult, NetworkState, NodeId, NominalPhasePath, PhaseCode, SinglePhaseKind, TerminalId,
};
use gt_network::{Network, Terminal};

use SinglePhaseKind::{A, B, C, N, X, Y};

/// Tie-break order when choosing a phase for X.
pub const X_PRIORITY: [SinglePhaseKind; 3] = [A, B, C];
/// Tie-break order when choosing a phase for Y.
pub const Y_PRIORITY: [SinglePhaseKind; 2] = [C, B];

/// Whether `phase` may sit on X when Y is `before`. `None` places no bound.
pub fn is_before(phase: SinglePhaseKind, before: SinglePhaseKind) -> bool {
    match before {
        SinglePhaseKind::None => true,
        B => phase == A,
        C => matches!(phase, A | B),
        _ => false,
    }
}

/// Whether `phase` may sit on Y when X is `after`. `None` places no bound.
pub fn is_after(phase: SinglePhaseKind, after: SinglePhaseKind) -> bool {
    match after {
        SinglePhaseKind::None => true,
        A => matches!(phase, B | C),
        B => phase == C,
        _ => false,
    }
}

/// Occurrence counts of A, B and C.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Votes([u32; 3]);

impl Votes {
    fn slot(phase: SinglePhaseKind) -> Option<usize> {
        match phase {
            A => Some(0),
            B => Some(1),
            C => Some(2),
            _ => None,
        }
    }

    fn add(&mut self, phase: SinglePhaseKind) {
        if let Some(slot) = Self::slot(phase) {
            self.0[slot] += 1;
        }
    }

    fn count(&self, phase: SinglePhaseKind) -> u32 {
        Self::slot(phase).map_or(0, |slot| self.0[slot])
    }

    fn voted(&self) -> impl Iterator<Item = SinglePhaseKind> + '_ {
        [A, B, C].into_iter().filter(|p| self.count(*p) > 0)
    }

    fn is_empty(&self) -> bool {
        self.voted().next().is_none()
    }

    /// The only phase voted for, if exactly one was.
    fn single(&self) -> Option<SinglePhaseKind> {
        let mut voted = self.voted();
        match (voted.next(), voted.next()) {
            (Some(phase), None) => Some(phase),
            _ => None,
        }
    }

    /// Most voted phase within the bounds, ties broken by `priority`.
    fn best(
        &self,
        priority: &[SinglePhaseKind],
        before: SinglePhaseKind,
        after: SinglePhaseKind,
    ) -> SinglePhaseKind {
        let valid: Vec<_> = self
            .voted()
            .filter(|p| is_before(*p, before) && is_after(*p, after))
            .collect();
        let Some(top) = valid.iter().map(|p| self.count(*p)).max() else {
            return SinglePhaseKind::None;
        };
        let tied: Vec<_> = valid.into_iter().filter(|p| self.count(*p) == top).collect();
        priority
            .iter()
            .copied()
            .find(|p| tied.contains(p))
            .or_else(|| tied.first().copied())
            .unwrap_or(SinglePhaseKind::None)
    }
}

/// Known and candidate phases for X and Y.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XyCandidatePhasePaths {
    known_x: Option<SinglePhaseKind>,
    known_y: Option<SinglePhaseKind>,
    x: Votes,
    y: Votes,
}

impl XyCandidatePhasePaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the phase traced onto `xy`. The first known phase sticks.
    pub fn add_known(&mut self, xy: SinglePhaseKind, phase: SinglePhaseKind) {
        let known = match xy {
            X => &mut self.known_x,
            Y => &mut self.known_y,
            _ => return,
        };
        known.get_or_insert(phase);
    }

    /// Vote for each of `phases` on `xy`. Votes Y cannot carry are ignored.
    pub fn add_candidates(&mut self, xy: SinglePhaseKind, phases: &[SinglePhaseKind]) {
        match xy {
            X => phases.iter().for_each(|p| self.x.add(*p)),
            Y => phases
                .iter()
                .filter(|p| matches!(p, B | C))
                .for_each(|p| self.y.add(*p)),
            _ => {}
        }
    }

    /// Phase chosen for X and for Y, `None` where nothing fits.
    ///
    /// Known phases win. X always sits on a lower phase than Y. Otherwise the
    /// most voted phase is chosen, ties going by [`X_PRIORITY`] and
    /// [`Y_PRIORITY`].
    pub fn calculate_paths(&self) -> [(SinglePhaseKind, SinglePhaseKind); 2] {
        let known_x = self.known_x;
        let known_y = self.known_y.filter(|y| Some(*y) != known_x);

        let (x, y) = match (known_x, known_y) {
            (Some(x), Some(y)) => (x, y),
            (Some(x), None) => (x, self.y.best(&Y_PRIORITY, SinglePhaseKind::None, x)),
            (None, Some(y)) => (self.x.best(&X_PRIORITY, y, SinglePhaseKind::None), y),
            (None, None) => self.from_votes(),
        };
        [(X, x), (Y, y)]
    }

    fn from_votes(&self) -> (SinglePhaseKind, SinglePhaseKind) {
        let none = SinglePhaseKind::None;
        let (xv, yv) = (&self.x, &self.y);

        if xv.is_empty() {
            return (none, yv.best(&Y_PRIORITY, none, none));
        }
        if let Some(x) = xv.single() {
            return (x, yv.best(&Y_PRIORITY, none, x));
        }
        if yv.is_empty() {
            return (xv.best(&X_PRIORITY, none, none), none);
        }
        if let Some(y) = yv.single() {
            return (xv.best(&X_PRIORITY, y, none), y);
        }

        let x = xv.best(&X_PRIORITY, none, none);
        let y = yv.best(&Y_PRIORITY, none, none);
        if is_before(x, y) {
            return (x, y);
        }
        if xv.count(x) > yv.count(y) {
            return (x, yv.best(&Y_PRIORITY, none, x));
        }
        if yv.count(y) > xv.count(x) {
            return (xv.best(&X_PRIORITY, y, none), y);
        }

        let x2 = xv.best(&X_PRIORITY, y, none);
        let y2 = yv.best(&Y_PRIORITY, none, x);
        if x2 == none {
            (x, y2)
        } else if y2 == none {
            (x2, y)
        } else if xv.count(x2) > yv.count(y2) {
            (x2, y)
        } else {
            (x, y2)
        }
    }
}

/// The X/Y part of `code` with any neutral dropped, or `None` for codes
/// without X or Y.
pub fn xy_phases(code: PhaseCode) -> PhaseCode {
    match code {
        PhaseCode::XY | PhaseCode::XYN => PhaseCode::XY,
        PhaseCode::X | PhaseCode::XN => PhaseCode::X,
        PhaseCode::Y | PhaseCode::YN => PhaseCode::Y,
        _ => PhaseCode::None,
    }
}

/// The A/B/C part of `code` with any neutral dropped, or `None`.
pub fn primary_phases(code: PhaseCode) -> PhaseCode {
    match code {
        PhaseCode::ABC | PhaseCode::ABCN => PhaseCode::ABC,
        PhaseCode::AB | PhaseCode::ABN => PhaseCode::AB,
        PhaseCode::AC | PhaseCode::ACN => PhaseCode::AC,
        PhaseCode::BC | PhaseCode::BCN => PhaseCode::BC,
        PhaseCode::A | PhaseCode::AN => PhaseCode::A,
        PhaseCode::B | PhaseCode::BN => PhaseCode::B,
        PhaseCode::C | PhaseCode::CN => PhaseCode::C,
        _ => PhaseCode::None,
    }
}

/// Phases each of X and Y could be wired to when an `xy` terminal meets a
/// `primary` one.
pub fn viable_inferred_phases(
    xy: PhaseCode,
    primary: PhaseCode,
) -> &'static [(SinglePhaseKind, &'static [SinglePhaseKind])] {
    use PhaseCode as P;
    match (xy, primary) {
        (P::XY, P::ABC) => &[(X, &[A, B, C]), (Y, &[B, C])],
        (P::XY, P::AB) => &[(X, &[A, B]), (Y, &[B])],
        (P::XY, P::AC) => &[(X, &[A, C]), (Y, &[C])],
        (P::XY, P::BC) => &[(X, &[B, C]), (Y, &[B, C])],
        (P::XY, P::A) => &[(X, &[A])],
        (P::XY, P::B) => &[(X, &[B]), (Y, &[B])],
        (P::XY, P::C) => &[(X, &[C]), (Y, &[C])],

        (P::X, P::ABC) => &[(X, &[A, B, C])],
        (P::X, P::AB) => &[(X, &[A, B])],
        (P::X, P::AC) => &[(X, &[A, C])],
        (P::X, P::BC) => &[(X, &[B, C])],
        (P::X, P::A) => &[(X, &[A])],
        (P::X, P::B) => &[(X, &[B])],
        (P::X, P::C) => &[(X, &[C])],

        (P::Y, P::ABC) => &[(Y, &[B, C])],
        (P::Y, P::AB) => &[(Y, &[B])],
        (P::Y, P::AC) => &[(Y, &[C])],
        (P::Y, P::BC) => &[(Y, &[B, C])],
        (P::Y, P::B) => &[(Y, &[B])],
        (P::Y, P::C) => &[(Y, &[C])],

        _ => &[],
    }
}

/// Paths across a node between an X/Y terminal and an A/B/C terminal.
///
/// Empty unless exactly one side carries X or Y. A shared neutral always
/// wires straight through.
pub fn xy_phase_paths(
    network: &Network,
    from: &Terminal,
    to: &Terminal,
) -> GridResult<Vec<NominalPhasePath>> {
    let from_xy = xy_phases(from.phases()) != PhaseCode::None;
    let to_xy = xy_phases(to.phases()) != PhaseCode::None;
    if from_xy == to_xy {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    if from.phases().contains(N) && to.phases().contains(N) {
        paths.push(NominalPhasePath::straight(N));
    }
    let Some(node) = from.node() else {
        return Ok(paths);
    };

    let candidates = candidates_at(network, node)?;
    for (xy, phase) in candidates.calculate_paths() {
        if phase == SinglePhaseKind::None {
            continue;
        }
        if !from.phases().contains(xy) && !from.phases().contains(phase) {
            continue;
        }
        paths.push(if from_xy {
            NominalPhasePath { from: xy, to: phase }
        } else {
            NominalPhasePath { from: phase, to: xy }
        });
    }
    Ok(paths)
}

/// Gather the votes for every X/Y terminal at `node`.
///
/// An X/Y terminal that has not been traced passes the question on through
/// its equipment (unless it is a normally open switch) to the terminals beyond,
/// until a primary or a traced terminal answers.
fn candidates_at(network: &Network, node: NodeId) -> GridResult<XyCandidatePhasePaths> {
    let terminals = match network.node(node) {
        Some(node) => node.terminals(),
        None => return Ok(XyCandidatePhasePaths::new()),
    };

    let mut primaries = Vec::new();
    let mut xy_terminals = Vec::new();
    for id in terminals {
        let code = network.try_terminal(*id)?.phases();
        if primary_phases(code) != PhaseCode::None {
            primaries.push(primary_phases(code));
        }
        if xy_phases(code) != PhaseCode::None {
            xy_terminals.push((*id, xy_phases(code)));
        }
    }

    let mut candidates = XyCandidatePhasePaths::new();
    let mut visited = HashSet::new();
    let mut stack = Vec::new();
    for (terminal, xy) in xy_terminals {
        for primary in &primaries {
            for (phase, viable) in viable_inferred_phases(xy, *primary) {
                candidates.add_candidates(*phase, viable);
            }
        }
        visit(network, (terminal, xy), &mut visited, &mut stack, &mut candidates)?;
    }
    while let Some(step) = stack.pop() {
        visit(network, step, &mut visited, &mut stack, &mut candidates)?;
    }
    Ok(candidates)
}

fn visit(
    network: &Network,
    step: (TerminalId, PhaseCode),
    visited: &mut HashSet<(TerminalId, PhaseCode)>,
    stack: &mut Vec<(TerminalId, PhaseCode)>,
    candidates: &mut XyCandidatePhasePaths,
) -> GridResult<()> {
    if !visited.insert(step) {
        return Ok(());
    }
    let (id, xy) = step;
    let terminal = network.try_terminal(id)?;
    let without_neutral = terminal.phases().without_neutral();

    if without_neutral.contains(X) || without_neutral.contains(Y) {
        if !add_traced(terminal, candidates)? {
            queue_beyond(network, terminal, without_neutral, stack)?;
        }
    } else {
        for (phase, viable) in viable_inferred_phases(xy, without_neutral) {
            candidates.add_candidates(*phase, viable);
        }
    }
    Ok(())
}

fn add_traced(terminal: &Terminal, candidates: &mut XyCandidatePhasePaths) -> GridResult<bool> {
    let status = terminal.traced_phases().get(NetworkState::Normal);
    let mut found = false;
    for xy in [X, Y] {
        let phase = status.phase(xy)?;
        if phase != SinglePhaseKind::None {
            candidates.add_known(xy, phase);
            found = true;
        }
    }
    Ok(found)
}

fn queue_beyond(
    network: &Network,
    terminal: &Terminal,
    xy: PhaseCode,
    stack: &mut Vec<(TerminalId, PhaseCode)>,
) -> GridResult<()> {
    let Some(equipment) = terminal.equipment() else {
        return Ok(());
    };
    let equipment = network.try_equipment(equipment)?;
    if equipment.as_switch().is_some() && equipment.is_open(NetworkState::Normal, None)? {
        return Ok(());
    }

    for other in network.other_terminals(terminal.id()) {
        for connected in network.connected_terminals(other) {
            let beyond = network.try_terminal(connected)?;
            if beyond.equipment() != Some(equipment.id()) {
                stack.push((connected, xy));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_phases_win_over_votes() {
        let mut candidates = XyCandidatePhasePaths::new();
        candidates.add_candidates(X, &[A, B, C]);
        candidates.add_candidates(Y, &[B, C]);
        candidates.add_known(X, B);
        candidates.add_known(X, A);

        assert_eq!(candidates.calculate_paths(), [(X, B), (Y, C)]);
    }

    #[test]
    fn ties_follow_priority_and_keep_x_below_y() {
        let mut candidates = XyCandidatePhasePaths::new();
        candidates.add_candidates(X, &[A, B, C]);
        candidates.add_candidates(Y, &[B, C]);
        assert_eq!(candidates.calculate_paths(), [(X, A), (Y, C)]);

        let mut candidates = XyCandidatePhasePaths::new();
        candidates.add_candidates(X, &[C]);
        candidates.add_candidates(Y, &[B, C]);
        assert_eq!(candidates.calculate_paths(), [(X, C), (Y, SinglePhaseKind::None)]);
    }

    #[test]
    fn most_votes_win() {
        let mut candidates = XyCandidatePhasePaths::new();
        candidates.add_candidates(X, &[A, B]);
        candidates.add_candidates(X, &[B, C]);
        candidates.add_candidates(Y, &[C]);
        candidates.add_candidates(Y, &[B, C]);
        assert_eq!(candidates.calculate_paths(), [(X, B), (Y, C)]);
    }

    #[test]
    fn bounds_order_the_phases() {
        assert!(is_before(A, C));
        assert!(!is_before(C, B));
        assert!(is_before(C, SinglePhaseKind::None));
        assert!(is_after(C, A));
        assert!(!is_after(A, B));
        assert!(!is_after(B, C));
    }

    #[test]
    fn neutral_is_not_part_of_either_family() {
        assert_eq!(xy_phases(PhaseCode::XYN), PhaseCode::XY);
        assert_eq!(xy_phases(PhaseCode::AN), PhaseCode::None);
        assert_eq!(primary_phases(PhaseCode::ACN), PhaseCode::AC);
        assert_eq!(primary_phases(PhaseCode::N), PhaseCode::None);
    }
}
