//! Phase identities, phase codes and the compact sets tracing passes around.

use core::fmt;

use crate::error::{GridError, GridResult};

/// A single electrical phase.
///
/// `None` and `Invalid` exist so that unknown or unset phases can be carried
/// around, but neither is accepted by any per-phase query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SinglePhaseKind {
    None,
    A,
    B,
    C,
    N,
    X,
    Y,
    S1,
    S2,
    Invalid,
}

impl SinglePhaseKind {
    pub const ALL: [SinglePhaseKind; 10] = [
        SinglePhaseKind::None,
        SinglePhaseKind::A,
        SinglePhaseKind::B,
        SinglePhaseKind::C,
        SinglePhaseKind::N,
        SinglePhaseKind::X,
        SinglePhaseKind::Y,
        SinglePhaseKind::S1,
        SinglePhaseKind::S2,
        SinglePhaseKind::Invalid,
    ];

    /// Position of this phase in a 4-slot phase mask (A/X/S1, B/Y/S2, C, N).
    pub fn mask_index(self) -> Option<usize> {
        match self {
            SinglePhaseKind::A | SinglePhaseKind::X | SinglePhaseKind::S1 => Some(0),
            SinglePhaseKind::B | SinglePhaseKind::Y | SinglePhaseKind::S2 => Some(1),
            SinglePhaseKind::C => Some(2),
            SinglePhaseKind::N => Some(3),
            SinglePhaseKind::None | SinglePhaseKind::Invalid => None,
        }
    }

    /// Bit for this phase in a 4-bit phase mask, or 0 for `None`/`Invalid`.
    pub fn bit_mask(self) -> u8 {
        self.mask_index().map_or(0, |i| 1 << i)
    }

    /// Mask index of a phase that must name a real slot.
    pub fn require_mask_index(self) -> GridResult<usize> {
        self.mask_index().ok_or_else(|| GridError::InvalidPhase {
            what: format!("{self} must not be NONE or INVALID"),
        })
    }

    /// Whether this is one of the unknown-but-distinct phases X or Y.
    pub fn is_xy(self) -> bool {
        matches!(self, SinglePhaseKind::X | SinglePhaseKind::Y)
    }

    pub fn short_name(self) -> &'static str {
        match self {
            SinglePhaseKind::None => "NONE",
            SinglePhaseKind::A => "A",
            SinglePhaseKind::B => "B",
            SinglePhaseKind::C => "C",
            SinglePhaseKind::N => "N",
            SinglePhaseKind::X => "X",
            SinglePhaseKind::Y => "Y",
            SinglePhaseKind::S1 => "s1",
            SinglePhaseKind::S2 => "s2",
            SinglePhaseKind::Invalid => "INVALID",
        }
    }

    fn ordinal(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for SinglePhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// The closed catalogue of phase combinations a terminal can carry.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhaseCode {
    #[default]
    None,
    A,
    B,
    C,
    N,
    AB,
    AC,
    AN,
    BC,
    BN,
    CN,
    ABC,
    ABN,
    ACN,
    BCN,
    ABCN,
    X,
    XN,
    XY,
    XYN,
    Y,
    YN,
    S1,
    S1N,
    S12,
    S12N,
    S2,
    S2N,
}

impl PhaseCode {
    pub const ALL: [PhaseCode; 28] = [
        PhaseCode::None,
        PhaseCode::A,
        PhaseCode::B,
        PhaseCode::C,
        PhaseCode::N,
        PhaseCode::AB,
        PhaseCode::AC,
        PhaseCode::AN,
        PhaseCode::BC,
        PhaseCode::BN,
        PhaseCode::CN,
        PhaseCode::ABC,
        PhaseCode::ABN,
        PhaseCode::ACN,
        PhaseCode::BCN,
        PhaseCode::ABCN,
        PhaseCode::X,
        PhaseCode::XN,
        PhaseCode::XY,
        PhaseCode::XYN,
        PhaseCode::Y,
        PhaseCode::YN,
        PhaseCode::S1,
        PhaseCode::S1N,
        PhaseCode::S12,
        PhaseCode::S12N,
        PhaseCode::S2,
        PhaseCode::S2N,
    ];

    /// The single phases of this code, in order. `None` has no phases.
    pub fn single_phases(self) -> &'static [SinglePhaseKind] {
        use SinglePhaseKind as P;
        match self {
            PhaseCode::None => &[],
            PhaseCode::A => &[P::A],
            PhaseCode::B => &[P::B],
            PhaseCode::C => &[P::C],
            PhaseCode::N => &[P::N],
            PhaseCode::AB => &[P::A, P::B],
            PhaseCode::AC => &[P::A, P::C],
            PhaseCode::AN => &[P::A, P::N],
            PhaseCode::BC => &[P::B, P::C],
            PhaseCode::BN => &[P::B, P::N],
            PhaseCode::CN => &[P::C, P::N],
            PhaseCode::ABC => &[P::A, P::B, P::C],
            PhaseCode::ABN => &[P::A, P::B, P::N],
            PhaseCode::ACN => &[P::A, P::C, P::N],
            PhaseCode::BCN => &[P::B, P::C, P::N],
            PhaseCode::ABCN => &[P::A, P::B, P::C, P::N],
            PhaseCode::X => &[P::X],
            PhaseCode::XN => &[P::X, P::N],
            PhaseCode::XY => &[P::X, P::Y],
            PhaseCode::XYN => &[P::X, P::Y, P::N],
            PhaseCode::Y => &[P::Y],
            PhaseCode::YN => &[P::Y, P::N],
            PhaseCode::S1 => &[P::S1],
            PhaseCode::S1N => &[P::S1, P::N],
            PhaseCode::S12 => &[P::S1, P::S2],
            PhaseCode::S12N => &[P::S1, P::S2, P::N],
            PhaseCode::S2 => &[P::S2],
            PhaseCode::S2N => &[P::S2, P::N],
        }
    }

    /// Number of single phases, counting the neutral.
    pub fn num_phases(self) -> usize {
        self.single_phases().len()
    }

    pub fn contains(self, phase: SinglePhaseKind) -> bool {
        self.single_phases().contains(&phase)
    }

    /// The same code with any neutral removed.
    pub fn without_neutral(self) -> PhaseCode {
        if !self.contains(SinglePhaseKind::N) {
            return self;
        }
        let phases: PhaseSet = self
            .single_phases()
            .iter()
            .copied()
            .filter(|p| *p != SinglePhaseKind::N)
            .collect();
        PhaseCode::from_phase_set(phases)
    }

    /// Find the code whose single phases are exactly `phases` (order ignored).
    ///
    /// Returns `PhaseCode::None` when no code matches.
    pub fn from_single_phases(phases: &[SinglePhaseKind]) -> PhaseCode {
        PhaseCode::from_phase_set(phases.iter().copied().collect())
    }

    pub fn from_phase_set(phases: PhaseSet) -> PhaseCode {
        PhaseCode::ALL
            .into_iter()
            .find(|code| code.to_phase_set() == phases)
            .unwrap_or(PhaseCode::None)
    }

    pub fn to_phase_set(self) -> PhaseSet {
        self.single_phases().iter().copied().collect()
    }

    pub fn name(self) -> &'static str {
        match self {
            PhaseCode::None => "NONE",
            PhaseCode::A => "A",
            PhaseCode::B => "B",
            PhaseCode::C => "C",
            PhaseCode::N => "N",
            PhaseCode::AB => "AB",
            PhaseCode::AC => "AC",
            PhaseCode::AN => "AN",
            PhaseCode::BC => "BC",
            PhaseCode::BN => "BN",
            PhaseCode::CN => "CN",
            PhaseCode::ABC => "ABC",
            PhaseCode::ABN => "ABN",
            PhaseCode::ACN => "ACN",
            PhaseCode::BCN => "BCN",
            PhaseCode::ABCN => "ABCN",
            PhaseCode::X => "X",
            PhaseCode::XN => "XN",
            PhaseCode::XY => "XY",
            PhaseCode::XYN => "XYN",
            PhaseCode::Y => "Y",
            PhaseCode::YN => "YN",
            PhaseCode::S1 => "s1",
            PhaseCode::S1N => "s1N",
            PhaseCode::S12 => "s12",
            PhaseCode::S12N => "s12N",
            PhaseCode::S2 => "s2",
            PhaseCode::S2N => "s2N",
        }
    }
}

impl fmt::Display for PhaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A small copyable set of single phases.
///
/// Iteration follows `SinglePhaseKind` declaration order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseSet(u16);

impl PhaseSet {
    pub const EMPTY: PhaseSet = PhaseSet(0);

    pub fn insert(&mut self, phase: SinglePhaseKind) -> bool {
        let bit = 1 << phase.ordinal();
        let added = self.0 & bit == 0;
        self.0 |= bit;
        added
    }

    pub fn remove(&mut self, phase: SinglePhaseKind) -> bool {
        let bit = 1 << phase.ordinal();
        let removed = self.0 & bit != 0;
        self.0 &= !bit;
        removed
    }

    pub fn contains(self, phase: SinglePhaseKind) -> bool {
        self.0 & (1 << phase.ordinal()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn union(self, other: PhaseSet) -> PhaseSet {
        PhaseSet(self.0 | other.0)
    }

    pub fn intersection(self, other: PhaseSet) -> PhaseSet {
        PhaseSet(self.0 & other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = SinglePhaseKind> {
        SinglePhaseKind::ALL
            .into_iter()
            .filter(move |p| self.contains(*p))
    }
}

impl FromIterator<SinglePhaseKind> for PhaseSet {
    fn from_iter<I: IntoIterator<Item = SinglePhaseKind>>(iter: I) -> Self {
        let mut set = PhaseSet::EMPTY;
        for phase in iter {
            set.insert(phase);
        }
        set
    }
}

impl From<PhaseCode> for PhaseSet {
    fn from(code: PhaseCode) -> Self {
        code.to_phase_set()
    }
}

impl fmt::Debug for PhaseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// How one nominal phase is wired from one terminal to the next.
///
/// A `from` of `SinglePhaseKind::None` marks a phase introduced by the
/// equipment itself, such as a neutral added by a transformer winding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NominalPhasePath {
    pub from: SinglePhaseKind,
    pub to: SinglePhaseKind,
}

impl NominalPhasePath {
    pub const fn new(from: SinglePhaseKind, to: SinglePhaseKind) -> Self {
        Self { from, to }
    }

    pub const fn straight(phase: SinglePhaseKind) -> Self {
        Self {
            from: phase,
            to: phase,
        }
    }
}
