//! Per-terminal phase energisation records.
//!
//! Each nominal phase slot (see [`SinglePhaseKind::mask_index`]) records which
//! real phase energises it and in which direction that phase flows through
//! the terminal. NORMAL and CURRENT are tracked independently.

use core::fmt;
use core::ops::{Add, Sub};

use crate::error::{GridError, GridResult};
use crate::phases::{PhaseCode, SinglePhaseKind};
use crate::state::NetworkState;

/// Flow of an energised phase through a terminal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseDirection(u8);

impl PhaseDirection {
    pub const NONE: PhaseDirection = PhaseDirection(0b00);
    pub const IN: PhaseDirection = PhaseDirection(0b01);
    pub const OUT: PhaseDirection = PhaseDirection(0b10);
    pub const BOTH: PhaseDirection = PhaseDirection(0b11);

    pub fn contains(self, other: PhaseDirection) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl Add for PhaseDirection {
    type Output = PhaseDirection;

    fn add(self, rhs: PhaseDirection) -> PhaseDirection {
        PhaseDirection(self.0 | rhs.0)
    }
}

impl Sub for PhaseDirection {
    type Output = PhaseDirection;

    fn sub(self, rhs: PhaseDirection) -> PhaseDirection {
        PhaseDirection(self.0 & !rhs.0)
    }
}

impl fmt::Debug for PhaseDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for PhaseDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self.0 {
            0b01 => "IN",
            0b10 => "OUT",
            0b11 => "BOTH",
            _ => "NONE",
        })
    }
}

const SLOT_BITS: u32 = 8;
const SLOT_MASK: u32 = 0xff;
const PHASE_MASK: u32 = 0x0f;
const DIRECTION_SHIFT: u32 = 4;

fn phase_bits(phase: SinglePhaseKind) -> Option<u32> {
    match phase {
        SinglePhaseKind::A => Some(0b0001),
        SinglePhaseKind::B => Some(0b0010),
        SinglePhaseKind::C => Some(0b0100),
        SinglePhaseKind::N => Some(0b1000),
        _ => None,
    }
}

fn bits_phase(bits: u32) -> SinglePhaseKind {
    match bits {
        0b0001 => SinglePhaseKind::A,
        0b0010 => SinglePhaseKind::B,
        0b0100 => SinglePhaseKind::C,
        0b1000 => SinglePhaseKind::N,
        _ => SinglePhaseKind::None,
    }
}

/// Energisation of the four nominal phase slots for one network state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseStatus(u32);

impl PhaseStatus {
    pub const DE_ENERGISED: PhaseStatus = PhaseStatus(0);

    fn slot(self, nominal: SinglePhaseKind) -> GridResult<(u32, u32)> {
        let shift = nominal.require_mask_index()? as u32 * SLOT_BITS;
        Ok((shift, (self.0 >> shift) & SLOT_MASK))
    }

    /// The phase energising `nominal`, or `SinglePhaseKind::None`.
    pub fn phase(self, nominal: SinglePhaseKind) -> GridResult<SinglePhaseKind> {
        let (_, slot) = self.slot(nominal)?;
        Ok(bits_phase(slot & PHASE_MASK))
    }

    pub fn direction(self, nominal: SinglePhaseKind) -> GridResult<PhaseDirection> {
        let (_, slot) = self.slot(nominal)?;
        Ok(PhaseDirection((slot >> DIRECTION_SHIFT) as u8 & 0b11))
    }

    /// Energise `nominal` with `phase`, or clear it when `phase` is `None`.
    ///
    /// Returns whether the record changed. Applying a different phase to an
    /// energised slot is a [`GridError::PhaseConflict`].
    pub fn set_phase(&mut self, nominal: SinglePhaseKind, phase: SinglePhaseKind) -> GridResult<bool> {
        let (shift, slot) = self.slot(nominal)?;
        let existing = bits_phase(slot & PHASE_MASK);
        if existing == phase {
            return Ok(false);
        }
        if phase == SinglePhaseKind::None {
            self.0 &= !(SLOT_MASK << shift);
            return Ok(true);
        }
        let bits = phase_bits(phase).ok_or_else(|| GridError::InvalidPhase {
            what: format!("{phase} cannot energise a nominal phase"),
        })?;
        if existing != SinglePhaseKind::None {
            return Err(GridError::PhaseConflict {
                nominal,
                existing,
                applied: phase,
            });
        }
        self.0 = (self.0 & !(SLOT_MASK << shift)) | (bits << shift);
        Ok(true)
    }

    /// Union `direction` into an energised slot. De-energised slots are left alone.
    pub fn add_direction(&mut self, nominal: SinglePhaseKind, direction: PhaseDirection) -> GridResult<bool> {
        let (shift, slot) = self.slot(nominal)?;
        if slot & PHASE_MASK == 0 {
            return Ok(false);
        }
        let before = PhaseDirection((slot >> DIRECTION_SHIFT) as u8 & 0b11);
        let after = before + direction;
        if after == before {
            return Ok(false);
        }
        self.0 |= u32::from(after.0) << (shift + DIRECTION_SHIFT);
        Ok(true)
    }

    /// De-energise `nominal`, returning whether anything was cleared.
    pub fn clear(&mut self, nominal: SinglePhaseKind) -> GridResult<bool> {
        self.set_phase(nominal, SinglePhaseKind::None)
    }

    pub fn is_de_energised(self) -> bool {
        self.0 == 0
    }

    /// Energised `(nominal, phase)` pairs in slot order.
    pub fn energised(self) -> impl Iterator<Item = (SinglePhaseKind, SinglePhaseKind)> {
        PhaseCode::ABCN.single_phases().iter().filter_map(move |nominal| {
            let phase = bits_phase((self.0 >> (nominal.mask_index()? as u32 * SLOT_BITS)) & PHASE_MASK);
            (phase != SinglePhaseKind::None).then_some((*nominal, phase))
        })
    }
}

impl fmt::Debug for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for nominal in PhaseCode::ABCN.single_phases() {
            let phase = self.phase(*nominal).unwrap_or(SinglePhaseKind::Invalid);
            let direction = self.direction(*nominal).unwrap_or_default();
            list.entry(&format_args!("{phase}:{direction}"));
        }
        list.finish()
    }
}

/// NORMAL and CURRENT phase records of a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TracedPhases {
    pub normal: PhaseStatus,
    pub current: PhaseStatus,
}

impl TracedPhases {
    pub fn get(&self, state: NetworkState) -> PhaseStatus {
        match state {
            NetworkState::Normal => self.normal,
            NetworkState::Current => self.current,
        }
    }

    pub fn get_mut(&mut self, state: NetworkState) -> &mut PhaseStatus {
        match state {
            NetworkState::Normal => &mut self.normal,
            NetworkState::Current => &mut self.current,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn nominal() -> impl Strategy<Value = SinglePhaseKind> {
        prop_oneof![
            Just(SinglePhaseKind::A),
            Just(SinglePhaseKind::B),
            Just(SinglePhaseKind::C),
            Just(SinglePhaseKind::N)
        ]
    }

    proptest! {
        #[test]
        fn writing_one_slot_leaves_others_alone(a in nominal(), b in nominal(), pa in nominal(), pb in nominal()) {
            prop_assume!(a != b);
            let mut status = PhaseStatus::default();
            status.set_phase(a, pa).unwrap();
            status.add_direction(a, PhaseDirection::OUT).unwrap();
            status.set_phase(b, pb).unwrap();
            status.clear(b).unwrap();
            prop_assert_eq!(status.phase(a).unwrap(), pa);
            prop_assert_eq!(status.direction(a).unwrap(), PhaseDirection::OUT);
            prop_assert_eq!(status.phase(b).unwrap(), SinglePhaseKind::None);
        }
    }
}
