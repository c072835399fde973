//! Feeder direction flag lattice.

use core::fmt;
use core::ops::{Add, Not, Sub};

/// Direction of a terminal relative to its feeder head.
///
/// `BOTH` is the union of `UPSTREAM` and `DOWNSTREAM`. `CONNECTOR` is a
/// separate tag placed on busbar sections; it is never derived from, or
/// folded into, the upstream/downstream bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeederDirection(u8);

impl FeederDirection {
    pub const NONE: FeederDirection = FeederDirection(0b000);
    pub const UPSTREAM: FeederDirection = FeederDirection(0b001);
    pub const DOWNSTREAM: FeederDirection = FeederDirection(0b010);
    pub const BOTH: FeederDirection = FeederDirection(0b011);
    pub const CONNECTOR: FeederDirection = FeederDirection(0b100);

    const FLOW_BITS: u8 = 0b011;
    const ALL_BITS: u8 = 0b111;

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build from raw bits, discarding anything outside the known flags.
    pub const fn from_bits_truncate(bits: u8) -> FeederDirection {
        FeederDirection(bits & Self::ALL_BITS)
    }

    /// True when every flag of `other` is set in `self`. `NONE` is never contained.
    pub fn contains(self, other: FeederDirection) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl Add for FeederDirection {
    type Output = FeederDirection;

    fn add(self, rhs: FeederDirection) -> FeederDirection {
        FeederDirection(self.0 | rhs.0)
    }
}

impl Sub for FeederDirection {
    type Output = FeederDirection;

    fn sub(self, rhs: FeederDirection) -> FeederDirection {
        FeederDirection(self.0 & !rhs.0)
    }
}

impl Not for FeederDirection {
    type Output = FeederDirection;

    /// Swaps upstream and downstream; the connector tag is left untouched.
    fn not(self) -> FeederDirection {
        FeederDirection(self.0 ^ Self::FLOW_BITS)
    }
}

impl fmt::Debug for FeederDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for FeederDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flow = match self.0 & Self::FLOW_BITS {
            0b001 => Some("UPSTREAM"),
            0b010 => Some("DOWNSTREAM"),
            0b011 => Some("BOTH"),
            _ => None,
        };
        let connector = self.0 & Self::CONNECTOR.0 != 0;
        match (flow, connector) {
            (None, false) => f.write_str("NONE"),
            (None, true) => f.write_str("CONNECTOR"),
            (Some(flow), false) => f.write_str(flow),
            (Some(flow), true) => write!(f, "{flow}|CONNECTOR"),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_direction() -> impl Strategy<Value = FeederDirection> {
        (0_u8..8).prop_map(FeederDirection::from_bits_truncate)
    }

    proptest! {
        #[test]
        fn adding_none_is_identity(d in any_direction()) {
            prop_assert_eq!(d + FeederDirection::NONE, d);
        }

        #[test]
        fn self_difference_is_none(d in any_direction()) {
            prop_assert_eq!(d - d, FeederDirection::NONE);
        }

        #[test]
        fn double_complement_is_identity(d in any_direction()) {
            prop_assert_eq!(!!d, d);
        }

        #[test]
        fn union_contains_both_operands(a in any_direction(), b in any_direction()) {
            let u = a + b;
            prop_assert!(a.is_none() || u.contains(a));
            prop_assert!(b.is_none() || u.contains(b));
            prop_assert_eq!((u - b) + b, u);
        }
    }
}
