use core::fmt;
use core::num::NonZeroU32;

/// Arena handle for network objects.
///
/// Stored one-based in a `NonZeroU32` so that `Option<Id>` (a terminal's
/// node, a feeder's head) costs nothing extra. Ids are only meaningful for
/// the network that issued them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id(NonZeroU32);

impl Id {
    /// Handle for arena position `index`. Saturates at `u32::MAX`.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Arena position of this handle.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    pub fn slot(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

pub type EquipmentId = Id;
pub type TerminalId = Id;
pub type NodeId = Id;
pub type FeederId = Id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_map_back_to_arena_slots() {
        for slot in [0_usize, 7, 65_535] {
            let id = Id::from_index(slot as u32);
            assert_eq!(id.slot(), slot);
        }
        assert_eq!(Id::from_index(u32::MAX).index(), u32::MAX - 1);
    }

    #[test]
    fn optional_handles_need_no_tag() {
        assert_eq!(size_of::<Option<TerminalId>>(), size_of::<u32>());
    }

    #[test]
    fn handles_sort_and_print_by_slot() {
        let mut ids = vec![Id::from_index(9), Id::from_index(2)];
        ids.sort();
        assert_eq!(format!("{ids:?}"), "[#2, #9]");
        assert_eq!(Id::from_index(2).to_string(), "#2");
    }
}
