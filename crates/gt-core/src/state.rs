use core::fmt;

/// Selects one of the two independently tracked network topologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetworkState {
    /// The planned (as-designed) state.
    Normal,
    /// The as-switched state.
    Current,
}

impl NetworkState {
    pub const ALL: [NetworkState; 2] = [NetworkState::Normal, NetworkState::Current];
}

impl fmt::Display for NetworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkState::Normal => f.write_str("NORMAL"),
            NetworkState::Current => f.write_str("CURRENT"),
        }
    }
}
