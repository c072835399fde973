use gt_core::{NodeId, TerminalId};

/// A zero-impedance junction joining any number of terminals.
///
/// The node owns its terminal membership; terminals only hold a back-link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityNode {
    pub(crate) id: NodeId,
    pub(crate) mrid: String,
    pub(crate) terminals: Vec<TerminalId>,
}

impl ConnectivityNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn mrid(&self) -> &str {
        &self.mrid
    }

    /// Terminals connected here, in connection order.
    pub fn terminals(&self) -> &[TerminalId] {
        &self.terminals
    }
}
