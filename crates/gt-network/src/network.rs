//! The network container: an arena owning every graph entity.

use std::collections::HashMap;

use gt_core::{EquipmentId, FeederId, NodeId, PhaseCode, TerminalId};

use crate::equipment::{ConductingEquipment, EquipmentKind};
use crate::error::{NetworkError, NetworkResult};
use crate::feeder::Feeder;
use crate::node::ConnectivityNode;
use crate::terminal::Terminal;
use crate::validate;

/// Owns all equipment, terminals, connectivity nodes and feeders.
///
/// Entities are stored in vectors indexed by their ids and can also be
/// looked up by mRID. Structural mutation goes through `&mut self`; the
/// derived per-terminal state (directions, traced phases) can be written
/// through `&self` while a trace is running.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub(crate) equipment: Vec<ConductingEquipment>,
    pub(crate) terminals: Vec<Terminal>,
    pub(crate) nodes: Vec<ConnectivityNode>,
    pub(crate) feeders: Vec<Feeder>,
    equipment_by_mrid: HashMap<String, EquipmentId>,
    terminals_by_mrid: HashMap<String, TerminalId>,
    nodes_by_mrid: HashMap<String, NodeId>,
    feeders_by_mrid: HashMap<String, FeederId>,
}

fn next_id(len: usize) -> gt_core::Id {
    gt_core::Id::from_index(len as u32)
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    // --- creation -------------------------------------------------------

    /// Add a piece of equipment with no terminals.
    pub fn add_equipment(
        &mut self,
        mrid: impl Into<String>,
        kind: EquipmentKind,
    ) -> NetworkResult<EquipmentId> {
        let mrid = mrid.into();
        if self.equipment_by_mrid.contains_key(&mrid) {
            return Err(NetworkError::DuplicateMrid {
                what: "equipment",
                mrid,
            });
        }
        let id = next_id(self.equipment.len());
        self.equipment_by_mrid.insert(mrid.clone(), id);
        self.equipment.push(ConductingEquipment::new(id, mrid, kind));
        Ok(id)
    }

    /// Create a terminal not yet attached to any equipment.
    ///
    /// A `sequence_number` of `None` is assigned when the terminal is added
    /// to its equipment.
    pub fn create_terminal(
        &mut self,
        mrid: impl Into<String>,
        phases: PhaseCode,
        sequence_number: Option<u32>,
    ) -> NetworkResult<TerminalId> {
        let mrid = mrid.into();
        if self.terminals_by_mrid.contains_key(&mrid) {
            return Err(NetworkError::DuplicateMrid {
                what: "terminal",
                mrid,
            });
        }
        let id = next_id(self.terminals.len());
        self.terminals_by_mrid.insert(mrid.clone(), id);
        self.terminals
            .push(Terminal::new(id, mrid, phases, sequence_number.unwrap_or(0)));
        Ok(id)
    }

    pub fn add_node(&mut self, mrid: impl Into<String>) -> NetworkResult<NodeId> {
        let mrid = mrid.into();
        if self.nodes_by_mrid.contains_key(&mrid) {
            return Err(NetworkError::DuplicateMrid { what: "node", mrid });
        }
        let id = next_id(self.nodes.len());
        self.nodes_by_mrid.insert(mrid.clone(), id);
        self.nodes.push(ConnectivityNode {
            id,
            mrid,
            terminals: Vec::new(),
        });
        Ok(id)
    }

    /// Look up a node by mRID, creating it when missing.
    pub fn node_or_insert(&mut self, mrid: &str) -> NodeId {
        if let Some(id) = self.nodes_by_mrid.get(mrid) {
            return *id;
        }
        let id = next_id(self.nodes.len());
        self.nodes_by_mrid.insert(mrid.to_owned(), id);
        self.nodes.push(ConnectivityNode {
            id,
            mrid: mrid.to_owned(),
            terminals: Vec::new(),
        });
        id
    }

    pub fn add_feeder(
        &mut self,
        mrid: impl Into<String>,
        head_terminal: Option<TerminalId>,
    ) -> NetworkResult<FeederId> {
        let mrid = mrid.into();
        if self.feeders_by_mrid.contains_key(&mrid) {
            return Err(NetworkError::DuplicateMrid {
                what: "feeder",
                mrid,
            });
        }
        if let Some(head) = head_terminal {
            self.check_terminal(head)?;
        }
        let id = next_id(self.feeders.len());
        self.feeders_by_mrid.insert(mrid.clone(), id);
        self.feeders.push(Feeder::new(id, mrid, head_terminal));
        Ok(id)
    }

    pub fn set_feeder_head(
        &mut self,
        feeder: FeederId,
        head_terminal: Option<TerminalId>,
    ) -> NetworkResult<()> {
        if let Some(head) = head_terminal {
            self.check_terminal(head)?;
        }
        self.feeder_mut(feeder)?.head_terminal = head_terminal;
        Ok(())
    }

    // --- structural mutation -------------------------------------------

    /// Attach `terminal` to `equipment`.
    ///
    /// Fails when the terminal already belongs to different equipment or when
    /// its sequence number is already taken on this equipment. Re-adding a
    /// terminal that is already attached here is a no-op. An unset sequence
    /// number becomes one past the highest in use.
    pub fn add_terminal(&mut self, equipment: EquipmentId, terminal: TerminalId) -> NetworkResult<()> {
        self.check_equipment(equipment)?;
        self.check_terminal(terminal)?;

        let eq = &self.equipment[equipment.slot()];
        let term = &self.terminals[terminal.slot()];
        match term.equipment {
            Some(existing) if existing != equipment => {
                return Err(NetworkError::Reparent {
                    terminal: term.mrid.clone(),
                    existing: self.equipment[existing.slot()].mrid.clone(),
                    requested: eq.mrid.clone(),
                });
            }
            Some(_) if eq.terminals.contains(&terminal) => return Ok(()),
            _ => {}
        }

        let sequence_of = |t: &TerminalId| self.terminals[t.slot()].sequence_number;
        let sequence_number = match term.sequence_number {
            0 => eq.terminals.iter().map(sequence_of).max().unwrap_or(0) + 1,
            n => n,
        };
        if eq.terminals.iter().any(|t| sequence_of(t) == sequence_number) {
            return Err(NetworkError::DuplicateSequenceNumber {
                equipment: eq.mrid.clone(),
                sequence_number,
            });
        }
        let position = eq
            .terminals
            .partition_point(|t| sequence_of(t) < sequence_number);

        let term = &mut self.terminals[terminal.slot()];
        term.equipment = Some(equipment);
        term.sequence_number = sequence_number;
        self.equipment[equipment.slot()]
            .terminals
            .insert(position, terminal);
        Ok(())
    }

    /// Bind `terminal` to `node`, moving it off any node it was on.
    pub fn connect(&mut self, terminal: TerminalId, node: NodeId) -> NetworkResult<()> {
        self.check_terminal(terminal)?;
        self.check_node(node)?;
        match self.terminals[terminal.slot()].node {
            Some(current) if current == node => {}
            Some(_) => self.disconnect(terminal)?,
            None => {}
        }
        self.terminals[terminal.slot()].node = Some(node);
        let members = &mut self.nodes[node.slot()].terminals;
        if !members.contains(&terminal) {
            members.push(terminal);
        }
        Ok(())
    }

    /// Unbind `terminal` from its node, if any.
    pub fn disconnect(&mut self, terminal: TerminalId) -> NetworkResult<()> {
        self.check_terminal(terminal)?;
        if let Some(node) = self.terminals[terminal.slot()].node.take() {
            self.nodes[node.slot()].terminals.retain(|t| *t != terminal);
        }
        Ok(())
    }

    // --- lookup ----------------------------------------------------------

    pub fn equipment(&self, id: EquipmentId) -> Option<&ConductingEquipment> {
        self.equipment.get(id.slot())
    }

    pub fn equipment_mut(&mut self, id: EquipmentId) -> Option<&mut ConductingEquipment> {
        self.equipment.get_mut(id.slot())
    }

    pub fn terminal(&self, id: TerminalId) -> Option<&Terminal> {
        self.terminals.get(id.slot())
    }

    pub fn node(&self, id: NodeId) -> Option<&ConnectivityNode> {
        self.nodes.get(id.slot())
    }

    pub fn feeder(&self, id: FeederId) -> Option<&Feeder> {
        self.feeders.get(id.slot())
    }

    pub fn feeder_mut(&mut self, id: FeederId) -> NetworkResult<&mut Feeder> {
        self.feeders
            .get_mut(id.slot())
            .ok_or(NetworkError::UnknownId { what: "feeder", id })
    }

    pub fn try_equipment(&self, id: EquipmentId) -> NetworkResult<&ConductingEquipment> {
        self.equipment(id)
            .ok_or(NetworkError::UnknownId { what: "equipment", id })
    }

    pub fn try_terminal(&self, id: TerminalId) -> NetworkResult<&Terminal> {
        self.terminal(id)
            .ok_or(NetworkError::UnknownId { what: "terminal", id })
    }

    pub fn equipment_by_mrid(&self, mrid: &str) -> Option<EquipmentId> {
        self.equipment_by_mrid.get(mrid).copied()
    }

    pub fn terminal_by_mrid(&self, mrid: &str) -> Option<TerminalId> {
        self.terminals_by_mrid.get(mrid).copied()
    }

    pub fn node_by_mrid(&self, mrid: &str) -> Option<NodeId> {
        self.nodes_by_mrid.get(mrid).copied()
    }

    pub fn feeder_by_mrid(&self, mrid: &str) -> Option<FeederId> {
        self.feeders_by_mrid.get(mrid).copied()
    }

    pub fn equipment_list(&self) -> &[ConductingEquipment] {
        &self.equipment
    }

    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub fn nodes(&self) -> &[ConnectivityNode] {
        &self.nodes
    }

    pub fn feeders(&self) -> &[Feeder] {
        &self.feeders
    }

    pub fn equipment_count(&self) -> usize {
        self.equipment.len()
    }

    /// The terminal of `equipment` with the given 1-based sequence number.
    pub fn terminal_at(&self, equipment: EquipmentId, sequence_number: u32) -> Option<TerminalId> {
        self.equipment(equipment)?
            .terminals
            .iter()
            .copied()
            .find(|t| self.terminals[t.slot()].sequence_number == sequence_number)
    }

    /// Other terminals sharing `terminal`'s connectivity node.
    pub fn connected_terminals(&self, terminal: TerminalId) -> impl Iterator<Item = TerminalId> + '_ {
        self.terminal(terminal)
            .and_then(|t| t.node)
            .and_then(|node| self.node(node))
            .map(|node| node.terminals.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(move |t| *t != terminal)
    }

    /// Other terminals on `terminal`'s equipment.
    pub fn other_terminals(&self, terminal: TerminalId) -> impl Iterator<Item = TerminalId> + '_ {
        self.terminal(terminal)
            .and_then(|t| t.equipment)
            .and_then(|eq| self.equipment(eq))
            .map(|eq| eq.terminals.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(move |t| *t != terminal)
    }

    pub fn is_feeder_head_terminal(&self, terminal: TerminalId) -> bool {
        self.feeders
            .iter()
            .any(|f| f.head_terminal == Some(terminal))
    }

    /// Cross-check every stored back-reference.
    pub fn validate(&self) -> NetworkResult<()> {
        validate::validate_network(self)
    }

    // --- internal --------------------------------------------------------

    fn check_equipment(&self, id: EquipmentId) -> NetworkResult<()> {
        self.try_equipment(id).map(|_| ())
    }

    fn check_terminal(&self, id: TerminalId) -> NetworkResult<()> {
        self.try_terminal(id).map(|_| ())
    }

    fn check_node(&self, id: NodeId) -> NetworkResult<()> {
        match self.node(id) {
            Some(_) => Ok(()),
            None => Err(NetworkError::UnknownId { what: "node", id }),
        }
    }
}
