//! Network validation logic.

use std::collections::HashSet;

use crate::error::{NetworkError, NetworkResult};
use crate::network::Network;

fn inconsistent(what: String) -> NetworkError {
    NetworkError::Inconsistent { what }
}

/// Validate that every forward relation has a matching back-link and vice versa.
pub(crate) fn validate_network(network: &Network) -> NetworkResult<()> {
    validate_equipment_terminals(network)?;
    validate_node_membership(network)?;
    validate_feeder_heads(network)?;
    tracing::debug!(
        equipment = network.equipment.len(),
        terminals = network.terminals.len(),
        nodes = network.nodes.len(),
        "network validated"
    );
    Ok(())
}

fn validate_equipment_terminals(network: &Network) -> NetworkResult<()> {
    for eq in &network.equipment {
        let mut sequence_numbers = HashSet::new();
        for &t in &eq.terminals {
            let term = network
                .terminal(t)
                .ok_or_else(|| inconsistent(format!("'{}' lists unknown terminal {t}", eq.mrid)))?;
            if term.equipment != Some(eq.id) {
                return Err(inconsistent(format!(
                    "'{}' lists terminal '{}' which belongs elsewhere",
                    eq.mrid, term.mrid
                )));
            }
            if !sequence_numbers.insert(term.sequence_number) {
                return Err(NetworkError::DuplicateSequenceNumber {
                    equipment: eq.mrid.clone(),
                    sequence_number: term.sequence_number,
                });
            }
        }
    }

    // Every attached terminal must be listed by its equipment
    for term in &network.terminals {
        if let Some(eq) = term.equipment {
            let listed = network
                .equipment(eq)
                .is_some_and(|e| e.terminals.contains(&term.id));
            if !listed {
                return Err(inconsistent(format!(
                    "terminal '{}' is not listed by its equipment {eq}",
                    term.mrid
                )));
            }
        }
    }
    Ok(())
}

fn validate_node_membership(network: &Network) -> NetworkResult<()> {
    let mut seen = HashSet::new();
    for node in &network.nodes {
        for &t in &node.terminals {
            let term = network
                .terminal(t)
                .ok_or_else(|| inconsistent(format!("node '{}' lists unknown terminal {t}", node.mrid)))?;
            if term.node != Some(node.id) {
                return Err(inconsistent(format!(
                    "node '{}' lists terminal '{}' which references another node",
                    node.mrid, term.mrid
                )));
            }
            if !seen.insert(t) {
                return Err(inconsistent(format!(
                    "terminal '{}' appears in more than one node",
                    term.mrid
                )));
            }
        }
    }

    // Every connected terminal must be a member of its node
    for term in &network.terminals {
        if let Some(node) = term.node {
            if !seen.contains(&term.id) {
                return Err(inconsistent(format!(
                    "terminal '{}' references node {node} but is not a member",
                    term.mrid
                )));
            }
        }
    }
    Ok(())
}

fn validate_feeder_heads(network: &Network) -> NetworkResult<()> {
    for feeder in &network.feeders {
        if let Some(head) = feeder.head_terminal {
            if network.terminal(head).is_none() {
                return Err(inconsistent(format!(
                    "feeder '{}' has unknown head terminal {head}",
                    feeder.mrid
                )));
            }
        }
    }
    Ok(())
}
