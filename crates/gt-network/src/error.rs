//! Network-specific error types.

use gt_core::{GridError, Id};
use thiserror::Error;

pub type NetworkResult<T> = Result<T, NetworkError>;

/// Structural errors raised by network mutation and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Another object of the same kind already uses this mRID.
    #[error("Duplicate {what} mRID '{mrid}'")]
    DuplicateMrid { what: &'static str, mrid: String },

    /// The terminal is already owned by a different piece of equipment.
    #[error("Terminal '{terminal}' already belongs to '{existing}' and cannot be added to '{requested}'")]
    Reparent {
        terminal: String,
        existing: String,
        requested: String,
    },

    /// The equipment already holds a terminal with this sequence number.
    #[error("'{equipment}' already has a terminal with sequence number {sequence_number}")]
    DuplicateSequenceNumber {
        equipment: String,
        sequence_number: u32,
    },

    /// An id does not refer to anything in this network.
    #[error("Unknown {what} {id}")]
    UnknownId { what: &'static str, id: Id },

    /// Cross references disagree (found by validation).
    #[error("Inconsistent network: {what}")]
    Inconsistent { what: String },
}

impl From<NetworkError> for GridError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::UnknownId { what, id } => GridError::NotFound {
                what: format!("{what} {id}"),
            },
            _ => GridError::Structural {
                what: err.to_string(),
            },
        }
    }
}
