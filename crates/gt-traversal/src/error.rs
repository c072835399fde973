//! Error types for traversal misuse.

use gt_core::GridError;
use thiserror::Error;

/// Misuse of the run/reset contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TraversalError {
    /// `run` was called again without an intervening `reset`.
    #[error("Traversal has already run and must be reset before reuse")]
    NotReset,

    /// A branch id that does not belong to this traversal.
    #[error("Unknown branch {index}")]
    UnknownBranch { index: usize },
}

impl From<TraversalError> for GridError {
    fn from(err: TraversalError) -> Self {
        GridError::Traversal {
            what: err.to_string(),
        }
    }
}
