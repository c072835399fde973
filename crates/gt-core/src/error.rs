use thiserror::Error;

use crate::phases::SinglePhaseKind;

pub type GridResult<T> = Result<T, GridError>;

/// Shared error taxonomy. Crate-local errors convert into this.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The network was mutated into an invalid shape (re-parenting, duplicates).
    #[error("Invalid network structure: {what}")]
    Structural { what: String },

    /// A traversal was driven outside its run/reset contract.
    #[error("Traversal misuse: {what}")]
    Traversal { what: String },

    /// The graph was found to be malformed while a trace was running.
    #[error("Tracing failed: {what}")]
    Tracing { what: String },

    /// A phase argument is not valid for the query.
    #[error("Invalid phase: {what}")]
    InvalidPhase { what: String },

    /// A second, different phase was applied to an energised nominal phase.
    #[error(
        "Crossing phases on nominal phase {nominal}: {existing} is already energised, cannot apply {applied}"
    )]
    PhaseConflict {
        nominal: SinglePhaseKind,
        existing: SinglePhaseKind,
        applied: SinglePhaseKind,
    },

    #[error("{what} not found")]
    NotFound { what: String },
}

impl GridError {
    pub fn tracing(what: impl Into<String>) -> Self {
        GridError::Tracing { what: what.into() }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        GridError::NotFound { what: what.into() }
    }
}
