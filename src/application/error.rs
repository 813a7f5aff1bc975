use thiserror::Error;

use crate::domain::{Cents, CommitmentId, ValidationError, format_cents};

/// Typed failure taxonomy for every ledger operation. Storage-level
/// constraint violations are translated into `Duplicate` / `MissingReference`
/// at the repository boundary; only genuinely unexpected database failures
/// surface as `Storage`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} '{code}' already exists")]
    Duplicate { entity: &'static str, code: String },

    #[error("{entity} '{code}' does not exist")]
    MissingReference { entity: &'static str, code: String },

    #[error(
        "commitment of {} exceeds the remaining balance of {} on note {number}",
        format_cents(*.requested),
        format_cents(*.remaining)
    )]
    InsufficientBalance {
        number: String,
        remaining: Cents,
        requested: Cents,
    },

    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("deleting note {0} requires confirmation; all its commitments will be removed")]
    NotConfirmed(String),

    #[error("commitment {id} references note {note_number}, which no longer exists")]
    OrphanedCommitment {
        id: CommitmentId,
        note_number: String,
    },

    #[error("invalid record in the data store: {0}")]
    Decode(String),

    #[error("cannot reach the data store: {0}")]
    Storage(#[from] sqlx::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        AppError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn missing_reference(entity: &'static str, code: impl Into<String>) -> Self {
        AppError::MissingReference {
            entity,
            code: code.into(),
        }
    }
}
