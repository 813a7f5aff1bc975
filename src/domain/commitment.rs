use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Cents;

pub type CommitmentId = i64;

/// A drawdown recorded against a credit note's remaining balance. The id is
/// assigned by the store on insert; the section becomes `None` when its
/// requesting section is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commitment {
    pub id: CommitmentId,
    pub note_number: String,
    pub value: Cents,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub section_code: Option<String>,
}
