use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Cents, Commitment};

use super::{AppError, LedgerService};

/// Placeholder rendered wherever a join link is missing (deleted nature,
/// commitment without a section).
pub const MISSING_CODE: &str = "N/A";

/// One flattened export row: the note with its plan/nature chain, plus one
/// commitment — or none, for notes that have no commitments yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub plan_code: String,
    pub nature_code: String,
    pub ptres: String,
    pub source: String,
    pub note_number: String,
    pub note_value: Cents,
    pub note_remaining: Cents,
    pub note_description: String,
    pub deadline: NaiveDate,
    pub commitment: Option<CommitmentCells>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentCells {
    pub date: DateTime<Utc>,
    pub value: Cents,
    pub description: String,
    pub section_code: String,
}

/// Grand totals across the whole ledger. A note contributes once to the
/// original and remaining totals however many rows it spans; the committed
/// total sums every commitment independently of note grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrandTotals {
    pub original: Cents,
    pub remaining: Cents,
    pub committed: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerReport {
    pub rows: Vec<ReportRow>,
    pub totals: GrandTotals,
}

/// Commitments drawn by one requesting section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionReport {
    pub section_code: String,
    pub commitments: Vec<Commitment>,
    pub total: Cents,
}

/// The one aggregation step behind every renderer: join each note to its
/// nature -> plan chain and enumerate its commitments, newest note first.
pub async fn build_report(service: &LedgerService) -> Result<LedgerReport, AppError> {
    let notes = service.list_notes(None).await?;
    let commitments = service.list_commitments(None, None).await?;
    let natures: HashMap<String, String> = service
        .list_natures(None)
        .await?
        .into_iter()
        .map(|n| (n.code, n.plan_code))
        .collect();

    let mut by_note: HashMap<&str, Vec<&Commitment>> = HashMap::new();
    for commitment in &commitments {
        by_note
            .entry(commitment.note_number.as_str())
            .or_default()
            .push(commitment);
    }

    let mut rows = Vec::new();
    for note in &notes {
        let plan_code = natures
            .get(&note.nature_code)
            .cloned()
            .unwrap_or_else(|| MISSING_CODE.to_string());
        let nature_code = if natures.contains_key(&note.nature_code) {
            note.nature_code.clone()
        } else {
            MISSING_CODE.to_string()
        };

        let base = ReportRow {
            plan_code,
            nature_code,
            ptres: note.ptres.clone(),
            source: note.source.clone(),
            note_number: note.number.clone(),
            note_value: note.value,
            note_remaining: note.remaining,
            note_description: note.description.clone(),
            deadline: note.deadline,
            commitment: None,
        };

        match by_note.get(note.number.as_str()) {
            None => rows.push(base),
            Some(related) => {
                for commitment in related {
                    rows.push(ReportRow {
                        commitment: Some(CommitmentCells {
                            date: commitment.created_at,
                            value: commitment.value,
                            description: commitment.description.clone(),
                            section_code: commitment
                                .section_code
                                .clone()
                                .unwrap_or_else(|| MISSING_CODE.to_string()),
                        }),
                        ..base.clone()
                    });
                }
            }
        }
    }

    let totals = GrandTotals {
        original: notes.iter().map(|n| n.value).sum(),
        remaining: notes.iter().map(|n| n.remaining).sum(),
        committed: commitments.iter().map(|c| c.value).sum(),
    };

    Ok(LedgerReport { rows, totals })
}

/// Per-section view: every commitment drawn by one section, with its total.
pub async fn build_section_report(
    service: &LedgerService,
    section_code: &str,
) -> Result<SectionReport, AppError> {
    let sections = service.list_sections().await?;
    let section_code = section_code.trim().to_uppercase();
    if !sections.iter().any(|s| s.code == section_code) {
        return Err(AppError::not_found("requesting section", section_code));
    }

    let commitments = service.list_commitments(None, Some(&section_code)).await?;
    let total = commitments.iter().map(|c| c.value).sum();

    Ok(SectionReport {
        section_code,
        commitments,
        total,
    })
}
