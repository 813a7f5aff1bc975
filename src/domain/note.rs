use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Cents, normalize_code};

static NOTE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^NC\d{6}$").expect("note number pattern"));

/// Field-level validation failures, raised before any storage access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("note number '{0}' must be NC followed by 6 digits (e.g. NC123456)")]
    BadNoteNumber(String),

    #[error("PTRES code '{0}' must be exactly 6 digits")]
    BadPtres(String),

    #[error("source code '{0}' must be exactly 10 digits")]
    BadSource(String),

    #[error("deadline '{0}' must be a valid date in DD/MM/YYYY format")]
    BadDeadline(String),

    #[error("invalid amount '{0}'")]
    BadAmount(String),

    #[error("amount must be positive")]
    NonPositiveAmount,
}

/// Parse and normalize a note number: `NC` + 6 digits, case-insensitive on
/// input, stored uppercase.
pub fn parse_note_number(raw: &str) -> Result<String, ValidationError> {
    let number = raw.trim().to_uppercase();
    if NOTE_NUMBER_RE.is_match(&number) {
        Ok(number)
    } else {
        Err(ValidationError::BadNoteNumber(raw.trim().to_string()))
    }
}

/// PTRES classification code: exactly 6 ASCII digits.
pub fn parse_ptres(raw: &str) -> Result<String, ValidationError> {
    let ptres = raw.trim();
    if is_digits(ptres, 6) {
        Ok(ptres.to_string())
    } else {
        Err(ValidationError::BadPtres(ptres.to_string()))
    }
}

/// Funding source code: exactly 10 ASCII digits.
pub fn parse_source(raw: &str) -> Result<String, ValidationError> {
    let source = raw.trim();
    if is_digits(source, 10) {
        Ok(source.to_string())
    } else {
        Err(ValidationError::BadSource(source.to_string()))
    }
}

/// Deadline in DD/MM/YYYY.
pub fn parse_deadline(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y")
        .map_err(|_| ValidationError::BadDeadline(raw.trim().to_string()))
}

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// A budget allocation with a fixed ceiling and a mutable remaining balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditNote {
    pub number: String,
    pub value: Cents,
    pub remaining: Cents,
    pub description: String,
    pub note_text: Option<String>,
    pub deadline: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub nature_code: String,
    pub plan_code: String,
    pub ptres: String,
    pub source: String,
}

impl CreditNote {
    /// Validate all fields and build a fresh note with `remaining == value`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        number: &str,
        value: Cents,
        nature_code: &str,
        plan_code: &str,
        ptres: &str,
        source: &str,
        description: &str,
        note_text: Option<String>,
        deadline: &str,
    ) -> Result<Self, ValidationError> {
        if value <= 0 {
            return Err(ValidationError::NonPositiveAmount);
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyField("description"));
        }

        Ok(Self {
            number: parse_note_number(number)?,
            value,
            remaining: value,
            description: description.to_string(),
            note_text: note_text.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            deadline: parse_deadline(deadline)?,
            created_at: Utc::now(),
            nature_code: normalize_code(nature_code, "expense nature code")?,
            plan_code: normalize_code(plan_code, "internal plan code")?.to_uppercase(),
            ptres: parse_ptres(ptres)?,
            source: parse_source(source)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_number_accepts_canonical() {
        assert_eq!(parse_note_number("NC123456").unwrap(), "NC123456");
    }

    #[test]
    fn test_note_number_uppercases() {
        assert_eq!(parse_note_number("nc123456").unwrap(), "NC123456");
    }

    #[test]
    fn test_note_number_rejects_short_and_wrong_prefix() {
        assert!(parse_note_number("NC12345").is_err());
        assert!(parse_note_number("XX123456").is_err());
        assert!(parse_note_number("NC1234567").is_err());
        assert!(parse_note_number("").is_err());
    }

    #[test]
    fn test_ptres_is_six_digits() {
        assert_eq!(parse_ptres("123456").unwrap(), "123456");
        assert!(parse_ptres("12345").is_err());
        assert!(parse_ptres("12345a").is_err());
        assert!(parse_ptres("1234567").is_err());
    }

    #[test]
    fn test_source_is_ten_digits() {
        assert_eq!(parse_source("0123456789").unwrap(), "0123456789");
        assert!(parse_source("123456789").is_err());
        assert!(parse_source("123456789x").is_err());
    }

    #[test]
    fn test_deadline_format() {
        assert_eq!(
            parse_deadline("01/08/2025").unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
        );
        assert!(parse_deadline("2025-08-01").is_err());
        assert!(parse_deadline("31/02/2025").is_err());
    }

    #[test]
    fn test_new_note_starts_with_full_balance() {
        let note = CreditNote::new(
            "nc000123",
            150_000,
            "339030",
            "abc",
            "123456",
            "0123456789",
            "Office supplies",
            None,
            "31/12/2026",
        )
        .unwrap();
        assert_eq!(note.number, "NC000123");
        assert_eq!(note.remaining, note.value);
        assert_eq!(note.plan_code, "ABC");
    }

    #[test]
    fn test_new_note_rejects_non_positive_value() {
        let result = CreditNote::new(
            "NC000123",
            0,
            "339030",
            "ABC",
            "123456",
            "0123456789",
            "Office supplies",
            None,
            "31/12/2026",
        );
        assert_eq!(result.unwrap_err(), ValidationError::NonPositiveAmount);
    }

    #[test]
    fn test_new_note_blank_observation_becomes_none() {
        let note = CreditNote::new(
            "NC000123",
            100,
            "339030",
            "ABC",
            "123456",
            "0123456789",
            "Office supplies",
            Some("  ".to_string()),
            "31/12/2026",
        )
        .unwrap();
        assert_eq!(note.note_text, None);
    }
}
