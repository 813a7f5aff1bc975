use chrono::Utc;
use serde::Serialize;

use crate::domain::{
    Cents, Commitment, CommitmentId, CreditNote, ExpenseNature, InternalPlan, ParseAmountError,
    RequestingSection, ValidationError, format_cents, normalize_code, parse_amount,
    parse_note_number,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing the ledger operations. This is the primary
/// interface for any client (CLI, exporters, tests).
pub struct LedgerService {
    repo: Repository,
}

/// Field set for creating a credit note. Monetary value arrives as raw user
/// input and is validated here, before any storage access.
pub struct NewNote<'a> {
    pub number: &'a str,
    pub value: &'a str,
    pub nature_code: &'a str,
    pub plan_code: &'a str,
    pub ptres: &'a str,
    pub source: &'a str,
    pub description: &'a str,
    pub note_text: Option<String>,
    pub deadline: &'a str,
}

/// Canned response of the simulated SIAFI lookup.
#[derive(Debug, Clone, Serialize)]
pub struct SiafiResponse {
    pub status: String,
    pub message: String,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open the database and apply migrations. The pool capacity comes from
    /// configuration, not a constant.
    pub async fn init(database_path: &str, max_connections: u32) -> Result<Self, AppError> {
        let repo = Repository::init(database_path, max_connections).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database without migrating.
    pub async fn connect(database_path: &str, max_connections: u32) -> Result<Self, AppError> {
        let repo = Repository::connect(database_path, max_connections).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Internal plans
    // ========================

    pub async fn create_plan(&self, code: &str) -> Result<InternalPlan, AppError> {
        let plan = InternalPlan::new(code)?;
        self.repo.save_plan(&plan).await?;
        tracing::info!(code = %plan.code, "internal plan created");
        Ok(plan)
    }

    pub async fn list_plans(&self) -> Result<Vec<InternalPlan>, AppError> {
        self.repo.list_plans().await
    }

    /// Delete a plan, cascading to its natures, their notes, and those
    /// notes' commitments.
    pub async fn delete_plan(&self, code: &str) -> Result<(), AppError> {
        let code = normalize_code(code, "internal plan code")?.to_uppercase();
        if !self.repo.delete_plan(&code).await? {
            return Err(AppError::not_found("internal plan", code));
        }
        tracing::info!(code = %code, "internal plan deleted");
        Ok(())
    }

    // ========================
    // Expense natures
    // ========================

    pub async fn create_nature(
        &self,
        code: &str,
        plan_code: &str,
    ) -> Result<ExpenseNature, AppError> {
        let nature = ExpenseNature::new(code, plan_code)?;
        if self.repo.get_plan(&nature.plan_code).await?.is_none() {
            return Err(AppError::missing_reference("internal plan", nature.plan_code));
        }
        self.repo.save_nature(&nature).await?;
        tracing::info!(code = %nature.code, plan = %nature.plan_code, "expense nature created");
        Ok(nature)
    }

    pub async fn list_natures(
        &self,
        plan_code: Option<&str>,
    ) -> Result<Vec<ExpenseNature>, AppError> {
        let plan_code = plan_code.map(|p| p.trim().to_uppercase());
        self.repo.list_natures(plan_code.as_deref()).await
    }

    pub async fn delete_nature(&self, code: &str) -> Result<(), AppError> {
        let code = normalize_code(code, "expense nature code")?;
        if !self.repo.delete_nature(&code).await? {
            return Err(AppError::not_found("expense nature", code));
        }
        tracing::info!(code = %code, "expense nature deleted");
        Ok(())
    }

    // ========================
    // Requesting sections
    // ========================

    pub async fn create_section(&self, code: &str) -> Result<RequestingSection, AppError> {
        let section = RequestingSection::new(code)?;
        self.repo.save_section(&section).await?;
        tracing::info!(code = %section.code, "requesting section created");
        Ok(section)
    }

    pub async fn list_sections(&self) -> Result<Vec<RequestingSection>, AppError> {
        self.repo.list_sections().await
    }

    /// Delete a section. Its commitments survive with a nulled section code.
    pub async fn delete_section(&self, code: &str) -> Result<(), AppError> {
        let code = normalize_code(code, "requesting section code")?.to_uppercase();
        if !self.repo.delete_section(&code).await? {
            return Err(AppError::not_found("requesting section", code));
        }
        tracing::info!(code = %code, "requesting section deleted");
        Ok(())
    }

    // ========================
    // Credit notes
    // ========================

    /// Create a credit note. All field validation happens before storage is
    /// touched; the note starts with its full value as remaining balance.
    pub async fn create_note(&self, new: NewNote<'_>) -> Result<CreditNote, AppError> {
        let value = parse_positive_amount(new.value)?;
        let note = CreditNote::new(
            new.number,
            value,
            new.nature_code,
            new.plan_code,
            new.ptres,
            new.source,
            new.description,
            new.note_text,
            new.deadline,
        )?;

        if self.repo.get_nature(&note.nature_code).await?.is_none() {
            return Err(AppError::missing_reference("expense nature", note.nature_code));
        }
        if self.repo.get_plan(&note.plan_code).await?.is_none() {
            return Err(AppError::missing_reference("internal plan", note.plan_code));
        }

        self.repo.save_note(&note).await?;
        tracing::info!(number = %note.number, value = %format_cents(note.value), "credit note created");
        Ok(note)
    }

    pub async fn get_note(&self, number: &str) -> Result<CreditNote, AppError> {
        let number = parse_note_number(number)?;
        self.repo
            .get_note(&number)
            .await?
            .ok_or_else(|| AppError::not_found("credit note", number))
    }

    /// List notes, newest first, optionally filtered by expense nature.
    pub async fn list_notes(
        &self,
        nature_code: Option<&str>,
    ) -> Result<Vec<CreditNote>, AppError> {
        self.repo.list_notes(nature_code).await
    }

    /// Delete a note and, by cascade, all its commitments. The caller must
    /// confirm explicitly; an unconfirmed call is rejected before any
    /// storage access.
    pub async fn delete_note(&self, number: &str, confirmed: bool) -> Result<CreditNote, AppError> {
        let number = parse_note_number(number)?;
        if !confirmed {
            return Err(AppError::NotConfirmed(number));
        }
        let note = self
            .repo
            .get_note(&number)
            .await?
            .ok_or_else(|| AppError::not_found("credit note", number.clone()))?;
        self.repo.delete_note(&number).await?;
        tracing::info!(number = %number, "credit note deleted with its commitments");
        Ok(note)
    }

    // ========================
    // Commitments
    // ========================

    /// Record a commitment against a note. The insert and the balance
    /// decrement are one atomic unit; exhausting the balance exactly is
    /// allowed, exceeding it fails with `InsufficientBalance`.
    pub async fn create_commitment(
        &self,
        note_number: &str,
        section_code: &str,
        value: &str,
        description: &str,
    ) -> Result<Commitment, AppError> {
        let value = parse_positive_amount(value)?;
        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyField("description").into());
        }
        let note_number = parse_note_number(note_number)?;
        let section_code = normalize_code(section_code, "requesting section code")?.to_uppercase();
        if self.repo.get_section(&section_code).await?.is_none() {
            return Err(AppError::missing_reference("requesting section", section_code));
        }

        let commitment = self
            .repo
            .create_commitment(&note_number, value, description, &section_code, Utc::now())
            .await?;
        tracing::info!(
            id = commitment.id,
            note = %commitment.note_number,
            value = %format_cents(commitment.value),
            "commitment recorded"
        );
        Ok(commitment)
    }

    pub async fn get_commitment(&self, id: CommitmentId) -> Result<Commitment, AppError> {
        self.repo
            .get_commitment(id)
            .await?
            .ok_or_else(|| AppError::not_found("commitment", id.to_string()))
    }

    pub async fn list_commitments(
        &self,
        note_number: Option<&str>,
        section_code: Option<&str>,
    ) -> Result<Vec<Commitment>, AppError> {
        let note_number = note_number.map(|n| n.trim().to_uppercase());
        let section_code = section_code.map(|s| s.trim().to_uppercase());
        self.repo
            .list_commitments(note_number.as_deref(), section_code.as_deref())
            .await
    }

    /// Delete a commitment, restoring its value to the parent note's
    /// remaining balance atomically.
    pub async fn delete_commitment(&self, id: CommitmentId) -> Result<Commitment, AppError> {
        let commitment = self.repo.delete_commitment(id).await?;
        tracing::info!(
            id = commitment.id,
            note = %commitment.note_number,
            value = %format_cents(commitment.value),
            "commitment deleted, balance restored"
        );
        Ok(commitment)
    }

    // ========================
    // SIAFI (stub)
    // ========================

    /// Simulated SIAFI lookup. No network access; always succeeds.
    pub fn consult_siafi(&self, user: &str, _password: &str) -> SiafiResponse {
        tracing::info!(user = %user, "simulated SIAFI lookup");
        SiafiResponse {
            status: "success".to_string(),
            message: "simulated lookup".to_string(),
        }
    }
}

/// Parse raw monetary input, rejecting zero and negative amounts.
fn parse_positive_amount(raw: &str) -> Result<Cents, ValidationError> {
    let cents = parse_amount(raw).map_err(|e| match e {
        ParseAmountError::Negative => ValidationError::NonPositiveAmount,
        ParseAmountError::InvalidFormat => ValidationError::BadAmount(raw.trim().to_string()),
    })?;
    if cents == 0 {
        return Err(ValidationError::NonPositiveAmount);
    }
    Ok(cents)
}
