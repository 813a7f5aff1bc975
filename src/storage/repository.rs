use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::application::AppError;
use crate::domain::{
    Cents, Commitment, CommitmentId, CreditNote, ExpenseNature, InternalPlan, RequestingSection,
};

use super::MIGRATION_001_INITIAL;

const DEADLINE_FORMAT: &str = "%Y-%m-%d";

/// Repository for the credit note ledger. All balance-affecting writes run in
/// a single transaction; unique-constraint violations are translated into
/// domain errors here so callers never see a raw database error for them.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository over an existing connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a bounded connection pool on the SQLite database at the given
    /// path, creating the file if needed. Foreign keys are enforced on every
    /// connection; the cascade and set-null rules in the schema depend on it.
    pub async fn connect(database_path: &str, max_connections: u32) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{database_path}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }

    /// Run database migrations. Idempotent.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Initialize the store (connect + migrate).
    pub async fn init(database_path: &str, max_connections: u32) -> Result<Self, AppError> {
        let repo = Self::connect(database_path, max_connections).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Internal plans
    // ========================

    pub async fn save_plan(&self, plan: &InternalPlan) -> Result<(), AppError> {
        sqlx::query("INSERT INTO plans (code) VALUES (?)")
            .bind(&plan.code)
            .execute(&self.pool)
            .await
            .map_err(|e| on_duplicate(e, "internal plan", &plan.code))?;
        Ok(())
    }

    pub async fn get_plan(&self, code: &str) -> Result<Option<InternalPlan>, AppError> {
        let row = sqlx::query("SELECT code FROM plans WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| InternalPlan { code: r.get("code") }))
    }

    pub async fn list_plans(&self) -> Result<Vec<InternalPlan>, AppError> {
        let rows = sqlx::query("SELECT code FROM plans ORDER BY code")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|r| InternalPlan { code: r.get("code") })
            .collect())
    }

    /// Delete a plan. Cascades to its natures, their notes, and those notes'
    /// commitments. Returns false when the code was not present.
    pub async fn delete_plan(&self, code: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM plans WHERE code = ?")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ========================
    // Expense natures
    // ========================

    pub async fn save_nature(&self, nature: &ExpenseNature) -> Result<(), AppError> {
        sqlx::query("INSERT INTO natures (code, plan_code) VALUES (?, ?)")
            .bind(&nature.code)
            .bind(&nature.plan_code)
            .execute(&self.pool)
            .await
            .map_err(|e| on_duplicate(e, "expense nature", &nature.code))?;
        Ok(())
    }

    pub async fn get_nature(&self, code: &str) -> Result<Option<ExpenseNature>, AppError> {
        let row = sqlx::query("SELECT code, plan_code FROM natures WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| ExpenseNature {
            code: r.get("code"),
            plan_code: r.get("plan_code"),
        }))
    }

    pub async fn list_natures(
        &self,
        plan_code: Option<&str>,
    ) -> Result<Vec<ExpenseNature>, AppError> {
        let rows = match plan_code {
            Some(plan) => {
                sqlx::query("SELECT code, plan_code FROM natures WHERE plan_code = ? ORDER BY code")
                    .bind(plan)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT code, plan_code FROM natures ORDER BY code")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows
            .iter()
            .map(|r| ExpenseNature {
                code: r.get("code"),
                plan_code: r.get("plan_code"),
            })
            .collect())
    }

    pub async fn delete_nature(&self, code: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM natures WHERE code = ?")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ========================
    // Requesting sections
    // ========================

    pub async fn save_section(&self, section: &RequestingSection) -> Result<(), AppError> {
        sqlx::query("INSERT INTO sections (code) VALUES (?)")
            .bind(&section.code)
            .execute(&self.pool)
            .await
            .map_err(|e| on_duplicate(e, "requesting section", &section.code))?;
        Ok(())
    }

    pub async fn get_section(&self, code: &str) -> Result<Option<RequestingSection>, AppError> {
        let row = sqlx::query("SELECT code FROM sections WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| RequestingSection { code: r.get("code") }))
    }

    pub async fn list_sections(&self) -> Result<Vec<RequestingSection>, AppError> {
        let rows = sqlx::query("SELECT code FROM sections ORDER BY code")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|r| RequestingSection { code: r.get("code") })
            .collect())
    }

    /// Delete a section. Commitments referencing it keep their row with a
    /// nulled section code.
    pub async fn delete_section(&self, code: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sections WHERE code = ?")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ========================
    // Credit notes
    // ========================

    pub async fn save_note(&self, note: &CreditNote) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notes (number, value_cents, remaining_cents, description, note_text,
                               deadline, created_at, nature_code, plan_code, ptres, source)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&note.number)
        .bind(note.value)
        .bind(note.remaining)
        .bind(&note.description)
        .bind(&note.note_text)
        .bind(note.deadline.format(DEADLINE_FORMAT).to_string())
        .bind(note.created_at.to_rfc3339())
        .bind(&note.nature_code)
        .bind(&note.plan_code)
        .bind(&note.ptres)
        .bind(&note.source)
        .execute(&self.pool)
        .await
        .map_err(|e| on_duplicate(e, "credit note", &note.number))?;
        Ok(())
    }

    pub async fn get_note(&self, number: &str) -> Result<Option<CreditNote>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT number, value_cents, remaining_cents, description, note_text,
                   deadline, created_at, nature_code, plan_code, ptres, source
            FROM notes
            WHERE number = ?
            "#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_note(&row)?)),
            None => Ok(None),
        }
    }

    /// List notes, newest first. Creation-time ties resolve by insertion
    /// order, still newest first.
    pub async fn list_notes(&self, nature_code: Option<&str>) -> Result<Vec<CreditNote>, AppError> {
        let base = r#"
            SELECT number, value_cents, remaining_cents, description, note_text,
                   deadline, created_at, nature_code, plan_code, ptres, source
            FROM notes
        "#;
        let rows = match nature_code {
            Some(nature) => {
                let query =
                    format!("{base} WHERE nature_code = ? ORDER BY created_at DESC, rowid DESC");
                sqlx::query(&query).bind(nature).fetch_all(&self.pool).await?
            }
            None => {
                let query = format!("{base} ORDER BY created_at DESC, rowid DESC");
                sqlx::query(&query).fetch_all(&self.pool).await?
            }
        };
        rows.iter().map(Self::row_to_note).collect()
    }

    /// Delete a note. The schema cascades the delete to its commitments; no
    /// balance restoration applies since the note itself disappears.
    pub async fn delete_note(&self, number: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM notes WHERE number = ?")
            .bind(number)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_note(row: &SqliteRow) -> Result<CreditNote, AppError> {
        let deadline_str: String = row.get("deadline");
        let created_at_str: String = row.get("created_at");

        Ok(CreditNote {
            number: row.get("number"),
            value: row.get("value_cents"),
            remaining: row.get("remaining_cents"),
            description: row.get("description"),
            note_text: row.get("note_text"),
            deadline: NaiveDate::parse_from_str(&deadline_str, DEADLINE_FORMAT)
                .map_err(|e| AppError::Decode(format!("note deadline: {e}")))?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map_err(|e| AppError::Decode(format!("note created_at: {e}")))?
                .with_timezone(&Utc),
            nature_code: row.get("nature_code"),
            plan_code: row.get("plan_code"),
            ptres: row.get("ptres"),
            source: row.get("source"),
        })
    }

    // ========================
    // Commitments
    // ========================

    /// Insert a commitment and decrement the parent note's remaining balance
    /// in one transaction. The remaining balance is re-read inside the
    /// transaction, so a caller racing another writer validates against the
    /// freshly committed value, never a stale one.
    pub async fn create_commitment(
        &self,
        note_number: &str,
        value: Cents,
        description: &str,
        section_code: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Commitment, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT remaining_cents FROM notes WHERE number = ?")
            .bind(note_number)
            .fetch_optional(&mut *tx)
            .await?;
        let remaining: Cents = match row {
            Some(row) => row.get("remaining_cents"),
            None => return Err(AppError::not_found("credit note", note_number)),
        };

        if value > remaining {
            return Err(AppError::InsufficientBalance {
                number: note_number.to_string(),
                remaining,
                requested: value,
            });
        }

        let result = sqlx::query(
            r#"
            INSERT INTO commitments (note_number, value_cents, description, created_at, section_code)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(note_number)
        .bind(value)
        .bind(description)
        .bind(created_at.to_rfc3339())
        .bind(section_code)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();

        sqlx::query("UPDATE notes SET remaining_cents = remaining_cents - ? WHERE number = ?")
            .bind(value)
            .bind(note_number)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Commitment {
            id,
            note_number: note_number.to_string(),
            value,
            description: description.to_string(),
            created_at,
            section_code: Some(section_code.to_string()),
        })
    }

    /// Delete a commitment and restore its value to the parent note's
    /// remaining balance in one transaction — the exact inverse of
    /// `create_commitment`. A commitment whose parent note is gone violates
    /// the cascade rules and is reported, not repaired.
    pub async fn delete_commitment(&self, id: CommitmentId) -> Result<Commitment, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT id, note_number, value_cents, description, created_at, section_code
            FROM commitments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let commitment = match row {
            Some(row) => Self::row_to_commitment(&row)?,
            None => return Err(AppError::not_found("commitment", id.to_string())),
        };

        let updated =
            sqlx::query("UPDATE notes SET remaining_cents = remaining_cents + ? WHERE number = ?")
                .bind(commitment.value)
                .bind(&commitment.note_number)
                .execute(&mut *tx)
                .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::OrphanedCommitment {
                id,
                note_number: commitment.note_number.clone(),
            });
        }

        sqlx::query("DELETE FROM commitments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(commitment)
    }

    pub async fn get_commitment(&self, id: CommitmentId) -> Result<Option<Commitment>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT id, note_number, value_cents, description, created_at, section_code
            FROM commitments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_commitment(&row)?)),
            None => Ok(None),
        }
    }

    /// List commitments in insertion order, optionally filtered by parent
    /// note and/or requesting section.
    pub async fn list_commitments(
        &self,
        note_number: Option<&str>,
        section_code: Option<&str>,
    ) -> Result<Vec<Commitment>, AppError> {
        let mut query = String::from(
            "SELECT id, note_number, value_cents, description, created_at, section_code \
             FROM commitments WHERE 1=1",
        );
        if note_number.is_some() {
            query.push_str(" AND note_number = ?");
        }
        if section_code.is_some() {
            query.push_str(" AND section_code = ?");
        }
        query.push_str(" ORDER BY id");

        let mut sql_query = sqlx::query(&query);
        if let Some(note) = note_number {
            sql_query = sql_query.bind(note);
        }
        if let Some(section) = section_code {
            sql_query = sql_query.bind(section);
        }

        let rows = sql_query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_commitment).collect()
    }

    fn row_to_commitment(row: &SqliteRow) -> Result<Commitment, AppError> {
        let created_at_str: String = row.get("created_at");

        Ok(Commitment {
            id: row.get("id"),
            note_number: row.get("note_number"),
            value: row.get("value_cents"),
            description: row.get("description"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map_err(|e| AppError::Decode(format!("commitment created_at: {e}")))?
                .with_timezone(&Utc),
            section_code: row.get("section_code"),
        })
    }
}

/// Translate a unique-constraint violation on insert into the domain-level
/// duplicate error naming the offending code.
fn on_duplicate(err: sqlx::Error, entity: &'static str, code: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Duplicate {
            entity,
            code: code.to_string(),
        },
        _ => AppError::Storage(err),
    }
}
