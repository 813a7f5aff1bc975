use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::application::{LedgerService, MISSING_CODE, build_report};
use crate::domain::format_cents;

use super::{document, spreadsheet};

pub const CSV_HEADERS: [&str; 13] = [
    "internal_plan",
    "expense_nature",
    "ptres",
    "source",
    "note_number",
    "original_value",
    "remaining_value",
    "note_description",
    "deadline",
    "commitment_date",
    "commitment_value",
    "commitment_description",
    "requesting_section",
];

/// Exporter for rendering the consolidated ledger report. Every artifact is
/// fully regenerated on each request; nothing is updated incrementally.
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export the flattened report rows to CSV. Returns the row count.
    pub async fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let report = build_report(self.service).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(CSV_HEADERS)?;
        for row in &report.rows {
            let (date, value, description, section) = match &row.commitment {
                Some(c) => (
                    c.date.format("%d/%m/%Y %H:%M").to_string(),
                    format_cents(c.value),
                    c.description.clone(),
                    c.section_code.clone(),
                ),
                None => (
                    String::new(),
                    String::new(),
                    String::new(),
                    MISSING_CODE.to_string(),
                ),
            };
            csv_writer.write_record([
                row.plan_code.clone(),
                row.nature_code.clone(),
                row.ptres.clone(),
                row.source.clone(),
                row.note_number.clone(),
                format_cents(row.note_value),
                format_cents(row.note_remaining),
                row.note_description.clone(),
                row.deadline.format("%d/%m/%Y").to_string(),
                date,
                value,
                description,
                section,
            ])?;
        }

        csv_writer.flush()?;
        Ok(report.rows.len())
    }

    /// Export the full report (rows + grand totals) as JSON.
    pub async fn export_json<W: Write>(&self, writer: W) -> Result<()> {
        let report = build_report(self.service).await?;
        serde_json::to_writer_pretty(writer, &report)?;
        Ok(())
    }

    /// Write the styled spreadsheet artifact, creating the reports directory
    /// if needed.
    pub async fn save_spreadsheet(&self, path: &Path) -> Result<()> {
        let report = build_report(self.service).await?;
        ensure_parent_dir(path)?;
        spreadsheet::write_spreadsheet(&report, path)
            .with_context(|| format!("failed to write spreadsheet {}", path.display()))?;
        tracing::info!(path = %path.display(), "spreadsheet report written");
        Ok(())
    }

    /// Write the paginated document artifact, creating the reports directory
    /// if needed.
    pub async fn save_document(&self, path: &Path) -> Result<()> {
        let report = build_report(self.service).await?;
        ensure_parent_dir(path)?;
        document::write_document(&report, path)
            .with_context(|| format!("failed to write document {}", path.display()))?;
        tracing::info!(path = %path.display(), "document report written");
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create reports directory {}", dir.display()))?;
        }
    }
    Ok(())
}
