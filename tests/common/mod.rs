// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use empenho::application::{LedgerService, NewNote};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap(), 5).await?;
    Ok((service, temp_dir))
}

/// Test fixture: standard reference data
pub struct StandardRefData;

impl StandardRefData {
    /// One plan, two natures under it, two requesting sections
    pub async fn create_basic(service: &LedgerService) -> Result<()> {
        service.create_plan("ADM2026").await?;
        service.create_nature("339030", "ADM2026").await?;
        service.create_nature("449052", "ADM2026").await?;
        service.create_section("SALC").await?;
        service.create_section("SFPC").await?;
        Ok(())
    }
}

/// A valid note creation payload against the basic reference data
pub fn note_fixture<'a>(number: &'a str, value: &'a str) -> NewNote<'a> {
    NewNote {
        number,
        value,
        nature_code: "339030",
        plan_code: "ADM2026",
        ptres: "167888",
        source: "0100000000",
        description: "Office supplies",
        note_text: None,
        deadline: "31/12/2026",
    }
}
