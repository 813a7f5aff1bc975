mod common;

use anyhow::Result;
use common::{StandardRefData, note_fixture, test_service};
use empenho::application::AppError;

#[tokio::test]
async fn test_plan_codes_are_uppercased_and_unique() -> Result<()> {
    let (service, _tmp) = test_service().await?;

    let plan = service.create_plan("adm2026").await?;
    assert_eq!(plan.code, "ADM2026");

    let err = service.create_plan("ADM2026").await.unwrap_err();
    assert!(matches!(err, AppError::Duplicate { entity: "internal plan", .. }));

    let plans = service.list_plans().await?;
    assert_eq!(plans.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_nature_requires_existing_plan() -> Result<()> {
    let (service, _tmp) = test_service().await?;

    let err = service.create_nature("339030", "MISSING").await.unwrap_err();
    assert!(matches!(err, AppError::MissingReference { entity: "internal plan", .. }));

    service.create_plan("ADM2026").await?;
    let nature = service.create_nature("339030", "adm2026").await?;
    assert_eq!(nature.plan_code, "ADM2026");

    let err = service.create_nature("339030", "ADM2026").await.unwrap_err();
    assert!(matches!(err, AppError::Duplicate { entity: "expense nature", .. }));
    Ok(())
}

#[tokio::test]
async fn test_nature_list_filters_by_plan() -> Result<()> {
    let (service, _tmp) = test_service().await?;
    StandardRefData::create_basic(&service).await?;
    service.create_plan("OPS2026").await?;
    service.create_nature("339139", "OPS2026").await?;

    assert_eq!(service.list_natures(None).await?.len(), 3);
    assert_eq!(service.list_natures(Some("ADM2026")).await?.len(), 2);
    assert_eq!(service.list_natures(Some("OPS2026")).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_delete_missing_codes_fail_with_not_found() -> Result<()> {
    let (service, _tmp) = test_service().await?;

    assert!(matches!(
        service.delete_plan("NOPE").await.unwrap_err(),
        AppError::NotFound { entity: "internal plan", .. }
    ));
    assert!(matches!(
        service.delete_nature("999999").await.unwrap_err(),
        AppError::NotFound { entity: "expense nature", .. }
    ));
    assert!(matches!(
        service.delete_section("NOPE").await.unwrap_err(),
        AppError::NotFound { entity: "requesting section", .. }
    ));
    Ok(())
}

#[tokio::test]
async fn test_deleting_plan_cascades_to_natures_notes_and_commitments() -> Result<()> {
    let (service, _tmp) = test_service().await?;
    StandardRefData::create_basic(&service).await?;

    service.create_note(note_fixture("NC000001", "1000.00")).await?;
    let commitment = service
        .create_commitment("NC000001", "SALC", "100.00", "Printer paper")
        .await?;

    service.delete_plan("ADM2026").await?;

    assert!(service.list_natures(None).await?.is_empty());
    assert!(service.list_notes(None).await?.is_empty());
    assert!(matches!(
        service.get_commitment(commitment.id).await.unwrap_err(),
        AppError::NotFound { entity: "commitment", .. }
    ));
    Ok(())
}

#[tokio::test]
async fn test_deleting_section_nulls_commitment_references() -> Result<()> {
    let (service, _tmp) = test_service().await?;
    StandardRefData::create_basic(&service).await?;
    service.create_note(note_fixture("NC000001", "1000.00")).await?;
    let commitment = service
        .create_commitment("NC000001", "SALC", "250.00", "Toner cartridges")
        .await?;
    assert_eq!(commitment.section_code.as_deref(), Some("SALC"));

    service.delete_section("SALC").await?;

    // The commitment row survives, detached from the section.
    let survivor = service.get_commitment(commitment.id).await?;
    assert_eq!(survivor.section_code, None);

    // The note balance is untouched.
    let note = service.get_note("NC000001").await?;
    assert_eq!(note.remaining, 75_000);
    Ok(())
}

#[tokio::test]
async fn test_section_codes_are_uppercased() -> Result<()> {
    let (service, _tmp) = test_service().await?;
    let section = service.create_section("salc").await?;
    assert_eq!(section.code, "SALC");

    let err = service.create_section("SALC").await.unwrap_err();
    assert!(matches!(err, AppError::Duplicate { entity: "requesting section", .. }));
    Ok(())
}
