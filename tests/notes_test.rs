mod common;

use anyhow::Result;
use common::{StandardRefData, note_fixture, test_service};
use empenho::application::{AppError, NewNote};
use empenho::domain::ValidationError;

#[tokio::test]
async fn test_new_note_remaining_equals_original() -> Result<()> {
    let (service, _tmp) = test_service().await?;
    StandardRefData::create_basic(&service).await?;

    let note = service.create_note(note_fixture("NC000001", "1500,50")).await?;
    assert_eq!(note.value, 150_050);
    assert_eq!(note.remaining, note.value);

    let stored = service.get_note("NC000001").await?;
    assert_eq!(stored.remaining, stored.value);
    Ok(())
}

#[tokio::test]
async fn test_note_number_is_normalized_to_uppercase() -> Result<()> {
    let (service, _tmp) = test_service().await?;
    StandardRefData::create_basic(&service).await?;

    let note = service.create_note(note_fixture("nc123456", "100.00")).await?;
    assert_eq!(note.number, "NC123456");

    // Lookup is case-insensitive through the same normalization.
    let found = service.get_note("nc123456").await?;
    assert_eq!(found.number, "NC123456");
    Ok(())
}

#[tokio::test]
async fn test_duplicate_note_number_rejected() -> Result<()> {
    let (service, _tmp) = test_service().await?;
    StandardRefData::create_basic(&service).await?;

    service.create_note(note_fixture("NC000001", "100.00")).await?;
    let err = service
        .create_note(note_fixture("NC000001", "200.00"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Duplicate { entity: "credit note", .. }));
    Ok(())
}

#[tokio::test]
async fn test_note_field_validation_happens_before_storage() -> Result<()> {
    let (service, _tmp) = test_service().await?;
    StandardRefData::create_basic(&service).await?;

    // Malformed number
    let err = service
        .create_note(note_fixture("XX123456", "100.00"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::BadNoteNumber(_))
    ));

    // Wrong-length PTRES
    let err = service
        .create_note(NewNote {
            ptres: "12345",
            ..note_fixture("NC000002", "100.00")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ValidationError::BadPtres(_))));

    // Wrong-length source
    let err = service
        .create_note(NewNote {
            source: "123",
            ..note_fixture("NC000002", "100.00")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ValidationError::BadSource(_))));

    // Unparsable deadline
    let err = service
        .create_note(NewNote {
            deadline: "2026-12-31",
            ..note_fixture("NC000002", "100.00")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ValidationError::BadDeadline(_))));

    // Non-positive value
    let err = service
        .create_note(note_fixture("NC000002", "0"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::NonPositiveAmount)
    ));

    // Nothing was persisted by any of the rejected calls.
    assert!(service.list_notes(None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_note_requires_existing_nature_and_plan() -> Result<()> {
    let (service, _tmp) = test_service().await?;
    StandardRefData::create_basic(&service).await?;

    let err = service
        .create_note(NewNote {
            nature_code: "000000",
            ..note_fixture("NC000001", "100.00")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MissingReference { entity: "expense nature", .. }));

    let err = service
        .create_note(NewNote {
            plan_code: "MISSING",
            ..note_fixture("NC000001", "100.00")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MissingReference { entity: "internal plan", .. }));
    Ok(())
}

#[tokio::test]
async fn test_notes_list_newest_first_with_nature_filter() -> Result<()> {
    let (service, _tmp) = test_service().await?;
    StandardRefData::create_basic(&service).await?;

    service.create_note(note_fixture("NC000001", "100.00")).await?;
    service.create_note(note_fixture("NC000002", "200.00")).await?;
    service
        .create_note(NewNote {
            nature_code: "449052",
            ..note_fixture("NC000003", "300.00")
        })
        .await?;

    let all = service.list_notes(None).await?;
    let numbers: Vec<&str> = all.iter().map(|n| n.number.as_str()).collect();
    assert_eq!(numbers, ["NC000003", "NC000002", "NC000001"]);

    let filtered = service.list_notes(Some("339030")).await?;
    let numbers: Vec<&str> = filtered.iter().map(|n| n.number.as_str()).collect();
    assert_eq!(numbers, ["NC000002", "NC000001"]);
    Ok(())
}

#[tokio::test]
async fn test_delete_note_requires_confirmation() -> Result<()> {
    let (service, _tmp) = test_service().await?;
    StandardRefData::create_basic(&service).await?;
    service.create_note(note_fixture("NC000001", "100.00")).await?;

    let err = service.delete_note("NC000001", false).await.unwrap_err();
    assert!(matches!(err, AppError::NotConfirmed(_)));

    // The note is still there.
    assert_eq!(service.list_notes(None).await?.len(), 1);

    service.delete_note("NC000001", true).await?;
    assert!(service.list_notes(None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_delete_note_cascades_to_its_commitments() -> Result<()> {
    let (service, _tmp) = test_service().await?;
    StandardRefData::create_basic(&service).await?;
    service.create_note(note_fixture("NC000001", "1000.00")).await?;

    let first = service
        .create_commitment("NC000001", "SALC", "100.00", "Printer paper")
        .await?;
    let second = service
        .create_commitment("NC000001", "SFPC", "200.00", "Desk chairs")
        .await?;

    service.delete_note("NC000001", true).await?;

    assert!(matches!(
        service.get_commitment(first.id).await.unwrap_err(),
        AppError::NotFound { entity: "commitment", .. }
    ));
    assert!(matches!(
        service.get_commitment(second.id).await.unwrap_err(),
        AppError::NotFound { entity: "commitment", .. }
    ));
    Ok(())
}

#[tokio::test]
async fn test_delete_missing_note_fails_with_not_found() -> Result<()> {
    let (service, _tmp) = test_service().await?;

    let err = service.delete_note("NC999999", true).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: "credit note", .. }));
    Ok(())
}
