//! Requests, surveys, resources and roles against the local collaborators.

use chrono::{NaiveDate, TimeZone, Utc};
use hub_common::memory::{grant_role, MemoryStore, StaticAuth};
use hub_common::requests::{all_requests, my_requests, review_request, submit_request, RequestDraft};
use hub_common::resources::{download_resource, list_resources, remove_resource, upload_resource, RESOURCE_BUCKET};
use hub_common::store::{require_user, user_roles, AuthProvider};
use hub_common::surveys::{create_survey, delete_survey, kpi_surveys_by, set_survey_status, submit_kpi_surveys};
use hub_common::DirBlobStore;
use hub_shared::kpi_survey::{KpiSurveyDraft, SurveyValidation};
use hub_shared::model::tables;
use hub_shared::{AppRole, HubError, RequestStatus, RequestType, SurveyStatus};
use serde_json::json;

// ============================================================================
// Requests
// ============================================================================

#[tokio::test]
async fn test_request_submit_and_review() {
    let store = MemoryStore::new();
    let start = NaiveDate::from_ymd_opt(2025, 7, 1);
    let end = NaiveDate::from_ymd_opt(2025, 7, 5);
    let draft = RequestDraft::new(RequestType::Vacation, "Summer trip")
        .with_description("Family visit")
        .with_dates(start, end);

    let request = submit_request(&store, "u1", draft).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.start_date, start);

    submit_request(&store, "u2", RequestDraft::new(RequestType::Suggestion, "Standing desks")).await.unwrap();
    assert_eq!(my_requests(&store, "u1").await.unwrap().len(), 1);
    assert_eq!(all_requests(&store).await.unwrap().len(), 2);

    let now = Utc.with_ymd_and_hms(2025, 6, 20, 9, 0, 0).unwrap();
    let reviewed = review_request(&store, &request.id, "m1", RequestStatus::Approved, now).await.unwrap();
    assert_eq!(reviewed.reviewed_by.as_deref(), Some("m1"));
    assert_eq!(my_requests(&store, "u1").await.unwrap()[0].status, RequestStatus::Approved);

    let again = review_request(&store, &request.id, "m1", RequestStatus::Rejected, now).await;
    assert!(matches!(again, Err(HubError::Validation(_))));
}

#[tokio::test]
async fn test_invalid_request_not_written() {
    let store = MemoryStore::new();
    let result = submit_request(&store, "u1", RequestDraft::new(RequestType::Meeting, "")).await;
    assert!(matches!(result, Err(HubError::Validation(_))));
    assert!(store.rows(tables::EMPLOYEE_REQUESTS).is_empty());
}

// ============================================================================
// Surveys
// ============================================================================

#[tokio::test]
async fn test_kpi_batch_rejected_when_one_mood_missing() {
    let store = MemoryStore::new();
    let now = Utc.with_ymd_and_hms(2025, 2, 12, 9, 0, 0).unwrap();
    let drafts = vec![
        KpiSurveyDraft::new("e1", "Ana").with_mood(4),
        KpiSurveyDraft::new("e2", "Ben"),
    ];
    let result = submit_kpi_surveys(&store, "m1", &drafts, None, now).await;
    assert!(matches!(result, Err(HubError::Survey(SurveyValidation::MissingMood(ref name))) if name == "Ben"));
    assert!(store.rows(tables::EMPLOYEE_KPI_SURVEYS).is_empty());
}

#[tokio::test]
async fn test_kpi_batch_written() {
    let store = MemoryStore::new();
    let now = Utc.with_ymd_and_hms(2025, 2, 12, 9, 0, 0).unwrap();
    let drafts = vec![
        KpiSurveyDraft::new("e1", "Ana").with_mood(4).with_score(5),
        KpiSurveyDraft::new("e2", "Ben").with_mood(2).with_feedback("rough week"),
    ];
    let rows = submit_kpi_surveys(&store, "m1", &drafts, None, now).await.unwrap();
    assert_eq!(rows.len(), 2);

    let stored = kpi_surveys_by(&store, "m1").await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|s| s.week_start_date.to_string() == "2025-02-09"));
}

#[tokio::test]
async fn test_survey_lifecycle() {
    let store = MemoryStore::new();
    let survey = create_survey(&store, "c1", "Quarterly pulse", Some("  ")).await.unwrap();
    assert_eq!(survey.status, SurveyStatus::Draft);
    assert_eq!(survey.description, None);

    assert!(set_survey_status(&store, &survey.id, SurveyStatus::Closed).await.is_err());
    set_survey_status(&store, &survey.id, SurveyStatus::Active).await.unwrap();
    let closed = set_survey_status(&store, &survey.id, SurveyStatus::Closed).await.unwrap();
    assert_eq!(closed.status, SurveyStatus::Closed);

    delete_survey(&store, &survey.id).await.unwrap();
    assert!(matches!(delete_survey(&store, &survey.id).await, Err(HubError::NotFound(_))));
    assert!(create_survey(&store, "c1", "  ", None).await.is_err());
}

// ============================================================================
// Resources
// ============================================================================

#[tokio::test]
async fn test_resource_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = DirBlobStore::new(dir.path());
    let store = MemoryStore::new();
    let now = Utc.with_ymd_and_hms(2025, 4, 2, 8, 30, 0).unwrap();

    let resource = upload_resource(&store, &blobs, RESOURCE_BUCKET, "c1", "c1", "handbook.pdf", b"%PDF".to_vec(), now)
        .await
        .unwrap();
    assert_eq!(resource.file_type.as_deref(), Some("application/pdf"));
    assert_eq!(resource.file_size, Some(4));
    assert_eq!(list_resources(&store, Some("c1")).await.unwrap().len(), 1);

    let (meta, bytes) = download_resource(&store, &blobs, RESOURCE_BUCKET, &resource.id).await.unwrap();
    assert_eq!(meta.file_name, "handbook.pdf");
    assert_eq!(bytes, b"%PDF");

    remove_resource(&store, &blobs, RESOURCE_BUCKET, &resource.id).await.unwrap();
    assert!(list_resources(&store, None).await.unwrap().is_empty());
    assert!(!dir.path().join(RESOURCE_BUCKET).join(&resource.file_path).exists());
}

#[tokio::test]
async fn test_failed_insert_removes_uploaded_object() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = DirBlobStore::new(dir.path());
    let store = MemoryStore::new();
    store.fail_on(tables::COMPANY_RESOURCES);
    let now = Utc.with_ymd_and_hms(2025, 4, 2, 8, 30, 0).unwrap();

    let result = upload_resource(&store, &blobs, RESOURCE_BUCKET, "c1", "c1", "notes.txt", b"hi".to_vec(), now).await;
    assert!(result.is_err());
    let leftovers = std::fs::read_dir(dir.path().join(RESOURCE_BUCKET)).unwrap().count();
    assert_eq!(leftovers, 0);
}

// ============================================================================
// Session and roles
// ============================================================================

#[tokio::test]
async fn test_roles_and_session() {
    let store = MemoryStore::new();
    grant_role(&store, "u1", AppRole::Manager);
    grant_role(&store, "u1", AppRole::Employee);
    store.seed(tables::USER_ROLES, vec![json!({"user_id": "u1", "role": "janitor"})]);

    let roles = user_roles(&store, "u1").await.unwrap();
    assert_eq!(roles, vec![AppRole::Employee, AppRole::Manager]);
    assert!(user_roles(&store, "nobody").await.unwrap().is_empty());

    let auth = StaticAuth::signed_in("u1");
    assert_eq!(require_user(&auth).await.unwrap().id, "u1");
    auth.sign_out().await.unwrap();
    assert!(matches!(require_user(&auth).await, Err(HubError::NotAuthenticated)));
}
