//! Survey answers and the company dashboard built from them.

use chrono::{TimeZone, Utc};
use hub_common::dashboard::load_dashboard;
use hub_common::memory::MemoryStore;
use hub_common::surveys::{create_survey, set_survey_status, submit_survey_response};
use hub_shared::model::tables;
use hub_shared::{HubError, SurveyStatus};
use serde_json::{json, Value};

fn answer(id: &str, user: &str, value: Value, day: u32) -> Value {
    json!({
        "id": id,
        "survey_id": "s1",
        "question_id": "q1",
        "user_id": user,
        "response_value": value,
        "submitted_at": format!("2025-03-{:02}T09:00:00Z", day),
    })
}

#[tokio::test]
async fn test_dashboard_scores_and_recent() {
    let store = MemoryStore::new();
    store.seed(
        tables::SURVEY_RESPONSES,
        vec![
            answer("r1", "ana", json!(5), 1),
            answer("r2", "ana", json!(4), 2),
            answer("r3", "ana", Value::Null, 3),
            answer("r4", "ben", json!(2), 4),
            answer("r5", "ben", json!(0), 5),
            answer("r6", "cai", json!(3), 6),
            answer("r7", "dee", Value::Null, 7),
        ],
    );

    let dashboard = load_dashboard(&store).await.unwrap();
    let recent: Vec<&str> = dashboard.recent.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(recent, vec!["r7", "r6", "r5", "r4", "r3"]);
    assert_eq!(dashboard.employees, 4);

    assert_eq!(dashboard.top.len(), 1);
    assert_eq!(dashboard.top[0].user_id, "ana");
    assert_eq!(dashboard.top[0].avg_score, Some(4.5));
    assert_eq!(dashboard.top[0].response_count, 2);

    assert_eq!(dashboard.attention.len(), 1);
    assert_eq!(dashboard.attention[0].user_id, "ben");
    assert_eq!(dashboard.attention[0].avg_score, Some(2.0));
    assert_eq!(dashboard.attention[0].response_count, 1);
}

#[tokio::test]
async fn test_empty_dashboard() {
    let store = MemoryStore::new();
    let dashboard = load_dashboard(&store).await.unwrap();
    assert!(dashboard.is_empty());
    assert!(dashboard.recent.is_empty());

    store.fail_on(tables::SURVEY_RESPONSES);
    assert!(load_dashboard(&store).await.unwrap_err().is_transient());
}

#[tokio::test]
async fn test_responses_only_for_active_surveys() {
    let store = MemoryStore::new();
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
    let survey = create_survey(&store, "c1", "Team mood", None).await.unwrap();

    let err = submit_survey_response(&store, "u1", &survey.id, "q1", Some(4.0), None, now).await;
    assert!(matches!(err, Err(HubError::Validation(_))));

    set_survey_status(&store, &survey.id, SurveyStatus::Active).await.unwrap();
    let empty = submit_survey_response(&store, "u1", &survey.id, "q1", None, Some("  "), now).await;
    assert!(matches!(empty, Err(HubError::Validation(_))));
    let missing = submit_survey_response(&store, "u1", "nope", "q1", Some(4.0), None, now).await;
    assert!(matches!(missing, Err(HubError::NotFound(_))));

    let response = submit_survey_response(&store, "u1", &survey.id, "q1", Some(4.0), Some("good"), now)
        .await
        .unwrap();
    assert_eq!(response.submitted_at, Some(now));
    assert_eq!(response.response_text.as_deref(), Some("good"));

    let dashboard = load_dashboard(&store).await.unwrap();
    assert_eq!(dashboard.recent.len(), 1);
    assert_eq!(dashboard.top[0].user_id, "u1");
}
