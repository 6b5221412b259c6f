//! KPI cycle services against the in-memory store.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use hub_common::config::WeekSource;
use hub_common::kpi::{edit_question, initialize_quarter, load_timeline, resolve_week, WeekOrigin};
use hub_common::memory::MemoryStore;
use hub_common::store::{DataStore, Filter, Query};
use hub_common::view::ViewState;
use hub_shared::model::{procedures, tables};
use hub_shared::quarter::{week_of_quarter, CurrentSlot};
use hub_shared::{HubError, KpiQuestionEdit, Quarter};
use serde_json::{json, Value};

fn feb_10() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 2, 10).unwrap().and_hms_opt(12, 0, 0).unwrap()
}

async fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    let q1 = Quarter::new(1, 2025).unwrap();
    assert_eq!(initialize_quarter(&store, "c1", q1).await.unwrap(), 13);
    store
}

#[tokio::test]
async fn test_remote_week_is_primary() {
    let store = MemoryStore::new();
    store.set_remote_week(json!(4));
    let week = resolve_week(&store, WeekSource::Remote, feb_10()).await;
    assert_eq!(week.week, 4);
    assert_eq!(week.origin, WeekOrigin::Remote);
}

#[tokio::test]
async fn test_remote_failure_falls_back_to_local() {
    let store = MemoryStore::new();
    store.fail_on(procedures::CURRENT_QUARTER_WEEK);
    let week = resolve_week(&store, WeekSource::Remote, feb_10()).await;
    assert_eq!(week.origin, WeekOrigin::Local);
    assert_eq!(week.week, week_of_quarter(feb_10()));
}

#[tokio::test]
async fn test_out_of_range_remote_week_falls_back() {
    let store = MemoryStore::new();
    for bad in [json!(0), json!(14), json!("soon"), json!(null)] {
        store.set_remote_week(bad);
        let week = resolve_week(&store, WeekSource::Remote, feb_10()).await;
        assert_eq!(week.origin, WeekOrigin::Local);
        assert!((1..=13).contains(&week.week));
    }
}

#[tokio::test]
async fn test_local_source_skips_remote() {
    let store = MemoryStore::new();
    store.set_remote_week(json!(2));
    let week = resolve_week(&store, WeekSource::Local, feb_10()).await;
    assert_eq!(week.origin, WeekOrigin::Local);
}

#[tokio::test]
async fn test_initialize_twice_creates_nothing_more() {
    let store = seeded().await;
    let again = initialize_quarter(&store, "c1", Quarter::new(1, 2025).unwrap()).await.unwrap();
    assert_eq!(again, 0);
    assert_eq!(store.rows(tables::KPI_QUESTIONS).len(), 13);

    let other = initialize_quarter(&store, "c2", Quarter::new(1, 2025).unwrap()).await.unwrap();
    assert_eq!(other, 13);
}

#[tokio::test]
async fn test_timeline_for_feb_10() {
    let store = seeded().await;
    store.set_remote_week(json!(6));
    let timeline = load_timeline(&store, WeekSource::Remote, Some("c1"), None, feb_10()).await.unwrap();

    assert_eq!(timeline.quarter().to_string(), "Q1 2025");
    assert_eq!(timeline.week.week, 6);
    match timeline.current() {
        CurrentSlot::Scheduled(q) => assert_eq!(q.week_number, Some(6)),
        other => panic!("expected week 6 question, got {:?}", other),
    }
    assert_eq!(timeline.next().unwrap().week_number, Some(7));
    assert!(timeline.slots().iter().all(|s| s.has_question()));
}

#[tokio::test]
async fn test_timeline_for_unseeded_quarter_gives_guidance() {
    let store = seeded().await;
    store.set_remote_week(json!(3));
    let q2 = Quarter::new(2, 2025).unwrap();
    let timeline = load_timeline(&store, WeekSource::Remote, Some("c1"), Some(q2), feb_10()).await.unwrap();
    assert!(timeline.schedule.questions().is_empty());
    assert_eq!(timeline.current().guidance().unwrap(), "No KPI question set for week 3. Configure a question for week 3.");
}

#[tokio::test]
async fn test_edit_question_text_and_active() {
    let store = seeded().await;
    let id = store.rows(tables::KPI_QUESTIONS)[0]["id"].as_str().unwrap().to_string();

    let edit = KpiQuestionEdit { question_text: Some("  How focused were you?  ".to_string()), active: Some(false) };
    let updated = edit_question(&store, &id, &edit).await.unwrap();
    assert_eq!(updated.question_text, "How focused were you?");
    assert!(!updated.is_active());
    assert_eq!(updated.week_number, Some(1));
}

#[tokio::test]
async fn test_edit_question_rejections() {
    let store = seeded().await;
    let empty = KpiQuestionEdit::default();
    assert!(matches!(edit_question(&store, "x", &empty).await, Err(HubError::Validation(_))));

    let blank = KpiQuestionEdit { question_text: Some("   ".to_string()), active: None };
    assert!(matches!(edit_question(&store, "x", &blank).await, Err(HubError::Validation(_))));

    let edit = KpiQuestionEdit { question_text: None, active: Some(true) };
    assert!(matches!(edit_question(&store, "missing", &edit).await, Err(HubError::NotFound(_))));
}

#[tokio::test]
async fn test_fetch_failure_keeps_previous_timeline() {
    let store = seeded().await;
    store.set_remote_week(json!(6));
    let mut view = ViewState::new();

    let first = load_timeline(&store, WeekSource::Remote, Some("c1"), None, feb_10()).await;
    assert!(view.apply("Load KPI cycle", first));

    store.fail_on(tables::KPI_QUESTIONS);
    let second = load_timeline(&store, WeekSource::Remote, Some("c1"), None, feb_10()).await;
    assert!(!view.apply("Load KPI cycle", second));

    let kept = view.data().unwrap();
    assert_eq!(kept.schedule.questions().len(), 13);
    assert!(view.notice().unwrap().detail.contains("kpi_questions"));
}

/// Store whose procedures answer with a fixed reply
struct FixedReply {
    inner: MemoryStore,
    reply: Value,
}

#[async_trait]
impl DataStore for FixedReply {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, HubError> {
        self.inner.select(query).await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, HubError> {
        self.inner.insert(table, rows).await
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<usize, HubError> {
        self.inner.update(table, filters, patch).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, HubError> {
        self.inner.delete(table, filters).await
    }

    async fn call(&self, _procedure: &str, _args: Value) -> Result<Value, HubError> {
        Ok(self.reply.clone())
    }
}

#[tokio::test]
async fn test_initialize_rejects_non_numeric_reply() {
    let q1 = Quarter::new(1, 2025).unwrap();
    let store = FixedReply { inner: MemoryStore::new(), reply: json!("done") };
    match initialize_quarter(&store, "c1", q1).await {
        Err(HubError::Procedure { procedure, .. }) => assert_eq!(procedure, procedures::INITIALIZE_KPI_QUESTIONS),
        other => panic!("unexpected result {:?}", other),
    }

    let store = FixedReply { inner: MemoryStore::new(), reply: json!(0) };
    assert_eq!(initialize_quarter(&store, "c1", q1).await.unwrap(), 0);
}
