//! Rewards board, redemption and status changes against the in-memory store.

use chrono::{TimeZone, Utc};
use hub_common::achievements::load_board;
use hub_common::memory::MemoryStore;
use hub_common::rewards::{
    company_rewards, create_reward, delete_reward, load_redemptions, load_rewards, redeem, set_redemption_status,
    update_reward,
};
use hub_common::view::ViewState;
use hub_shared::model::tables;
use hub_shared::{HubError, LevelPolicy, RedemptionRejection, RedemptionStatus, RewardDraft};
use serde_json::json;

/// u1 has unlocked 30 + 20 points; a 10-point achievement is still locked
fn store_with_points() -> MemoryStore {
    let store = MemoryStore::new();
    store.seed(
        tables::ACHIEVEMENTS,
        vec![
            json!({"id": "a1", "category": "milestone", "title": "First week", "points": 30}),
            json!({"id": "a2", "category": "learning", "title": "Course done", "points": 20, "prerequisite_id": "a1"}),
            json!({"id": "a3", "category": "learning", "title": "Second course", "points": 10, "prerequisite_id": "a2"}),
        ],
    );
    store.seed(
        tables::USER_ACHIEVEMENTS,
        vec![
            json!({"user_id": "u1", "achievement_id": "a1", "progress": 1, "unlocked": true}),
            json!({"user_id": "u1", "achievement_id": "a2", "progress": 1, "unlocked": true}),
            json!({"user_id": "u2", "achievement_id": "a3", "progress": 1, "unlocked": true}),
        ],
    );
    store.seed(
        tables::REWARDS,
        vec![
            json!({"id": "mug", "company_id": "c1", "title": "Mug", "points_cost": 40, "active": true}),
            json!({"id": "day", "company_id": "c1", "title": "Day off", "points_cost": 60, "active": true}),
            json!({"id": "old", "company_id": "c1", "title": "Old perk", "points_cost": 5, "active": false}),
            json!({"id": "pen", "company_id": "c1", "title": "Pen", "points_cost": 5, "stock_quantity": 0}),
        ],
    );
    store
}

#[tokio::test]
async fn test_board_balance_and_listing() {
    let store = store_with_points();
    let board = load_rewards(&store, "u1").await.unwrap();
    assert_eq!(board.balance.earned, 50);
    assert_eq!(board.balance.available(), 50);

    let ids: Vec<&str> = board.rewards.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["pen", "mug", "day"]);
}

#[tokio::test]
async fn test_redeem_decreases_balance() {
    let store = store_with_points();
    let board = load_rewards(&store, "u1").await.unwrap();

    let (redemption, after) = redeem(&store, &board, "mug").await.unwrap();
    assert_eq!(redemption.status, RedemptionStatus::Pending);
    assert_eq!(redemption.points_spent, 40);
    assert_eq!(after.balance.available(), 10);
    assert_eq!(after.redemptions.len(), 1);
}

#[tokio::test]
async fn test_redeem_without_enough_points_writes_nothing() {
    let store = store_with_points();
    let board = load_rewards(&store, "u1").await.unwrap();

    let err = redeem(&store, &board, "day").await.unwrap_err();
    assert!(matches!(
        err,
        HubError::Redemption(RedemptionRejection::InsufficientPoints { cost: 60, available: 50 })
    ));
    assert!(store.rows(tables::REWARD_REDEMPTIONS).is_empty());
}

#[tokio::test]
async fn test_out_of_stock_and_unknown_rewards() {
    let store = store_with_points();
    let board = load_rewards(&store, "u1").await.unwrap();

    assert!(matches!(
        redeem(&store, &board, "pen").await,
        Err(HubError::Redemption(RedemptionRejection::OutOfStock(_)))
    ));
    assert!(matches!(
        redeem(&store, &board, "old").await,
        Err(HubError::Redemption(RedemptionRejection::Inactive(_)))
    ));
    assert!(matches!(redeem(&store, &board, "nope").await, Err(HubError::NotFound(_))));
    assert!(store.rows(tables::REWARD_REDEMPTIONS).is_empty());
}

#[tokio::test]
async fn test_redeem_rechecks_balance_with_stale_board() {
    let store = store_with_points();
    let stale = load_rewards(&store, "u1").await.unwrap();

    let (_, after) = redeem(&store, &stale, "mug").await.unwrap();
    assert_eq!(after.balance.available(), 10);

    let err = redeem(&store, &stale, "mug").await.unwrap_err();
    assert!(matches!(
        err,
        HubError::Redemption(RedemptionRejection::InsufficientPoints { cost: 40, available: 10 })
    ));
    assert_eq!(store.rows(tables::REWARD_REDEMPTIONS).len(), 1);
}

#[tokio::test]
async fn test_status_lifecycle() {
    let store = store_with_points();
    let board = load_rewards(&store, "u1").await.unwrap();
    let (redemption, _) = redeem(&store, &board, "mug").await.unwrap();
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();

    let err = set_redemption_status(&store, &redemption.id, RedemptionStatus::Delivered, now).await;
    assert!(matches!(err, Err(HubError::Validation(_))));

    let approved = set_redemption_status(&store, &redemption.id, RedemptionStatus::Approved, now).await.unwrap();
    assert_eq!(approved.delivered_at, None);
    let delivered = set_redemption_status(&store, &redemption.id, RedemptionStatus::Delivered, now).await.unwrap();
    assert_eq!(delivered.delivered_at, Some(now));

    let stored = load_redemptions(&store, Some("u1")).await.unwrap();
    assert_eq!(stored[0].status, RedemptionStatus::Delivered);
    assert_eq!(stored[0].delivered_at, Some(now));

    let err = set_redemption_status(&store, &redemption.id, RedemptionStatus::Cancelled, now).await;
    assert!(matches!(err, Err(HubError::Validation(_))));
}

#[tokio::test]
async fn test_cancelled_redemption_returns_points() {
    let store = store_with_points();
    let board = load_rewards(&store, "u1").await.unwrap();
    let (redemption, after) = redeem(&store, &board, "mug").await.unwrap();
    assert_eq!(after.balance.available(), 10);

    let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
    set_redemption_status(&store, &redemption.id, RedemptionStatus::Cancelled, now).await.unwrap();
    let board = load_rewards(&store, "u1").await.unwrap();
    assert_eq!(board.balance.available(), 50);
}

#[tokio::test]
async fn test_achievement_board() {
    let store = store_with_points();
    let board = load_board(&store, Some("u1"), &LevelPolicy::default()).await.unwrap();
    assert_eq!(board.summary.total_points, 50);
    assert_eq!(board.summary.unlocked, 2);
    assert_eq!(board.visible().len(), 3);
    assert_eq!(board.tree().edges.len(), 2);

    let anonymous = load_board(&store, None, &LevelPolicy::default()).await.unwrap();
    assert_eq!(anonymous.summary.total_points, 0);
    let visible: Vec<&str> = anonymous.visible().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(visible, vec!["a1"]);
}

#[tokio::test]
async fn test_failed_refresh_keeps_board() {
    let store = store_with_points();
    let mut view = ViewState::new();
    assert!(view.apply("Load rewards", load_rewards(&store, "u1").await));

    store.fail_on(tables::REWARD_REDEMPTIONS);
    assert!(!view.apply("Load rewards", load_rewards(&store, "u1").await));
    assert_eq!(view.data().unwrap().balance.available(), 50);
    assert!(view.notice().is_some());
}

#[tokio::test]
async fn test_company_reward_catalog() {
    let store = store_with_points();
    let mut draft = RewardDraft::new("Headphones", 45);
    draft.category = Some("gear".into());
    draft.stock_quantity = Some(3);

    let created = create_reward(&store, "c2", &draft).await.unwrap();
    assert_eq!(created.company_id, "c2");
    assert_eq!(created.stock_quantity, Some(3));
    assert!(created.is_active());

    draft.points_cost = 35;
    draft.stock_quantity = None;
    draft.active = false;
    let updated = update_reward(&store, &created.id, &draft).await.unwrap();
    assert_eq!(updated.points_cost, 35);
    assert_eq!(updated.stock_quantity, None);
    assert!(!updated.is_active());
    assert_eq!(updated.company_id, "c2");

    let listed = company_rewards(&store, "c2").await.unwrap();
    assert_eq!(listed.len(), 1);
    let board = load_rewards(&store, "u1").await.unwrap();
    assert!(board.rewards.iter().all(|r| r.id != created.id));

    let c1: Vec<String> = company_rewards(&store, "c1").await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(c1.len(), 4);
    assert!(c1.contains(&"old".to_string()));

    delete_reward(&store, &created.id).await.unwrap();
    assert!(company_rewards(&store, "c2").await.unwrap().is_empty());
    assert!(matches!(delete_reward(&store, &created.id).await, Err(HubError::NotFound(_))));
}

#[tokio::test]
async fn test_reward_edits_are_validated() {
    let store = store_with_points();
    let before = store.rows(tables::REWARDS).len();

    let blank = RewardDraft::new(" ", 10);
    assert!(matches!(create_reward(&store, "c1", &blank).await, Err(HubError::Validation(_))));
    let free = RewardDraft::new("Sticker", 0);
    assert!(matches!(create_reward(&store, "c1", &free).await, Err(HubError::Validation(_))));
    assert!(matches!(update_reward(&store, "mug", &free).await, Err(HubError::Validation(_))));
    assert_eq!(store.rows(tables::REWARDS).len(), before);

    let missing = RewardDraft::new("Sticker", 2);
    assert!(matches!(update_reward(&store, "nope", &missing).await, Err(HubError::NotFound(_))));
}
