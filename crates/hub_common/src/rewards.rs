//! Reward catalog, redemptions and the derived point balance.

use crate::achievements::{load_catalog, load_progress};
use crate::store::{fetch, fetch_one, insert_one, DataStore, Filter, Query};
use chrono::{DateTime, Utc};
use hub_shared::model::tables;
use hub_shared::rewards::{check_redemption, RewardDraft};
use hub_shared::{HubError, PointBalance, RedemptionStatus, Reward, RewardRedemption};
use serde_json::json;
use tracing::{debug, info, warn};

/// Everything the rewards screen shows for one user
#[derive(Debug, Clone, PartialEq)]
pub struct RewardsBoard {
    pub user_id: String,
    pub rewards: Vec<Reward>,
    pub redemptions: Vec<RewardRedemption>,
    pub balance: PointBalance,
}

impl RewardsBoard {
    pub fn can_afford(&self, reward: &Reward) -> bool {
        self.balance.can_afford(reward.points_cost)
    }
}

/// Rewards not switched off, cheapest first
pub async fn active_rewards<S: DataStore + ?Sized>(store: &S) -> Result<Vec<Reward>, HubError> {
    fetch(store, &Query::from(tables::REWARDS).neq("active", false).order("points_cost", true)).await
}

pub async fn load_redemptions<S: DataStore + ?Sized>(
    store: &S,
    user_id: Option<&str>,
) -> Result<Vec<RewardRedemption>, HubError> {
    let mut query = Query::from(tables::REWARD_REDEMPTIONS).order("created_at", false);
    if let Some(user) = user_id {
        query = query.eq("user_id", user);
    }
    fetch(store, &query).await
}

/// Balance is recomputed from achievements and redemption history on every load
pub async fn load_rewards<S: DataStore + ?Sized>(store: &S, user_id: &str) -> Result<RewardsBoard, HubError> {
    let rewards = active_rewards(store).await?;
    let redemptions = load_redemptions(store, Some(user_id)).await?;
    let catalog = load_catalog(store).await?;
    let progress = load_progress(store, user_id).await?;
    let balance = PointBalance::derive(&catalog, &progress, &redemptions);
    debug!(user_id, available = balance.available(), "rewards board");
    Ok(RewardsBoard { user_id: user_id.to_string(), rewards, redemptions, balance })
}

/// Check against a freshly loaded balance, write a pending redemption, then reload.
///
/// The passed board only names the user; its balance may be stale.
pub async fn redeem<S: DataStore + ?Sized>(
    store: &S,
    board: &RewardsBoard,
    reward_id: &str,
) -> Result<(RewardRedemption, RewardsBoard), HubError> {
    let current = load_rewards(store, &board.user_id).await?;
    let reward: Reward = fetch_one(store, Query::from(tables::REWARDS).eq("id", reward_id))
        .await?
        .ok_or_else(|| HubError::NotFound(format!("reward {}", reward_id)))?;

    let (draft, _) = check_redemption(&current.user_id, &current.balance, &reward).map_err(|e| {
        warn!("redemption of {} by {} rejected: {}", reward_id, current.user_id, e);
        HubError::from(e)
    })?;

    let redemption: RewardRedemption = insert_one(store, tables::REWARD_REDEMPTIONS, &draft).await?;
    info!(
        "{} redeemed {} for {} points",
        current.user_id, reward.title, redemption.points_spent
    );
    let refreshed = load_rewards(store, &current.user_id).await?;
    Ok((redemption, refreshed))
}

/// Company-side status change; delivery is timestamped
pub async fn set_redemption_status<S: DataStore + ?Sized>(
    store: &S,
    redemption_id: &str,
    status: RedemptionStatus,
    now: DateTime<Utc>,
) -> Result<RewardRedemption, HubError> {
    let mut redemption: RewardRedemption =
        fetch_one(store, Query::from(tables::REWARD_REDEMPTIONS).eq("id", redemption_id))
            .await?
            .ok_or_else(|| HubError::NotFound(format!("redemption {}", redemption_id)))?;

    if !redemption.status.can_transition_to(status) {
        warn!("redemption {} cannot move from {} to {}", redemption_id, redemption.status, status);
        return Err(HubError::Validation(format!(
            "redemption cannot move from {} to {}",
            redemption.status, status
        )));
    }

    let delivered_at = (status == RedemptionStatus::Delivered).then_some(now);
    let patch = json!({ "status": status, "delivered_at": delivered_at });
    store
        .update(tables::REWARD_REDEMPTIONS, &[Filter::eq("id", redemption_id)], patch)
        .await?;
    info!("redemption {} is now {}", redemption_id, status);

    redemption.status = status;
    redemption.delivered_at = delivered_at;
    Ok(redemption)
}

// ============================================================================
// Company catalog
// ============================================================================

/// Every reward of a company, switched-off ones included, newest first
pub async fn company_rewards<S: DataStore + ?Sized>(store: &S, company_id: &str) -> Result<Vec<Reward>, HubError> {
    let rewards: Vec<Reward> = fetch(
        store,
        &Query::from(tables::REWARDS).eq("company_id", company_id).order("created_at", false),
    )
    .await?;
    debug!(company_id, count = rewards.len(), "company rewards");
    Ok(rewards)
}

pub async fn create_reward<S: DataStore + ?Sized>(
    store: &S,
    company_id: &str,
    draft: &RewardDraft,
) -> Result<Reward, HubError> {
    draft.validate()?;
    let row = reward_row(draft, Some(company_id));
    let reward: Reward = insert_one(store, tables::REWARDS, &row).await?;
    info!("{} added reward {} for {} points", company_id, reward.title, reward.points_cost);
    Ok(reward)
}

/// Replaces every editable field of the reward
pub async fn update_reward<S: DataStore + ?Sized>(
    store: &S,
    reward_id: &str,
    draft: &RewardDraft,
) -> Result<Reward, HubError> {
    draft.validate()?;
    let updated = store
        .update(tables::REWARDS, &[Filter::eq("id", reward_id)], reward_row(draft, None))
        .await?;
    if updated == 0 {
        return Err(HubError::NotFound(format!("reward {}", reward_id)));
    }
    info!("reward {} updated", reward_id);

    fetch_one(store, Query::from(tables::REWARDS).eq("id", reward_id))
        .await?
        .ok_or_else(|| HubError::NotFound(format!("reward {}", reward_id)))
}

pub async fn delete_reward<S: DataStore + ?Sized>(store: &S, reward_id: &str) -> Result<(), HubError> {
    let removed = store.delete(tables::REWARDS, &[Filter::eq("id", reward_id)]).await?;
    if removed == 0 {
        return Err(HubError::NotFound(format!("reward {}", reward_id)));
    }
    info!("reward {} deleted", reward_id);
    Ok(())
}

fn reward_row(draft: &RewardDraft, company_id: Option<&str>) -> serde_json::Value {
    let mut row = json!({
        "title": draft.title.trim(),
        "description": draft.description,
        "category": draft.category,
        "points_cost": draft.points_cost,
        "stock_quantity": draft.stock_quantity,
        "active": draft.active,
    });
    if let (Some(company), Some(object)) = (company_id, row.as_object_mut()) {
        object.insert("company_id".to_string(), json!(company));
    }
    row
}
