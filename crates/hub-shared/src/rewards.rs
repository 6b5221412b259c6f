//! Point balance and redemption rules.
//!
//! The spendable balance is never stored. It is derived from the achievement
//! catalog, the user's progress rows and their redemption history every time
//! it is needed.

use crate::achievements::total_points;
use crate::error::HubError;
use crate::model::{Achievement, RedemptionStatus, Reward, RewardRedemption, UserAchievementProgress};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointBalance {
    /// Points of unlocked achievements
    pub earned: u32,
    /// Points held by non-cancelled redemptions
    pub spent: u32,
}

impl PointBalance {
    pub fn derive(
        catalog: &[Achievement],
        progress: &[UserAchievementProgress],
        redemptions: &[RewardRedemption],
    ) -> Self {
        Self {
            earned: total_points(catalog, progress),
            spent: spent_points(redemptions),
        }
    }

    /// Negative when history spent more than is currently earned
    pub fn available(&self) -> i64 {
        self.earned as i64 - self.spent as i64
    }

    pub fn can_afford(&self, cost: u32) -> bool {
        cost as i64 <= self.available()
    }

    pub fn after_spending(&self, cost: u32) -> Self {
        Self { earned: self.earned, spent: self.spent.saturating_add(cost) }
    }
}

pub fn spent_points(redemptions: &[RewardRedemption]) -> u32 {
    redemptions
        .iter()
        .filter(|r| r.status.consumes_points())
        .map(|r| r.points_spent)
        .sum()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedemptionRejection {
    #[error("Not enough points: {cost} needed, {available} available")]
    InsufficientPoints { cost: u32, available: i64 },

    #[error("Reward '{0}' is no longer offered")]
    Inactive(String),

    #[error("Reward '{0}' is out of stock")]
    OutOfStock(String),
}

/// Row to insert for an accepted redemption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionDraft {
    pub user_id: String,
    pub reward_id: String,
    pub points_spent: u32,
    pub status: RedemptionStatus,
}

/// Validate a redemption before anything is written
pub fn check_redemption(
    user_id: &str,
    balance: &PointBalance,
    reward: &Reward,
) -> Result<(RedemptionDraft, PointBalance), RedemptionRejection> {
    if !reward.is_active() {
        return Err(RedemptionRejection::Inactive(reward.title.clone()));
    }
    if !reward.in_stock() {
        return Err(RedemptionRejection::OutOfStock(reward.title.clone()));
    }
    if !balance.can_afford(reward.points_cost) {
        return Err(RedemptionRejection::InsufficientPoints {
            cost: reward.points_cost,
            available: balance.available(),
        });
    }

    let draft = RedemptionDraft {
        user_id: user_id.to_string(),
        reward_id: reward.id.clone(),
        points_spent: reward.points_cost,
        status: RedemptionStatus::Pending,
    };
    Ok((draft, balance.after_spending(reward.points_cost)))
}

/// Editable fields of a company reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub points_cost: u32,
    /// None means unlimited
    pub stock_quantity: Option<u32>,
    pub active: bool,
}

impl RewardDraft {
    pub fn new(title: impl Into<String>, points_cost: u32) -> Self {
        Self {
            title: title.into(),
            description: None,
            category: None,
            points_cost,
            stock_quantity: None,
            active: true,
        }
    }

    /// Title and a non-zero cost are required before saving
    pub fn validate(&self) -> Result<(), HubError> {
        if self.title.trim().is_empty() {
            return Err(HubError::Validation("reward title is required".into()));
        }
        if self.points_cost == 0 {
            return Err(HubError::Validation(format!("reward '{}' needs a points cost", self.title.trim())));
        }
        Ok(())
    }
}
