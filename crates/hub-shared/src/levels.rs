//! Points-to-level mapping.
//!
//! A level policy is an ordered threshold table. Each tier covers points from
//! the previous tier's bound (inclusive) up to its own `below` bound
//! (exclusive); the last tier is open-ended.

use crate::error::HubError;
use serde::{Deserialize, Serialize};

/// Default tiers: (exclusive upper bound, name)
pub const DEFAULT_TIERS: &[(Option<u32>, &str)] = &[
    (Some(100), "Newcomer"),
    (Some(300), "Contributor"),
    (Some(600), "Performer"),
    (Some(1000), "Achiever"),
    (Some(1500), "Champion"),
    (None, "Legend"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTier {
    pub name: String,
    /// Exclusive upper bound; `None` only on the last tier
    #[serde(default)]
    pub below: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelStanding {
    /// 1-based tier position
    pub level: usize,
    pub tier: String,
    pub lower: u32,
    pub upper: Option<u32>,
    /// Points still needed to reach the next tier
    pub to_next: Option<u32>,
    /// Linear progress through the tier, 0..=100
    pub progress_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelPolicy {
    tiers: Vec<LevelTier>,
}

impl Default for LevelPolicy {
    fn default() -> Self {
        Self {
            tiers: DEFAULT_TIERS
                .iter()
                .map(|(below, name)| LevelTier { name: name.to_string(), below: *below })
                .collect(),
        }
    }
}

impl LevelPolicy {
    /// Tiers must be non-empty, strictly ascending, and only the last may be open
    pub fn new(tiers: Vec<LevelTier>) -> Result<Self, HubError> {
        if tiers.is_empty() {
            return Err(HubError::Config("level policy needs at least one tier".to_string()));
        }
        let last = tiers.len() - 1;
        let mut previous = 0u32;
        for (i, tier) in tiers.iter().enumerate() {
            match tier.below {
                None if i != last => {
                    return Err(HubError::Config(format!(
                        "tier '{}' has no bound but is not the last tier",
                        tier.name
                    )))
                }
                None => {}
                Some(bound) if bound <= previous => {
                    return Err(HubError::Config(format!(
                        "tier '{}' bound {} must be above {}",
                        tier.name, bound, previous
                    )))
                }
                Some(bound) => previous = bound,
            }
        }
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[LevelTier] {
        &self.tiers
    }

    pub fn standing(&self, points: u32) -> LevelStanding {
        let mut lower = 0u32;
        for (i, tier) in self.tiers.iter().enumerate() {
            match tier.below {
                Some(upper) if points < upper => {
                    let span = (upper - lower) as f64;
                    let pct = ((points.saturating_sub(lower)) as f64 / span * 100.0).clamp(0.0, 100.0);
                    return LevelStanding {
                        level: i + 1,
                        tier: tier.name.clone(),
                        lower,
                        upper: Some(upper),
                        to_next: Some(upper - points),
                        progress_pct: pct,
                    };
                }
                Some(upper) => lower = upper,
                None => break,
            }
        }

        // Open top tier, or points past a fully bounded table
        let level = self.tiers.len();
        let tier = self.tiers.last().map(|t| t.name.clone()).unwrap_or_default();
        LevelStanding { level, tier, lower, upper: None, to_next: None, progress_pct: 100.0 }
    }
}
