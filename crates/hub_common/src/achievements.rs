//! Loading the achievement board for the signed-in user.

use crate::store::{fetch, DataStore, Query};
use hub_shared::achievements::{visible_achievements, AchievementSummary, SkillTree};
use hub_shared::model::tables;
use hub_shared::{Achievement, HubError, LevelPolicy, UserAchievementProgress};
use tracing::debug;

/// Catalog and progress for one user, with everything derived from them
#[derive(Debug, Clone, PartialEq)]
pub struct AchievementBoard {
    pub catalog: Vec<Achievement>,
    pub progress: Vec<UserAchievementProgress>,
    pub summary: AchievementSummary,
}

impl AchievementBoard {
    pub fn new(catalog: Vec<Achievement>, progress: Vec<UserAchievementProgress>, policy: &LevelPolicy) -> Self {
        let summary = AchievementSummary::compute(&catalog, &progress, policy);
        Self { catalog, progress, summary }
    }

    pub fn visible(&self) -> Vec<&Achievement> {
        visible_achievements(&self.catalog, &self.progress)
    }

    pub fn tree(&self) -> SkillTree {
        SkillTree::build(&self.catalog, &self.progress)
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}

pub async fn load_catalog<S: DataStore + ?Sized>(store: &S) -> Result<Vec<Achievement>, HubError> {
    fetch(store, &Query::from(tables::ACHIEVEMENTS).order("points", false)).await
}

pub async fn load_progress<S: DataStore + ?Sized>(
    store: &S,
    user_id: &str,
) -> Result<Vec<UserAchievementProgress>, HubError> {
    fetch(store, &Query::from(tables::USER_ACHIEVEMENTS).eq("user_id", user_id)).await
}

/// Without a user the catalog is shown with no progress
pub async fn load_board<S: DataStore + ?Sized>(
    store: &S,
    user_id: Option<&str>,
    policy: &LevelPolicy,
) -> Result<AchievementBoard, HubError> {
    let catalog = load_catalog(store).await?;
    let progress = match user_id {
        Some(user) => load_progress(store, user).await?,
        None => Vec::new(),
    };
    debug!(catalog = catalog.len(), progress = progress.len(), "achievement board");
    Ok(AchievementBoard::new(catalog, progress, policy))
}
