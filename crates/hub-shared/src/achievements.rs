//! Achievement progression for the employee skill tree.
//!
//! Derives which achievements a user can see from prerequisite links and their
//! progress rows, lays the visible ones out on concentric rings, and totals the
//! points of everything unlocked. Everything here is recomputed from the
//! catalog and progress rows on each call; no cached counters are trusted.

use crate::levels::{LevelPolicy, LevelStanding};
use crate::model::{Achievement, UserAchievementProgress};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;

/// Per-achievement state on the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Unlocked by this user
    Unlocked,
    /// Shown locked: a starter node, or its prerequisite is unlocked
    Available,
    /// Deeper than one step past the unlocked frontier
    Hidden,
}

impl Visibility {
    pub fn is_visible(&self) -> bool {
        !matches!(self, Visibility::Hidden)
    }
}

/// Progress rows of one user keyed by achievement id
#[derive(Debug, Clone, Default)]
pub struct ProgressIndex<'a> {
    rows: HashMap<&'a str, &'a UserAchievementProgress>,
}

impl<'a> ProgressIndex<'a> {
    /// Rows are expected to belong to a single user. When an achievement has
    /// several rows, an unlocked one wins.
    pub fn new(progress: &'a [UserAchievementProgress]) -> Self {
        let mut rows: HashMap<&'a str, &'a UserAchievementProgress> = HashMap::new();
        for row in progress {
            let keep_existing = rows
                .get(row.achievement_id.as_str())
                .map(|existing| existing.is_unlocked() && !row.is_unlocked())
                .unwrap_or(false);
            if !keep_existing {
                rows.insert(row.achievement_id.as_str(), row);
            }
        }
        Self { rows }
    }

    pub fn get(&self, achievement_id: &str) -> Option<&'a UserAchievementProgress> {
        self.rows.get(achievement_id).copied()
    }

    pub fn is_unlocked(&self, achievement_id: &str) -> bool {
        self.get(achievement_id).map(|p| p.is_unlocked()).unwrap_or(false)
    }

    pub fn count(&self, achievement_id: &str) -> u32 {
        self.get(achievement_id).map(|p| p.count()).unwrap_or(0)
    }
}

/// Frontier rule: unlocked nodes, starter nodes, and direct children of an
/// unlocked node are visible. Siblings do not affect each other.
pub fn visibility(achievement: &Achievement, index: &ProgressIndex<'_>) -> Visibility {
    if index.is_unlocked(&achievement.id) {
        return Visibility::Unlocked;
    }
    match achievement.prerequisite_id.as_deref() {
        None => Visibility::Available,
        Some(parent) if index.is_unlocked(parent) => Visibility::Available,
        Some(_) => Visibility::Hidden,
    }
}

/// Visible achievements in catalog order
pub fn visible_achievements<'c>(
    catalog: &'c [Achievement],
    progress: &[UserAchievementProgress],
) -> Vec<&'c Achievement> {
    let index = ProgressIndex::new(progress);
    catalog
        .iter()
        .filter(|a| visibility(a, &index).is_visible())
        .collect()
}

/// Sum of points over catalog achievements this user has unlocked
pub fn total_points(catalog: &[Achievement], progress: &[UserAchievementProgress]) -> u32 {
    let index = ProgressIndex::new(progress);
    catalog
        .iter()
        .filter(|a| index.is_unlocked(&a.id))
        .map(|a| a.points)
        .sum()
}

pub fn unlocked_count(catalog: &[Achievement], progress: &[UserAchievementProgress]) -> usize {
    let index = ProgressIndex::new(progress);
    catalog.iter().filter(|a| index.is_unlocked(&a.id)).count()
}

/// Percentage of `required_count` reached, clamped to 0..=100
pub fn progress_percent(achievement: &Achievement, count: u32) -> f64 {
    let pct = count as f64 / achievement.required() as f64 * 100.0;
    pct.clamp(0.0, 100.0)
}

// ============================================================================
// Skill tree layout
// ============================================================================

pub const TREE_CENTER: (f64, f64) = (400.0, 500.0);
pub const NODES_PER_LAYER: usize = 6;
pub const LAYER_RADIUS: [f64; 5] = [0.0, 120.0, 200.0, 280.0, 360.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub layer: usize,
    pub visibility: Visibility,
    pub achievement: Achievement,
    pub progress: u32,
    pub progress_percent: f64,
    /// Prerequisite id when the node has one
    pub connections: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    /// Child unlocked
    Solid,
    Dashed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEdge {
    pub from: String,
    pub to: String,
    pub style: EdgeStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillTree {
    pub nodes: Vec<TreeNode>,
    pub edges: Vec<TreeEdge>,
}

impl SkillTree {
    /// Lay visible nodes out in rings of six around `TREE_CENTER`
    pub fn build(catalog: &[Achievement], progress: &[UserAchievementProgress]) -> Self {
        let index = ProgressIndex::new(progress);
        let visible: Vec<(&Achievement, Visibility)> = catalog
            .iter()
            .map(|a| (a, visibility(a, &index)))
            .filter(|(_, v)| v.is_visible())
            .collect();

        let total = visible.len();
        let nodes: Vec<TreeNode> = visible
            .into_iter()
            .enumerate()
            .map(|(i, (achievement, vis))| {
                let (x, y, layer) = ring_position(i, total);
                let count = index.count(&achievement.id);
                TreeNode {
                    id: achievement.id.clone(),
                    x,
                    y,
                    layer,
                    visibility: vis,
                    achievement: achievement.clone(),
                    progress: count,
                    progress_percent: progress_percent(achievement, count),
                    connections: achievement.prerequisite_id.iter().cloned().collect(),
                }
            })
            .collect();

        let edges = nodes
            .iter()
            .flat_map(|node| {
                node.connections
                    .iter()
                    .filter(|target| nodes.iter().any(|n| &n.id == *target))
                    .map(|target| TreeEdge {
                        from: node.id.clone(),
                        to: target.clone(),
                        style: if node.visibility == Visibility::Unlocked {
                            EdgeStyle::Solid
                        } else {
                            EdgeStyle::Dashed
                        },
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&TreeNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Position of the `index`-th of `total` visible nodes: (x, y, layer)
pub fn ring_position(index: usize, total: usize) -> (f64, f64, usize) {
    let layer = index / NODES_PER_LAYER + 1;
    let pos_in_layer = index % NODES_PER_LAYER;
    let slots = (NODES_PER_LAYER as f64).max(total as f64 / layer as f64);
    let angle = (2.0 * PI / slots) * pos_in_layer as f64 - PI / 2.0;
    let radius = LAYER_RADIUS[layer.min(LAYER_RADIUS.len() - 1)];
    (
        TREE_CENTER.0 + angle.cos() * radius,
        TREE_CENTER.1 + angle.sin() * radius,
        layer,
    )
}

// ============================================================================
// Summary
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementSummary {
    pub total_points: u32,
    pub unlocked: usize,
    pub catalog_size: usize,
    pub standing: LevelStanding,
}

impl AchievementSummary {
    pub fn compute(
        catalog: &[Achievement],
        progress: &[UserAchievementProgress],
        policy: &LevelPolicy,
    ) -> Self {
        let total_points = total_points(catalog, progress);
        Self {
            total_points,
            unlocked: unlocked_count(catalog, progress),
            catalog_size: catalog.len(),
            standing: policy.standing(total_points),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.catalog_size == 0
    }
}

/// ASCII badge for a category
pub fn category_badge(category: &str) -> &'static str {
    match category {
        "learning" => "[*]",
        "performance" => "<#>",
        "collaboration" => "{&}",
        "innovation" => "(!)",
        "leadership" => "^^^",
        "milestone" => "|o|",
        _ => "[?]",
    }
}

pub fn format_unlocked(catalog: &[Achievement], progress: &[UserAchievementProgress], max_display: usize) -> String {
    let index = ProgressIndex::new(progress);
    let unlocked: Vec<&Achievement> = catalog.iter().filter(|a| index.is_unlocked(&a.id)).collect();
    if unlocked.is_empty() {
        return String::new();
    }

    let badges: Vec<&str> = unlocked.iter().take(max_display).map(|a| category_badge(&a.category)).collect();
    if unlocked.len() > max_display {
        format!("{} +{} more", badges.join(" "), unlocked.len() - max_display)
    } else {
        badges.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ach(id: &str, points: u32, prereq: Option<&str>) -> Achievement {
        Achievement {
            id: id.to_string(),
            category: "learning".to_string(),
            title: id.to_uppercase(),
            description: None,
            icon: None,
            points,
            required_count: Some(4),
            prerequisite_id: prereq.map(str::to_string),
        }
    }

    fn row(id: &str, count: u32, unlocked: bool) -> UserAchievementProgress {
        UserAchievementProgress {
            user_id: "u1".to_string(),
            achievement_id: id.to_string(),
            progress: Some(count),
            unlocked: Some(unlocked),
            unlocked_at: None,
        }
    }

    #[test]
    fn test_unlocked_row_wins_over_duplicate() {
        let rows = vec![row("a", 4, true), row("a", 1, false)];
        let index = ProgressIndex::new(&rows);
        assert!(index.is_unlocked("a"));
    }

    #[test]
    fn test_grandchild_stays_hidden() {
        let catalog = vec![ach("a", 10, None), ach("b", 20, Some("a")), ach("c", 30, Some("b"))];
        let rows = vec![row("a", 4, true)];
        let index = ProgressIndex::new(&rows);
        assert_eq!(visibility(&catalog[0], &index), Visibility::Unlocked);
        assert_eq!(visibility(&catalog[1], &index), Visibility::Available);
        assert_eq!(visibility(&catalog[2], &index), Visibility::Hidden);
    }

    #[test]
    fn test_progress_percent_clamped() {
        let a = ach("a", 10, None);
        assert_eq!(progress_percent(&a, 2), 50.0);
        assert_eq!(progress_percent(&a, 9), 100.0);
    }

    #[test]
    fn test_first_node_sits_above_center() {
        let (x, y, layer) = ring_position(0, 3);
        assert_eq!(layer, 1);
        assert!((x - 400.0).abs() < 1e-9);
        assert!((y - 380.0).abs() < 1e-9);
    }

    #[test]
    fn test_outer_layers_share_last_radius() {
        let (_, _, layer) = ring_position(30, 31);
        assert_eq!(layer, 6);
        let (x, y, _) = ring_position(30, 31);
        let dist = ((x - TREE_CENTER.0).powi(2) + (y - TREE_CENTER.1).powi(2)).sqrt();
        assert!((dist - 360.0).abs() < 1e-6);
    }

    #[test]
    fn test_format_unlocked_truncates() {
        let catalog = vec![ach("a", 1, None), ach("b", 1, None), ach("c", 1, None)];
        let rows = vec![row("a", 4, true), row("b", 4, true), row("c", 4, true)];
        assert_eq!(format_unlocked(&catalog, &rows, 2), "[*] [*] +1 more");
        assert_eq!(format_unlocked(&catalog, &[], 2), "");
    }
}
