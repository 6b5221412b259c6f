//! Terminal rendering for hubctl output.
//!
//! Every renderer returns a `String` so output can be tested without a
//! terminal. Color is applied only when `use_color` is set.

use hub_common::achievements::AchievementBoard;
use hub_common::dashboard::CompanyDashboard;
use hub_common::kpi::{KpiTimeline, WeekOrigin};
use hub_common::rewards::RewardsBoard;
use hub_common::view::{Notice, NoticeKind};
use hub_shared::achievements::{category_badge, format_unlocked, EdgeStyle, ProgressIndex, Visibility};
use hub_shared::dashboard::ScoreBand;
use hub_shared::navigation::{MicroApp, NavItem};
use hub_shared::quarter::{CurrentSlot, SlotState};
use hub_shared::{
    CompanyResource, EmployeePerformance, EmployeeRequest, LevelStanding, RedemptionStatus, RequestStatus, Reward,
};
use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// Honors NO_COLOR and only colors a terminal
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stdout().is_terminal()
}

pub fn section(title: &str, use_color: bool) -> String {
    let label = format!("[{}]", title.to_uppercase());
    if use_color {
        label.bold().to_string()
    } else {
        label
    }
}

/// `[=====-----]` for a 0..=100 percentage
pub fn progress_bar(progress: usize, width: usize) -> String {
    let filled = (progress.min(100) * width) / 100;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "=".repeat(filled), "-".repeat(empty))
}

pub fn progress_bar_with_text(progress: usize, width: usize) -> String {
    format!("{} {}%", progress_bar(progress, width), progress.min(100))
}

pub fn notice(notice: &Notice, use_color: bool) -> String {
    let line = format!("{}: {}", notice.title, notice.detail);
    match (notice.kind, use_color) {
        (NoticeKind::Success, true) => line.green().to_string(),
        (NoticeKind::Error, true) => line.red().to_string(),
        _ => line,
    }
}

// ============================================================================
// KPI
// ============================================================================

pub fn week_line(week: u8, origin: WeekOrigin, quarter: &str) -> String {
    let source = match origin {
        WeekOrigin::Remote => "store",
        WeekOrigin::Local => "local clock",
    };
    format!("Week {} of 13 in {} (from {})", week, quarter, source)
}

pub fn timeline(timeline: &KpiTimeline, use_color: bool) -> String {
    let mut out = String::new();
    out.push_str(&section(&format!("KPI cycle {}", timeline.quarter()), use_color));
    out.push('\n');
    out.push_str(&week_line(timeline.week.week, timeline.week.origin, &timeline.quarter().to_string()));
    out.push_str("\n\n");

    match timeline.current() {
        CurrentSlot::Scheduled(q) => {
            out.push_str(&format!("  Current: {}\n", q.question_text));
        }
        slot @ CurrentSlot::Unconfigured { .. } => {
            let guidance = slot.guidance().unwrap_or_default();
            let guidance = if use_color { guidance.yellow().to_string() } else { guidance };
            out.push_str(&format!("  {}\n", guidance));
        }
    }
    if let Some(next) = timeline.next() {
        out.push_str(&format!("  Next:    {}\n", next.question_text));
    }
    out.push('\n');

    for slot in timeline.slots() {
        let marker = match slot.state {
            SlotState::Past => "x",
            SlotState::Current => ">",
            SlotState::Upcoming => " ",
        };
        let text = slot
            .question_id
            .as_deref()
            .and_then(|id| timeline.schedule.questions().iter().find(|q| q.id == id))
            .map(|q| q.question_text.as_str())
            .unwrap_or("(not configured)");
        let line = format!("  {} W{:02}  {}", marker, slot.week, text);
        if use_color && slot.state == SlotState::Current {
            out.push_str(&line.bold().to_string());
        } else if use_color && !slot.has_question() {
            out.push_str(&line.dimmed().to_string());
        } else {
            out.push_str(&line);
        }
        out.push('\n');
    }
    out
}

// ============================================================================
// Achievements
// ============================================================================

pub fn standing(standing: &LevelStanding, points: u32) -> String {
    let mut line = format!(
        "Level {} {} ({} pts) {}",
        standing.level,
        standing.tier,
        points,
        progress_bar_with_text(standing.progress_pct.round() as usize, 20)
    );
    if let Some(to_next) = standing.to_next {
        line.push_str(&format!(", {} to next", to_next));
    }
    line
}

pub fn achievements(board: &AchievementBoard, use_color: bool) -> String {
    if board.is_empty() {
        return "No achievements yet. Check back soon!\n".to_string();
    }
    let mut out = String::new();
    out.push_str(&section("Achievements", use_color));
    out.push('\n');
    out.push_str(&standing(&board.summary.standing, board.summary.total_points));
    out.push_str(&format!("\n{} of {} unlocked", board.summary.unlocked, board.summary.catalog_size));
    let badges = format_unlocked(&board.catalog, &board.progress, 8);
    if !badges.is_empty() {
        out.push_str(&format!("  {}", badges));
    }
    out.push_str("\n\n");

    let index = ProgressIndex::new(&board.progress);
    for achievement in board.visible() {
        let unlocked = index.is_unlocked(&achievement.id);
        let state = if unlocked {
            "unlocked".to_string()
        } else {
            let count = index.count(&achievement.id);
            format!("{}/{}", count.min(achievement.required()), achievement.required())
        };
        let line = format!(
            "  {} {:<32} {:>4} pts  {}",
            category_badge(&achievement.category),
            achievement.title,
            achievement.points,
            state
        );
        if use_color && unlocked {
            out.push_str(&line.green().to_string());
        } else {
            out.push_str(&line);
        }
        out.push('\n');
    }
    out
}

pub fn skill_tree(board: &AchievementBoard, use_color: bool) -> String {
    let tree = board.tree();
    if tree.is_empty() {
        return "No achievements yet. Check back soon!\n".to_string();
    }
    let mut out = String::new();
    out.push_str(&section("Skill tree", use_color));
    out.push('\n');
    for node in &tree.nodes {
        let status = match node.visibility {
            Visibility::Unlocked => "*",
            Visibility::Available => "o",
            Visibility::Hidden => "?",
        };
        out.push_str(&format!(
            "  {} L{} ({:>6.1}, {:>6.1}) {:<28} {}\n",
            status,
            node.layer,
            node.x,
            node.y,
            node.achievement.title,
            progress_bar_with_text(node.progress_percent.round() as usize, 10)
        ));
    }
    if !tree.edges.is_empty() {
        out.push('\n');
        for edge in &tree.edges {
            let link = match edge.style {
                EdgeStyle::Solid => "===",
                EdgeStyle::Dashed => "- -",
            };
            out.push_str(&format!("  {} {} {}\n", edge.to, link, edge.from));
        }
    }
    out
}

// ============================================================================
// Rewards
// ============================================================================

fn redemption_status(status: RedemptionStatus, use_color: bool) -> String {
    let text = status.as_str();
    if !use_color {
        return text.to_string();
    }
    match status {
        RedemptionStatus::Pending => text.yellow().to_string(),
        RedemptionStatus::Approved => text.blue().to_string(),
        RedemptionStatus::Delivered => text.green().to_string(),
        RedemptionStatus::Cancelled => text.red().to_string(),
    }
}

pub fn rewards(board: &RewardsBoard, use_color: bool) -> String {
    let mut out = String::new();
    out.push_str(&section("Rewards", use_color));
    out.push_str(&format!("\nAvailable points: {}\n\n", board.balance.available()));

    if board.rewards.is_empty() {
        out.push_str("No rewards available yet. Check back soon!\n");
    }
    for reward in &board.rewards {
        let mark = if !reward.in_stock() {
            "sold out"
        } else if board.can_afford(reward) {
            "can redeem"
        } else {
            "need more points"
        };
        out.push_str(&format!(
            "  {:<12} {:<28} {:>5} pts  {}\n",
            reward.id, reward.title, reward.points_cost, mark
        ));
    }

    if !board.redemptions.is_empty() {
        out.push('\n');
        out.push_str(&section("My redemptions", use_color));
        out.push('\n');
        for r in &board.redemptions {
            out.push_str(&format!(
                "  {:<36} {:<12} {:>5} pts  {}\n",
                r.id,
                r.reward_id,
                r.points_spent,
                redemption_status(r.status, use_color)
            ));
        }
    }
    out
}

/// Company view of the catalog, hidden rewards included
pub fn catalog(rewards: &[Reward], use_color: bool) -> String {
    if rewards.is_empty() {
        return "No rewards yet. Add one with reward-new.\n".to_string();
    }
    let mut out = String::new();
    out.push_str(&section("Reward catalog", use_color));
    out.push('\n');
    for reward in rewards {
        let stock = reward.stock_quantity.map(|q| q.to_string()).unwrap_or_else(|| "unlimited".to_string());
        let state = if reward.is_active() { "active" } else { "hidden" };
        out.push_str(&format!(
            "  {:<36} {:<28} {:>5} pts  stock {:<9} {}\n",
            reward.id, reward.title, reward.points_cost, stock, state
        ));
    }
    out
}

// ============================================================================
// Dashboard
// ============================================================================

fn score(avg: Option<f64>, use_color: bool) -> String {
    let Some(value) = avg else {
        return "-".to_string();
    };
    let text = format!("{:.1}", value);
    if !use_color {
        return text;
    }
    match ScoreBand::of(value) {
        ScoreBand::High => text.green().to_string(),
        ScoreBand::Medium => text.yellow().to_string(),
        ScoreBand::Low => text.red().to_string(),
    }
}

fn performance_rows(out: &mut String, rows: &[EmployeePerformance], empty: &str, use_color: bool) {
    if rows.is_empty() {
        out.push_str(&format!("  {}\n", empty));
    }
    for p in rows {
        out.push_str(&format!(
            "  {:<36} {:>5}  {} responses\n",
            p.user_id,
            score(p.avg_score, use_color),
            p.response_count
        ));
    }
}

pub fn dashboard(board: &CompanyDashboard, use_color: bool) -> String {
    let mut out = String::new();
    out.push_str(&section("Recent responses", use_color));
    out.push('\n');
    if board.recent.is_empty() {
        out.push_str("  No survey responses yet.\n");
    }
    for r in &board.recent {
        let when = r.submitted_at.map(|t| t.format("%Y-%m-%d").to_string()).unwrap_or_default();
        let answer = r.response_text.as_deref().unwrap_or("");
        out.push_str(&format!(
            "  {:<10} {:<36} {:>5}  {}\n",
            when,
            r.user_id,
            score(r.score(), use_color),
            answer
        ));
    }

    out.push('\n');
    out.push_str(&section("Top performers", use_color));
    out.push('\n');
    performance_rows(&mut out, &board.top, "No scores of 4 or more yet.", use_color);

    out.push('\n');
    out.push_str(&section("Needs attention", use_color));
    out.push('\n');
    performance_rows(&mut out, &board.attention, "Nobody below 3.", use_color);
    out
}

// ============================================================================
// Requests and resources
// ============================================================================

fn request_status(status: RequestStatus, use_color: bool) -> String {
    let text = status.as_str();
    if !use_color {
        return text.to_string();
    }
    match status {
        RequestStatus::Pending => text.yellow().to_string(),
        RequestStatus::Approved => text.green().to_string(),
        RequestStatus::Rejected => text.red().to_string(),
    }
}

pub fn requests(requests: &[EmployeeRequest], use_color: bool) -> String {
    if requests.is_empty() {
        return "No requests yet.\n".to_string();
    }
    let mut out = String::new();
    for r in requests {
        let dates = match (r.start_date, r.end_date) {
            (Some(start), Some(end)) => format!(" {} to {}", start, end),
            (Some(start), None) => format!(" from {}", start),
            _ => String::new(),
        };
        out.push_str(&format!(
            "  {:<36} {:<18} {}{}  {}\n",
            r.id,
            r.request_type.label(),
            r.title,
            dates,
            request_status(r.status, use_color)
        ));
    }
    out
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

pub fn resources(resources: &[CompanyResource]) -> String {
    if resources.is_empty() {
        return "No resources uploaded yet.\n".to_string();
    }
    resources
        .iter()
        .map(|r| {
            format!(
                "  {:<36} {:<32} {:>10}  {}\n",
                r.id,
                r.file_name,
                r.file_size.map(human_size).unwrap_or_else(|| "-".to_string()),
                r.file_type.as_deref().unwrap_or("")
            )
        })
        .collect()
}

// ============================================================================
// Navigation
// ============================================================================

pub fn navigation(role: &str, items: &[NavItem], apps: &[&MicroApp], use_color: bool) -> String {
    let mut out = String::new();
    out.push_str(&section(&format!("{} portal", role), use_color));
    out.push('\n');
    for item in items {
        out.push_str(&format!("  {:<14} {}\n", item.id, item.label));
    }
    if !apps.is_empty() {
        out.push('\n');
        out.push_str(&section("Apps", use_color));
        out.push('\n');
        for app in apps {
            out.push_str(&format!("  {:<20} {}\n", app.title, app.description));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 10), "[----------]");
        assert_eq!(progress_bar(50, 10), "[=====-----]");
        assert_eq!(progress_bar(100, 10), "[==========]");
        assert_eq!(progress_bar(250, 4), "[====]");
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_dashboard_lists() {
        let board = CompanyDashboard {
            recent: Vec::new(),
            top: vec![EmployeePerformance { user_id: "ana".into(), avg_score: Some(4.5), response_count: 2 }],
            attention: Vec::new(),
            employees: 1,
        };
        let out = dashboard(&board, false);
        assert!(out.contains("[TOP PERFORMERS]"));
        assert!(out.contains("4.5  2 responses"));
        assert!(out.contains("Nobody below 3."));
    }

    #[test]
    fn test_section_plain() {
        assert_eq!(section("Rewards", false), "[REWARDS]");
    }
}
