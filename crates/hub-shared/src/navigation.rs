//! Role-scoped navigation: sidebar items per portal and the micro-app cards
//! shown on the dashboard.

use crate::model::AppRole;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MicroApp {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub roles: &'static [AppRole],
}

const fn nav(id: &'static str, label: &'static str) -> NavItem {
    NavItem { id, label }
}

pub const ADMIN_NAV: &[NavItem] = &[
    nav("users", "Users List"),
    nav("create-user", "Create User"),
    nav("managers", "Manager List"),
    nav("companies", "Company List"),
    nav("surveys", "Surveys Setup"),
    nav("metrics", "Metrics"),
    nav("kpi-cycles", "KPI and Cycles"),
    nav("system", "Settings"),
];

pub const COMPANY_NAV: &[NavItem] = &[
    nav("dashboard", "Dashboard"),
    nav("employees", "Employees"),
    nav("surveys", "Surveys"),
    nav("metrics", "Metrics"),
];

pub const MANAGER_NAV: &[NavItem] = &[
    nav("employees", "My Team"),
    nav("kpi-surveys", "Employee KPI"),
    nav("requests", "Requests"),
    nav("metrics", "Metrics"),
    nav("engagement", "Engagement"),
    nav("surveys", "Surveys"),
];

pub const EMPLOYEE_NAV: &[NavItem] = &[
    nav("home", "Home"),
    nav("surveys", "Surveys"),
    nav("feedback", "Feedback"),
    nav("achievements", "Achievements"),
    nav("learning", "Learning"),
    nav("schedule", "Schedule"),
    nav("settings", "Settings"),
];

pub const MICRO_APPS: &[MicroApp] = &[
    MicroApp {
        id: "onboarding",
        title: "Onboarding",
        description: "Complete your onboarding journey and get familiar with the team.",
        roles: &[AppRole::Employee, AppRole::Admin],
    },
    MicroApp {
        id: "employee",
        title: "Employee Portal",
        description: "Access employee resources, time tracking, and personal information.",
        roles: &[AppRole::Employee, AppRole::Admin],
    },
    MicroApp {
        id: "company",
        title: "Company Management",
        description: "Manage company settings, teams, and organizational structure.",
        roles: &[AppRole::Company, AppRole::Admin],
    },
];

pub fn nav_items(role: AppRole) -> &'static [NavItem] {
    match role {
        AppRole::Admin => ADMIN_NAV,
        AppRole::Company => COMPANY_NAV,
        AppRole::Manager => MANAGER_NAV,
        AppRole::Employee => EMPLOYEE_NAV,
    }
}

pub fn can_access(role: AppRole, item_id: &str) -> bool {
    nav_items(role).iter().any(|item| item.id == item_id)
}

/// Cards visible to a user holding any of `roles`
pub fn micro_apps_for(roles: &[AppRole]) -> Vec<&'static MicroApp> {
    MICRO_APPS
        .iter()
        .filter(|app| app.roles.iter().any(|r| roles.contains(r)))
        .collect()
}

/// Landing portal: admin > company > manager > employee
pub fn landing_role(roles: &[AppRole]) -> Option<AppRole> {
    roles.iter().copied().max()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_has_items() {
        for role in AppRole::ALL {
            assert!(!nav_items(role).is_empty(), "{} has no navigation", role);
        }
    }

    #[test]
    fn test_admin_sees_all_cards() {
        assert_eq!(micro_apps_for(&[AppRole::Admin]).len(), MICRO_APPS.len());
        assert!(micro_apps_for(&[AppRole::Manager]).is_empty());
    }

    #[test]
    fn test_cards_union_over_roles() {
        let ids: Vec<&str> = micro_apps_for(&[AppRole::Employee, AppRole::Company])
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["onboarding", "employee", "company"]);
    }

    #[test]
    fn test_landing_precedence() {
        assert_eq!(landing_role(&[AppRole::Employee, AppRole::Manager]), Some(AppRole::Manager));
        assert_eq!(landing_role(&[AppRole::Company, AppRole::Admin]), Some(AppRole::Admin));
        assert_eq!(landing_role(&[]), None);
    }

    #[test]
    fn test_access_checks() {
        assert!(can_access(AppRole::Manager, "requests"));
        assert!(!can_access(AppRole::Employee, "kpi-cycles"));
    }
}
