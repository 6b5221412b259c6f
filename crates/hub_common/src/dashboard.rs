//! Company dashboard: latest survey answers and per-employee scores.

use crate::store::{fetch, DataStore, Query};
use hub_shared::dashboard::{employee_performance, needs_attention, top_performers, DASHBOARD_LIMIT};
use hub_shared::model::tables;
use hub_shared::{EmployeePerformance, HubError, SurveyResponse};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyDashboard {
    /// Most recent answers, newest first
    pub recent: Vec<SurveyResponse>,
    pub top: Vec<EmployeePerformance>,
    pub attention: Vec<EmployeePerformance>,
    /// Employees with at least one answer
    pub employees: usize,
}

impl CompanyDashboard {
    pub fn is_empty(&self) -> bool {
        self.employees == 0
    }
}

pub async fn load_dashboard<S: DataStore + ?Sized>(store: &S) -> Result<CompanyDashboard, HubError> {
    let recent: Vec<SurveyResponse> = fetch(
        store,
        &Query::from(tables::SURVEY_RESPONSES)
            .order("submitted_at", false)
            .limit(DASHBOARD_LIMIT),
    )
    .await?;
    let responses: Vec<SurveyResponse> = fetch(store, &Query::from(tables::SURVEY_RESPONSES)).await?;

    let performance = employee_performance(&responses);
    debug!(responses = responses.len(), employees = performance.len(), "company dashboard");
    Ok(CompanyDashboard {
        recent,
        top: top_performers(&performance),
        attention: needs_attention(&performance),
        employees: performance.len(),
    })
}
