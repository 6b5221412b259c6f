//! Employee requests: time off, meetings, suggestions and paperwork.

use crate::store::{fetch, fetch_one, insert_one, DataStore, Filter, Query};
use chrono::{DateTime, NaiveDate, Utc};
use hub_shared::model::tables;
use hub_shared::{EmployeeRequest, HubError, RequestStatus, RequestType};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestDraft {
    pub request_type: RequestType,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl RequestDraft {
    pub fn new(request_type: RequestType, title: &str) -> Self {
        Self {
            request_type,
            title: title.trim().to_string(),
            description: None,
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        let trimmed = description.trim();
        self.description = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Dates are dropped for request types that do not take a range
    pub fn validate(mut self) -> Result<Self, HubError> {
        if self.title.is_empty() {
            return Err(HubError::Validation("request title is required".to_string()));
        }
        if !self.request_type.takes_dates() {
            self.start_date = None;
            self.end_date = None;
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(HubError::Validation(format!("end date {} is before start date {}", end, start)));
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Serialize)]
struct NewRequest<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    draft: &'a RequestDraft,
    status: RequestStatus,
}

pub async fn submit_request<S: DataStore + ?Sized>(
    store: &S,
    user_id: &str,
    draft: RequestDraft,
) -> Result<EmployeeRequest, HubError> {
    let draft = draft.validate().map_err(|e| {
        warn!("request from {} rejected: {}", user_id, e);
        e
    })?;
    let record = NewRequest { user_id, draft: &draft, status: RequestStatus::Pending };
    let request: EmployeeRequest = insert_one(store, tables::EMPLOYEE_REQUESTS, &record).await?;
    info!("{} submitted {} request {}", user_id, draft.request_type.label(), request.id);
    Ok(request)
}

pub async fn my_requests<S: DataStore + ?Sized>(store: &S, user_id: &str) -> Result<Vec<EmployeeRequest>, HubError> {
    let query = Query::from(tables::EMPLOYEE_REQUESTS)
        .eq("user_id", user_id)
        .order("created_at", false);
    fetch(store, &query).await
}

pub async fn all_requests<S: DataStore + ?Sized>(store: &S) -> Result<Vec<EmployeeRequest>, HubError> {
    fetch(store, &Query::from(tables::EMPLOYEE_REQUESTS).order("created_at", false)).await
}

/// Approve or reject a pending request
pub async fn review_request<S: DataStore + ?Sized>(
    store: &S,
    request_id: &str,
    reviewer_id: &str,
    decision: RequestStatus,
    now: DateTime<Utc>,
) -> Result<EmployeeRequest, HubError> {
    let mut request: EmployeeRequest =
        fetch_one(store, Query::from(tables::EMPLOYEE_REQUESTS).eq("id", request_id))
            .await?
            .ok_or_else(|| HubError::NotFound(format!("request {}", request_id)))?;

    if !request.status.can_transition_to(decision) {
        warn!("request {} is {} and cannot become {}", request_id, request.status, decision);
        return Err(HubError::Validation(format!(
            "request is already {} and cannot become {}",
            request.status, decision
        )));
    }

    let patch = json!({ "status": decision, "reviewed_by": reviewer_id, "reviewed_at": now });
    store
        .update(tables::EMPLOYEE_REQUESTS, &[Filter::eq("id", request_id)], patch)
        .await?;
    info!("{} marked request {} {}", reviewer_id, request_id, decision);

    request.status = decision;
    request.reviewed_by = Some(reviewer_id.to_string());
    request.reviewed_at = Some(now);
    Ok(request)
}
