//! Weekly KPI pulse checks and company surveys.

use crate::store::{fetch, fetch_one, insert_one, DataStore, Filter, Query};
use chrono::{DateTime, Utc};
use hub_shared::kpi_survey::{into_rows, KpiSurveyDraft};
use hub_shared::model::tables;
use hub_shared::{EmployeeKpiSurvey, HubError, KpiQuestion, Survey, SurveyResponse, SurveyStatus};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

/// Validate every draft, then write the batch. Nothing is written if any draft is invalid.
pub async fn submit_kpi_surveys<S: DataStore + ?Sized>(
    store: &S,
    manager_id: &str,
    drafts: &[KpiSurveyDraft],
    question: Option<&KpiQuestion>,
    now: DateTime<Utc>,
) -> Result<Vec<EmployeeKpiSurvey>, HubError> {
    let rows = into_rows(manager_id, drafts, question, now).map_err(|e| {
        warn!("KPI survey rejected: {}", e);
        HubError::from(e)
    })?;

    let values = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    store.insert(tables::EMPLOYEE_KPI_SURVEYS, values).await?;
    info!("{} submitted {} KPI surveys", manager_id, rows.len());
    Ok(rows)
}

pub async fn kpi_surveys_by<S: DataStore + ?Sized>(
    store: &S,
    manager_id: &str,
) -> Result<Vec<EmployeeKpiSurvey>, HubError> {
    let query = Query::from(tables::EMPLOYEE_KPI_SURVEYS)
        .eq("manager_id", manager_id)
        .order("submitted_at", false);
    fetch(store, &query).await
}

#[derive(Debug, Serialize)]
struct NewSurvey<'a> {
    company_id: &'a str,
    created_by: &'a str,
    title: &'a str,
    description: Option<&'a str>,
    status: SurveyStatus,
}

/// New surveys start as drafts
pub async fn create_survey<S: DataStore + ?Sized>(
    store: &S,
    company_id: &str,
    title: &str,
    description: Option<&str>,
) -> Result<Survey, HubError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(HubError::Validation("survey title is required".to_string()));
    }
    let record = NewSurvey {
        company_id,
        created_by: company_id,
        title,
        description: description.map(str::trim).filter(|d| !d.is_empty()),
        status: SurveyStatus::Draft,
    };
    let survey: Survey = insert_one(store, tables::SURVEYS, &record).await?;
    info!("created survey {} for {}", survey.id, company_id);
    Ok(survey)
}

pub async fn list_surveys<S: DataStore + ?Sized>(
    store: &S,
    company_id: Option<&str>,
) -> Result<Vec<Survey>, HubError> {
    let mut query = Query::from(tables::SURVEYS).order("created_at", false);
    if let Some(company) = company_id {
        query = query.eq("company_id", company);
    }
    fetch(store, &query).await
}

/// Move a survey along draft → active → closed
pub async fn set_survey_status<S: DataStore + ?Sized>(
    store: &S,
    survey_id: &str,
    status: SurveyStatus,
) -> Result<Survey, HubError> {
    let mut survey: Survey = fetch_one(store, Query::from(tables::SURVEYS).eq("id", survey_id))
        .await?
        .ok_or_else(|| HubError::NotFound(format!("survey {}", survey_id)))?;
    if !survey.status.can_transition_to(status) {
        warn!("survey {} cannot move from {:?} to {:?}", survey_id, survey.status, status);
        return Err(HubError::Validation(format!(
            "survey cannot move from {:?} to {:?}",
            survey.status, status
        )));
    }

    store
        .update(tables::SURVEYS, &[Filter::eq("id", survey_id)], json!({ "status": status }))
        .await?;
    info!("survey {} is now {:?}", survey_id, status);
    survey.status = status;
    Ok(survey)
}

pub async fn delete_survey<S: DataStore + ?Sized>(store: &S, survey_id: &str) -> Result<(), HubError> {
    let removed = store.delete(tables::SURVEYS, &[Filter::eq("id", survey_id)]).await?;
    if removed == 0 {
        return Err(HubError::NotFound(format!("survey {}", survey_id)));
    }
    info!("deleted survey {}", survey_id);
    Ok(())
}

#[derive(Debug, Serialize)]
struct NewResponse<'a> {
    survey_id: &'a str,
    question_id: &'a str,
    user_id: &'a str,
    response_value: Option<f64>,
    response_text: Option<&'a str>,
    submitted_at: DateTime<Utc>,
}

/// Answers are only accepted while the survey is active
pub async fn submit_survey_response<S: DataStore + ?Sized>(
    store: &S,
    user_id: &str,
    survey_id: &str,
    question_id: &str,
    value: Option<f64>,
    text: Option<&str>,
    now: DateTime<Utc>,
) -> Result<SurveyResponse, HubError> {
    let text = text.map(str::trim).filter(|t| !t.is_empty());
    if value.is_none() && text.is_none() {
        return Err(HubError::Validation("a response needs a value or text".to_string()));
    }
    if value.is_some_and(|v| !v.is_finite()) {
        return Err(HubError::Validation("response value must be a number".to_string()));
    }

    let survey: Survey = fetch_one(store, Query::from(tables::SURVEYS).eq("id", survey_id))
        .await?
        .ok_or_else(|| HubError::NotFound(format!("survey {}", survey_id)))?;
    if survey.status != SurveyStatus::Active {
        warn!("response to {:?} survey {} rejected", survey.status, survey_id);
        return Err(HubError::Validation(format!("survey '{}' is not open", survey.title)));
    }

    let record = NewResponse {
        survey_id,
        question_id,
        user_id,
        response_value: value,
        response_text: text,
        submitted_at: now,
    };
    let response: SurveyResponse = insert_one(store, tables::SURVEY_RESPONSES, &record).await?;
    info!("{} answered {} on survey {}", user_id, question_id, survey_id);
    Ok(response)
}
