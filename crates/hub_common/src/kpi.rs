//! KPI question cycles: current week resolution and quarter schedules.

use crate::config::WeekSource;
use crate::store::{fetch, fetch_one, DataStore, Filter, Query};
use chrono::NaiveDateTime;
use hub_shared::model::{procedures, tables};
use hub_shared::quarter::{is_valid_week, week_of_quarter, CurrentSlot, WeekSlot};
use hub_shared::{HubError, KpiQuestion, KpiQuestionEdit, Quarter, QuarterSchedule};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekOrigin {
    Remote,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekResolution {
    pub week: u8,
    pub origin: WeekOrigin,
}

fn parse_week(value: &Value) -> Option<u8> {
    let week = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    is_valid_week(week).then_some(week as u8)
}

/// Current week of the quarter. The store's procedure is authoritative; the
/// local formula only covers a failed call or an out-of-range answer.
pub async fn resolve_week<S: DataStore + ?Sized>(
    store: &S,
    source: WeekSource,
    now: NaiveDateTime,
) -> WeekResolution {
    let local = WeekResolution { week: week_of_quarter(now), origin: WeekOrigin::Local };
    if source == WeekSource::Local {
        return local;
    }

    match store.call(procedures::CURRENT_QUARTER_WEEK, json!({})).await {
        Ok(value) => match parse_week(&value) {
            Some(week) => WeekResolution { week, origin: WeekOrigin::Remote },
            None => {
                warn!("remote week {} out of range, using local week {}", value, local.week);
                local
            }
        },
        Err(e) => {
            warn!("remote week unavailable ({}), using local week {}", e, local.week);
            local
        }
    }
}

/// Questions for one quarter, optionally scoped to a company
pub async fn load_schedule<S: DataStore + ?Sized>(
    store: &S,
    company_id: Option<&str>,
    quarter: Quarter,
) -> Result<QuarterSchedule, HubError> {
    let mut query = Query::from(tables::KPI_QUESTIONS).order("week_number", true);
    if let Some(company) = company_id {
        query = query.eq("company_id", company);
    }
    let rows: Vec<KpiQuestion> = fetch(store, &query).await?;
    Ok(QuarterSchedule::for_quarter(quarter, rows))
}

/// Everything the cycle timeline shows for one quarter
#[derive(Debug, Clone, PartialEq)]
pub struct KpiTimeline {
    pub week: WeekResolution,
    pub schedule: QuarterSchedule,
}

impl KpiTimeline {
    pub fn quarter(&self) -> Quarter {
        self.schedule.quarter()
    }

    pub fn current(&self) -> CurrentSlot<'_> {
        self.schedule.current(self.week.week)
    }

    pub fn next(&self) -> Option<&KpiQuestion> {
        self.schedule.next(self.week.week)
    }

    pub fn slots(&self) -> Vec<WeekSlot> {
        self.schedule.slots(self.week.week)
    }
}

/// Timeline for `quarter`, or the quarter containing `now`
pub async fn load_timeline<S: DataStore + ?Sized>(
    store: &S,
    source: WeekSource,
    company_id: Option<&str>,
    quarter: Option<Quarter>,
    now: NaiveDateTime,
) -> Result<KpiTimeline, HubError> {
    let quarter = quarter.unwrap_or_else(|| Quarter::containing(now.date()));
    let schedule = load_schedule(store, company_id, quarter).await?;
    let week = resolve_week(store, source, now).await;
    Ok(KpiTimeline { week, schedule })
}

/// Seed the 13 default questions; returns how many were created
pub async fn initialize_quarter<S: DataStore + ?Sized>(
    store: &S,
    company_id: &str,
    quarter: Quarter,
) -> Result<usize, HubError> {
    let args = json!({
        "_company_id": company_id,
        "_quarter": quarter.label(),
        "_year": quarter.year(),
    });
    let created = store.call(procedures::INITIALIZE_KPI_QUESTIONS, args).await?;
    let created = created.as_u64().ok_or_else(|| {
        HubError::procedure(procedures::INITIALIZE_KPI_QUESTIONS, format!("unexpected reply {}", created))
    })? as usize;
    if created == 0 {
        info!("{} already has questions for {}", company_id, quarter);
    } else {
        info!("created {} questions for {} in {}", created, company_id, quarter);
    }
    Ok(created)
}

/// Change a question's text or active flag; week and quarter stay fixed
pub async fn edit_question<S: DataStore + ?Sized>(
    store: &S,
    question_id: &str,
    edit: &KpiQuestionEdit,
) -> Result<KpiQuestion, HubError> {
    if edit.is_empty() {
        return Err(HubError::Validation("nothing to change".to_string()));
    }
    if let Some(text) = &edit.question_text {
        if text.trim().is_empty() {
            return Err(HubError::Validation("question text cannot be empty".to_string()));
        }
    }

    let mut patch = serde_json::to_value(edit)?;
    if let Some(text) = &edit.question_text {
        patch["question_text"] = json!(text.trim());
    }
    let filters = [Filter::eq("id", question_id)];
    let matched = store.update(tables::KPI_QUESTIONS, &filters, patch).await?;
    if matched == 0 {
        return Err(HubError::NotFound(format!("KPI question {}", question_id)));
    }
    info!("updated KPI question {}", question_id);

    fetch_one(store, Query::from(tables::KPI_QUESTIONS).eq("id", question_id))
        .await?
        .ok_or_else(|| HubError::NotFound(format!("KPI question {}", question_id)))
}
