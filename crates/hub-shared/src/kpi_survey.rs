//! Manager pulse-check drafts for the weekly KPI survey.

use crate::model::{EmployeeKpiSurvey, KpiQuestion};
use crate::quarter::week_start;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;
pub const DEFAULT_KPI_SCORE: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurveyValidation {
    #[error("Please select a performance rating for {0}")]
    MissingMood(String),

    #[error("{field} for {employee} must be between 1 and 5, got {value}")]
    OutOfRange { employee: String, field: &'static str, value: u8 },

    #[error("No responses to submit")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiSurveyDraft {
    pub employee_id: String,
    pub employee_name: String,
    pub mood_rating: Option<u8>,
    pub kpi_score: u8,
    pub feedback: Option<String>,
}

impl KpiSurveyDraft {
    pub fn new(employee_id: &str, employee_name: &str) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            employee_name: employee_name.to_string(),
            mood_rating: None,
            kpi_score: DEFAULT_KPI_SCORE,
            feedback: None,
        }
    }

    pub fn with_mood(mut self, mood: u8) -> Self {
        self.mood_rating = Some(mood);
        self
    }

    pub fn with_score(mut self, score: u8) -> Self {
        self.kpi_score = score;
        self
    }

    pub fn with_feedback(mut self, feedback: &str) -> Self {
        let trimmed = feedback.trim();
        self.feedback = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn validate(&self) -> Result<u8, SurveyValidation> {
        let mood = self
            .mood_rating
            .ok_or_else(|| SurveyValidation::MissingMood(self.employee_name.clone()))?;
        if !RATING_RANGE.contains(&mood) {
            return Err(SurveyValidation::OutOfRange {
                employee: self.employee_name.clone(),
                field: "mood_rating",
                value: mood,
            });
        }
        if !RATING_RANGE.contains(&self.kpi_score) {
            return Err(SurveyValidation::OutOfRange {
                employee: self.employee_name.clone(),
                field: "kpi_score",
                value: self.kpi_score,
            });
        }
        Ok(mood)
    }
}

/// Turn validated drafts into rows keyed by the Sunday of the current week.
/// Any invalid draft rejects the whole batch.
pub fn into_rows(
    manager_id: &str,
    drafts: &[KpiSurveyDraft],
    question: Option<&KpiQuestion>,
    now: DateTime<Utc>,
) -> Result<Vec<EmployeeKpiSurvey>, SurveyValidation> {
    if drafts.is_empty() {
        return Err(SurveyValidation::Empty);
    }
    let week_start_date = week_start(now.date_naive());

    drafts
        .iter()
        .map(|draft| {
            let mood = draft.validate()?;
            Ok(EmployeeKpiSurvey {
                id: uuid::Uuid::new_v4().to_string(),
                manager_id: manager_id.to_string(),
                employee_id: draft.employee_id.clone(),
                employee_name: draft.employee_name.clone(),
                kpi_question_id: question.map(|q| q.id.clone()),
                kpi_question_text: question.map(|q| q.question_text.clone()),
                kpi_score: draft.kpi_score,
                mood_rating: mood,
                kpi_feedback: draft.feedback.clone(),
                week_start_date,
                submitted_at: Some(now),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_missing_mood_rejected() {
        let draft = KpiSurveyDraft::new("e1", "Ana");
        assert_eq!(draft.validate(), Err(SurveyValidation::MissingMood("Ana".into())));
    }

    #[test]
    fn test_rows_keyed_by_week_start() {
        let now = Utc.with_ymd_and_hms(2025, 2, 12, 9, 0, 0).unwrap();
        let drafts = vec![KpiSurveyDraft::new("e1", "Ana").with_mood(4).with_feedback("  solid week ")];
        let rows = into_rows("m1", &drafts, None, now).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].week_start_date.to_string(), "2025-02-09");
        assert_eq!(rows[0].kpi_score, DEFAULT_KPI_SCORE);
        assert_eq!(rows[0].kpi_feedback.as_deref(), Some("solid week"));
    }

    #[test]
    fn test_one_bad_draft_rejects_batch() {
        let now = Utc.with_ymd_and_hms(2025, 2, 12, 9, 0, 0).unwrap();
        let drafts = vec![
            KpiSurveyDraft::new("e1", "Ana").with_mood(4),
            KpiSurveyDraft::new("e2", "Bo").with_mood(4).with_score(9),
        ];
        assert!(matches!(
            into_rows("m1", &drafts, None, now),
            Err(SurveyValidation::OutOfRange { field: "kpi_score", .. })
        ));
        assert_eq!(into_rows("m1", &[], None, now), Err(SurveyValidation::Empty));
    }
}
