//! Company dashboard aggregation over survey responses.
//!
//! Scores are averaged per employee from the numeric answers they gave.
//! Unscored answers (null or zero) are left out of both the sum and the count.

use crate::model::SurveyResponse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Average at or above which an employee is a top performer
pub const TOP_SCORE: f64 = 4.0;
/// Average below which an employee needs attention
pub const ATTENTION_SCORE: f64 = 3.0;
/// Rows shown in each dashboard list
pub const DASHBOARD_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePerformance {
    pub user_id: String,
    /// None when the employee has no scored answers
    pub avg_score: Option<f64>,
    /// Scored answers only
    pub response_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn of(score: f64) -> Self {
        if score >= TOP_SCORE {
            ScoreBand::High
        } else if score >= ATTENTION_SCORE {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        }
    }
}

/// One entry per employee, ordered by user id
pub fn employee_performance(responses: &[SurveyResponse]) -> Vec<EmployeePerformance> {
    let mut scores: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for response in responses {
        let entry = scores.entry(response.user_id.as_str()).or_default();
        if let Some(score) = response.score() {
            entry.push(score);
        }
    }

    scores
        .into_iter()
        .map(|(user_id, values)| {
            let avg_score = if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            };
            EmployeePerformance {
                user_id: user_id.to_string(),
                avg_score,
                response_count: values.len(),
            }
        })
        .collect()
}

/// Highest averages first
pub fn top_performers(performance: &[EmployeePerformance]) -> Vec<EmployeePerformance> {
    let mut top: Vec<_> = performance
        .iter()
        .filter(|p| p.avg_score.is_some_and(|s| s >= TOP_SCORE))
        .cloned()
        .collect();
    top.sort_by(|a, b| score(b).total_cmp(&score(a)));
    top.truncate(DASHBOARD_LIMIT);
    top
}

/// Lowest averages first
pub fn needs_attention(performance: &[EmployeePerformance]) -> Vec<EmployeePerformance> {
    let mut low: Vec<_> = performance
        .iter()
        .filter(|p| p.avg_score.is_some_and(|s| s < ATTENTION_SCORE))
        .cloned()
        .collect();
    low.sort_by(|a, b| score(a).total_cmp(&score(b)));
    low.truncate(DASHBOARD_LIMIT);
    low
}

fn score(p: &EmployeePerformance) -> f64 {
    p.avg_score.unwrap_or(0.0)
}
