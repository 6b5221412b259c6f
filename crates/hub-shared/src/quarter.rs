//! Quarter and week-of-quarter resolution for the KPI question schedule.
//!
//! A quarter is scheduled as 13 weekly slots. The week index is derived from
//! the week of the year: elapsed time since Jan 1 divided by one week, rounded
//! up, minus 13 weeks per completed quarter, clamped to 1..=13.
//!
//! Known edge: the last days of December fall in year-week 53, which lands
//! past the Q4 window and clamps to 13. Quarter starts can likewise round to
//! week 0 and clamp to 1.

use crate::model::{KpiQuestion, QuestionType};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const WEEKS_PER_QUARTER: u8 = 13;

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

/// Zero-based quarter of the year (0..=3)
pub fn quarter_index(date: NaiveDate) -> u8 {
    (date.month0() / 3) as u8
}

/// Week of the year, rounding partial weeks up. Jan 1 00:00 is week 0.
pub fn week_of_year(ts: NaiveDateTime) -> u32 {
    let elapsed = ts.ordinal0() as i64 * SECONDS_PER_DAY + ts.num_seconds_from_midnight() as i64;
    ((elapsed + SECONDS_PER_WEEK - 1) / SECONDS_PER_WEEK) as u32
}

/// Week inside the quarter, always in 1..=13
pub fn week_of_quarter(ts: NaiveDateTime) -> u8 {
    let raw = week_of_year(ts) as i64 - WEEKS_PER_QUARTER as i64 * quarter_index(ts.date()) as i64;
    raw.clamp(1, WEEKS_PER_QUARTER as i64) as u8
}

/// Week inside the quarter evaluated at midnight
pub fn week_of_quarter_on(date: NaiveDate) -> u8 {
    week_of_quarter(date.and_time(chrono::NaiveTime::MIN))
}

/// Sunday that starts the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

pub fn is_valid_week(week: i64) -> bool {
    (1..=WEEKS_PER_QUARTER as i64).contains(&week)
}

// ============================================================================
// Quarter
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quarter {
    year: i32,
    number: u8,
}

impl Quarter {
    pub fn new(number: u8, year: i32) -> Option<Self> {
        (1..=4).contains(&number).then_some(Self { year, number })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self { year: date.year(), number: quarter_index(date) + 1 }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Short label stored in the `quarter` column
    pub fn label(&self) -> String {
        format!("Q{}", self.number)
    }

    pub fn next(&self) -> Self {
        if self.number == 4 {
            Self { year: self.year + 1, number: 1 }
        } else {
            Self { year: self.year, number: self.number + 1 }
        }
    }

    /// Rows with no quarter or year are unscoped and match any quarter
    pub fn matches(&self, quarter: Option<&str>, year: Option<i32>) -> bool {
        let quarter_ok = match quarter {
            None => true,
            Some(q) => {
                let q = q.trim();
                q.eq_ignore_ascii_case(&self.label())
                    || q.parse::<Quarter>().map(|parsed| parsed == *self).unwrap_or(false)
            }
        };
        quarter_ok && year.map_or(true, |y| y == self.year)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} {}", self.number, self.year)
    }
}

impl FromStr for Quarter {
    type Err = String;

    /// Accepts "Q1 2025", "Q1-2025" and "2025-Q1"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let parts: Vec<&str> = upper
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() != 2 {
            return Err(format!("expected a quarter like 'Q1 2025', got '{}'", s));
        }
        let (q, y) = if parts[0].starts_with('Q') { (parts[0], parts[1]) } else { (parts[1], parts[0]) };
        let number: u8 = q
            .strip_prefix('Q')
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| format!("bad quarter '{}'", q))?;
        let year: i32 = y.parse().map_err(|_| format!("bad year '{}'", y))?;
        Quarter::new(number, year).ok_or_else(|| format!("quarter must be Q1-Q4, got Q{}", number))
    }
}

// ============================================================================
// Default schedule
// ============================================================================

/// One default pulse-check prompt per week, used to seed an empty quarter
pub const DEFAULT_QUESTIONS: [(&str, QuestionType); WEEKS_PER_QUARTER as usize] = [
    ("How clear are your goals for this quarter?", QuestionType::Scale),
    ("Do you have the tools you need to do your job well?", QuestionType::YesNo),
    ("How would you rate communication within your team this week?", QuestionType::Rating),
    ("How manageable was your workload this week?", QuestionType::Scale),
    ("Did you receive useful feedback from your manager this week?", QuestionType::YesNo),
    ("How motivated did you feel this week?", QuestionType::Scale),
    ("How well did your team collaborate this week?", QuestionType::Rating),
    ("Did you learn something new this week?", QuestionType::YesNo),
    ("How satisfied are you with your progress toward your goals?", QuestionType::Scale),
    ("How recognized do you feel for your contributions?", QuestionType::Rating),
    ("Were any blockers resolved quickly this week?", QuestionType::YesNo),
    ("How balanced did work and personal time feel this week?", QuestionType::Scale),
    ("How confident are you about next quarter's priorities?", QuestionType::Rating),
];

// ============================================================================
// Quarter schedule
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Past,
    Current,
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekSlot {
    pub week: u8,
    pub state: SlotState,
    pub question_id: Option<String>,
}

impl WeekSlot {
    pub fn has_question(&self) -> bool {
        self.question_id.is_some()
    }
}

/// What the current-week panel shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurrentSlot<'a> {
    Scheduled(&'a KpiQuestion),
    Unconfigured { week: u8 },
}

impl CurrentSlot<'_> {
    pub fn guidance(&self) -> Option<String> {
        match self {
            CurrentSlot::Scheduled(_) => None,
            CurrentSlot::Unconfigured { week } => Some(format!(
                "No KPI question set for week {}. Configure a question for week {}.",
                week, week
            )),
        }
    }
}

/// The 13-slot KPI question schedule of one quarter
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterSchedule {
    quarter: Quarter,
    questions: Vec<KpiQuestion>,
}

impl QuarterSchedule {
    pub fn for_quarter(quarter: Quarter, rows: impl IntoIterator<Item = KpiQuestion>) -> Self {
        let mut questions: Vec<KpiQuestion> = rows
            .into_iter()
            .filter(|q| quarter.matches(q.quarter.as_deref(), q.year))
            .collect();
        questions.sort_by_key(|q| q.week_number.unwrap_or(u8::MAX));
        Self { quarter, questions }
    }

    pub fn quarter(&self) -> Quarter {
        self.quarter
    }

    pub fn questions(&self) -> &[KpiQuestion] {
        &self.questions
    }

    /// Active question scheduled for `week`; the first by week order wins
    pub fn question_for_week(&self, week: u8) -> Option<&KpiQuestion> {
        self.questions
            .iter()
            .find(|q| q.week_number == Some(week) && q.is_active())
    }

    pub fn current(&self, week: u8) -> CurrentSlot<'_> {
        match self.question_for_week(week) {
            Some(q) => CurrentSlot::Scheduled(q),
            None => CurrentSlot::Unconfigured { week },
        }
    }

    /// Question for the following week; nothing past week 13
    pub fn next(&self, week: u8) -> Option<&KpiQuestion> {
        if week >= WEEKS_PER_QUARTER {
            return None;
        }
        self.question_for_week(week + 1)
    }

    pub fn slots(&self, current_week: u8) -> Vec<WeekSlot> {
        (1..=WEEKS_PER_QUARTER)
            .map(|week| WeekSlot {
                week,
                state: match week.cmp(&current_week) {
                    std::cmp::Ordering::Less => SlotState::Past,
                    std::cmp::Ordering::Equal => SlotState::Current,
                    std::cmp::Ordering::Greater => SlotState::Upcoming,
                },
                question_id: self.question_for_week(week).map(|q| q.id.clone()),
            })
            .collect()
    }

    pub fn missing_weeks(&self) -> Vec<u8> {
        (1..=WEEKS_PER_QUARTER)
            .filter(|w| self.question_for_week(*w).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_weeks().is_empty()
    }
}
