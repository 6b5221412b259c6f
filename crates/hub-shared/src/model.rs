//! Row types for the Hub tables.
//!
//! Field names follow the table columns so fetched rows deserialize as-is.
//! Nullable columns stay `Option` and expose accessors with the defaults the
//! screens assume.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Table names in the external store
pub mod tables {
    pub const ACHIEVEMENTS: &str = "achievements";
    pub const USER_ACHIEVEMENTS: &str = "user_achievements";
    pub const KPI_QUESTIONS: &str = "kpi_questions";
    pub const EMPLOYEE_KPI_SURVEYS: &str = "employee_kpi_surveys";
    pub const REWARDS: &str = "rewards";
    pub const REWARD_REDEMPTIONS: &str = "reward_redemptions";
    pub const SURVEYS: &str = "surveys";
    pub const SURVEY_RESPONSES: &str = "survey_responses";
    pub const EMPLOYEE_REQUESTS: &str = "employee_requests";
    pub const COMPANY_RESOURCES: &str = "company_resources";
    pub const USER_ROLES: &str = "user_roles";
}

/// Remote procedure names
pub mod procedures {
    pub const CURRENT_QUARTER_WEEK: &str = "get_current_quarter_week";
    pub const INITIALIZE_KPI_QUESTIONS: &str = "initialize_default_kpi_questions";
    pub const USER_ROLES: &str = "get_user_roles";
}

// ============================================================================
// Roles
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    Employee,
    Manager,
    Company,
    Admin,
}

impl AppRole {
    pub const ALL: [AppRole; 4] = [AppRole::Employee, AppRole::Manager, AppRole::Company, AppRole::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppRole::Employee => "employee",
            AppRole::Manager => "manager",
            AppRole::Company => "company",
            AppRole::Admin => "admin",
        }
    }
}

impl fmt::Display for AppRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AppRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "employee" => Ok(AppRole::Employee),
            "manager" => Ok(AppRole::Manager),
            "company" => Ok(AppRole::Company),
            "admin" => Ok(AppRole::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRoleRow {
    pub user_id: String,
    pub role: AppRole,
}

// ============================================================================
// KPI questions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Scale,
    YesNo,
    Rating,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KpiQuestion {
    pub id: String,
    pub question_text: String,
    #[serde(default)]
    pub week_number: Option<u8>,
    /// "Q1".."Q4"
    #[serde(default)]
    pub quarter: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl KpiQuestion {
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }
}

/// The only fields that may change once a question has been answered against
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KpiQuestionEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl KpiQuestionEdit {
    pub fn is_empty(&self) -> bool {
        self.question_text.is_none() && self.active.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployeeKpiSurvey {
    pub id: String,
    pub manager_id: String,
    pub employee_id: String,
    pub employee_name: String,
    #[serde(default)]
    pub kpi_question_id: Option<String>,
    #[serde(default)]
    pub kpi_question_text: Option<String>,
    pub kpi_score: u8,
    pub mood_rating: u8,
    #[serde(default)]
    pub kpi_feedback: Option<String>,
    pub week_start_date: NaiveDate,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Achievements
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Achievement {
    pub id: String,
    pub category: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub required_count: Option<u32>,
    #[serde(default)]
    pub prerequisite_id: Option<String>,
}

impl Achievement {
    /// Count needed to unlock; a missing or zero count means one step
    pub fn required(&self) -> u32 {
        self.required_count.filter(|c| *c > 0).unwrap_or(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserAchievementProgress {
    pub user_id: String,
    pub achievement_id: String,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub unlocked: Option<bool>,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl UserAchievementProgress {
    pub fn is_unlocked(&self) -> bool {
        self.unlocked.unwrap_or(false)
    }

    pub fn count(&self) -> u32 {
        self.progress.unwrap_or(0)
    }
}

// ============================================================================
// Rewards
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reward {
    pub id: String,
    pub company_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub points_cost: u32,
    #[serde(default)]
    pub stock_quantity: Option<u32>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl Reward {
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }

    /// Unlimited stock when the column is null
    pub fn in_stock(&self) -> bool {
        self.stock_quantity.map(|q| q > 0).unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    #[default]
    Pending,
    Approved,
    Delivered,
    Cancelled,
}

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionStatus::Pending => "pending",
            RedemptionStatus::Approved => "approved",
            RedemptionStatus::Delivered => "delivered",
            RedemptionStatus::Cancelled => "cancelled",
        }
    }

    /// Cancelled redemptions give their points back
    pub fn consumes_points(&self) -> bool {
        !matches!(self, RedemptionStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: RedemptionStatus) -> bool {
        use RedemptionStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Cancelled) | (Approved, Delivered) | (Approved, Cancelled)
        )
    }
}

impl fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RedemptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(RedemptionStatus::Pending),
            "approved" => Ok(RedemptionStatus::Approved),
            "delivered" => Ok(RedemptionStatus::Delivered),
            "cancelled" | "canceled" => Ok(RedemptionStatus::Cancelled),
            other => Err(format!("unknown redemption status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RewardRedemption {
    pub id: String,
    pub user_id: String,
    pub reward_id: String,
    pub points_spent: u32,
    #[serde(default)]
    pub status: RedemptionStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Surveys
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    #[default]
    Draft,
    Active,
    Closed,
}

impl SurveyStatus {
    pub fn can_transition_to(&self, next: SurveyStatus) -> bool {
        matches!(
            (self, next),
            (SurveyStatus::Draft, SurveyStatus::Active) | (SurveyStatus::Active, SurveyStatus::Closed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Survey {
    pub id: String,
    pub company_id: String,
    pub created_by: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: SurveyStatus,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// One answer to a survey question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurveyResponse {
    pub id: String,
    pub survey_id: String,
    pub question_id: String,
    pub user_id: String,
    #[serde(default)]
    pub response_value: Option<f64>,
    #[serde(default)]
    pub response_text: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl SurveyResponse {
    /// Null and zero both mean the question was left unscored
    pub fn score(&self) -> Option<f64> {
        self.response_value.filter(|v| *v != 0.0 && v.is_finite())
    }
}

// ============================================================================
// Employee requests
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Vacation,
    SickDay,
    FreeDay,
    Meeting,
    Suggestion,
    Paperwork,
}

impl RequestType {
    pub fn label(&self) -> &'static str {
        match self {
            RequestType::Vacation => "Vacation Request",
            RequestType::SickDay => "Sick Day",
            RequestType::FreeDay => "Free Day",
            RequestType::Meeting => "Special Meeting",
            RequestType::Suggestion => "Suggestion Box",
            RequestType::Paperwork => "Paperwork Request",
        }
    }

    /// Time-off style requests carry a date range
    pub fn takes_dates(&self) -> bool {
        matches!(self, RequestType::Vacation | RequestType::SickDay | RequestType::FreeDay)
    }
}

impl FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "vacation" => Ok(RequestType::Vacation),
            "sick_day" => Ok(RequestType::SickDay),
            "free_day" => Ok(RequestType::FreeDay),
            "meeting" => Ok(RequestType::Meeting),
            "suggestion" => Ok(RequestType::Suggestion),
            "paperwork" => Ok(RequestType::Paperwork),
            other => Err(format!("unknown request type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Only pending requests can be reviewed
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        *self == RequestStatus::Pending && next != RequestStatus::Pending
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployeeRequest {
    pub id: String,
    pub user_id: String,
    pub request_type: RequestType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Company resources
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyResource {
    pub id: String,
    pub company_id: String,
    pub file_name: String,
    pub file_path: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    pub uploaded_by: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
