//! Shared types and pure logic for Hub components.
//!
//! Row types for the Hub tables, the quarter/week resolver behind the KPI
//! schedule, the achievement progression engine, the level policy and the
//! point balance rules. Nothing in this crate performs I/O.

pub mod achievements;
pub mod dashboard;
pub mod error;
pub mod kpi_survey;
pub mod levels;
pub mod model;
pub mod navigation;
pub mod quarter;
pub mod rewards;

pub use achievements::{AchievementSummary, SkillTree, Visibility};
pub use error::HubError;
pub use levels::{LevelPolicy, LevelStanding, LevelTier};
pub use model::{
    Achievement, AppRole, CompanyResource, EmployeeKpiSurvey, EmployeeRequest, KpiQuestion,
    KpiQuestionEdit, QuestionType, RedemptionStatus, RequestStatus, RequestType, Reward,
    RewardRedemption, Survey, SurveyResponse, SurveyStatus, UserAchievementProgress,
};
pub use quarter::{Quarter, QuarterSchedule, WEEKS_PER_QUARTER};
pub use dashboard::EmployeePerformance;
pub use rewards::{PointBalance, RedemptionRejection, RewardDraft};
