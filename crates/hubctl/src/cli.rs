//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap. Execution lives in `commands`.

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use hub_shared::{AppRole, Quarter, RedemptionStatus, RequestStatus, RequestType, RewardDraft, SurveyStatus};
use std::path::PathBuf;

/// Hub engagement CLI
#[derive(Debug, Parser)]
#[command(name = "hubctl")]
#[command(about = "Hub - KPI cycles, achievements and rewards", long_about = None)]
#[command(version = env!("HUB_VERSION"))]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Config file (overrides $HUB_CONFIG and ~/.config/hub/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data snapshot file (overrides store.snapshot_path)
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Act as this user id (overrides session.user_id)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Decision {
    Approve,
    Reject,
}

impl From<Decision> for RequestStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject => RequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SurveyState {
    Active,
    Closed,
}

impl From<SurveyState> for SurveyStatus {
    fn from(state: SurveyState) -> Self {
        match state {
            SurveyState::Active => SurveyStatus::Active,
            SurveyState::Closed => SurveyStatus::Closed,
        }
    }
}

/// Editable reward fields shared by reward-new and reward-edit
#[derive(Debug, Clone, Args)]
pub struct RewardArgs {
    pub title: String,

    /// Points needed to redeem
    #[arg(long)]
    pub cost: u32,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Units left (default: unlimited)
    #[arg(long)]
    pub stock: Option<u32>,

    /// Hide the reward from employees
    #[arg(long)]
    pub inactive: bool,
}

impl From<RewardArgs> for RewardDraft {
    fn from(args: RewardArgs) -> Self {
        RewardDraft {
            title: args.title,
            description: args.description,
            category: args.category,
            points_cost: args.cost,
            stock_quantity: args.stock,
            active: !args.inactive,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the current week of the quarter
    Week {
        /// Compute for this date with the local formula (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show the KPI question timeline for a quarter
    Kpi {
        #[arg(long)]
        company: Option<String>,

        /// Quarter like "Q1 2025" (default: current)
        #[arg(long)]
        quarter: Option<Quarter>,
    },

    /// Create the 13 default KPI questions for a quarter
    InitQuarter {
        #[arg(long)]
        company: String,

        #[arg(long)]
        quarter: Option<Quarter>,
    },

    /// Change a KPI question's text or active flag
    EditQuestion {
        id: String,

        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        active: Option<bool>,
    },

    /// Rate one employee for this week's KPI question
    Pulse {
        employee_id: String,

        employee_name: String,

        /// Performance rating, 1-5
        #[arg(long)]
        mood: Option<u8>,

        /// KPI score, 1-5
        #[arg(long, default_value_t = 3)]
        score: u8,

        #[arg(long)]
        feedback: Option<String>,

        #[arg(long)]
        company: Option<String>,
    },

    /// List company surveys
    Surveys {
        #[arg(long)]
        company: Option<String>,
    },

    /// Create a draft survey owned by the current user
    SurveyNew {
        title: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Publish or close a survey
    SurveyStatus {
        id: String,

        #[arg(value_enum)]
        status: SurveyState,
    },

    /// Answer a question of an active survey
    Respond {
        survey_id: String,

        question_id: String,

        /// Numeric score
        #[arg(long)]
        value: Option<f64>,

        #[arg(long)]
        text: Option<String>,
    },

    /// Show recent survey answers and per-employee scores
    Dashboard,

    /// Show unlocked and available achievements
    Achievements {
        /// Show the skill tree layout
        #[arg(long)]
        tree: bool,
    },

    /// Show the level for a point total
    Level { points: u32 },

    /// Show rewards and the available point balance
    Rewards,

    /// Redeem a reward
    Redeem { reward_id: String },

    /// List the current company's rewards, hidden ones included
    Catalog,

    /// Add a reward to the current company's catalog
    RewardNew {
        #[command(flatten)]
        reward: RewardArgs,
    },

    /// Replace a reward's fields
    RewardEdit {
        id: String,

        #[command(flatten)]
        reward: RewardArgs,
    },

    /// Delete a reward
    RewardDelete { id: String },

    /// Move a redemption to another status
    Redemption { id: String, status: RedemptionStatus },

    /// List requests (own, or everyone's with --all)
    Requests {
        #[arg(long)]
        all: bool,
    },

    /// Submit a request
    Request {
        request_type: RequestType,

        title: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Approve or reject a pending request
    Review {
        id: String,

        #[arg(value_enum)]
        decision: Decision,
    },

    /// Show the sidebar and apps for a role (default: the user's landing portal)
    Nav { role: Option<AppRole> },

    /// List company resources
    Resources {
        #[arg(long)]
        company: Option<String>,
    },

    /// Upload a file to the resource library
    Upload {
        file: PathBuf,

        /// Owning company (default: the current user)
        #[arg(long)]
        company: Option<String>,
    },

    /// Download a resource to a path
    Download { id: String, dest: PathBuf },

    /// Delete a resource and its stored file
    RemoveResource { id: String },
}
