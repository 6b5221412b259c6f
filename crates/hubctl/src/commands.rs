//! Command execution.
//!
//! Each command opens the local store, runs one service call and prints the
//! result. Commands that write persist the snapshot before returning.

use crate::cli::{Cli, Commands};
use crate::display;
use anyhow::{bail, Context as _, Result};
use chrono::{Local, NaiveDate, NaiveTime, Utc};
use hub_common::config::WeekSource;
use hub_common::store::{require_user, user_roles, SessionUser};
use hub_common::{achievements, dashboard, kpi, requests, resources, rewards, surveys};
use hub_common::{DirBlobStore, HubConfig, MemoryStore, Notice, StaticAuth};
use hub_shared::kpi_survey::KpiSurveyDraft;
use hub_shared::navigation::{landing_role, micro_apps_for, nav_items};
use hub_shared::quarter::CurrentSlot;
use hub_shared::{
    AppRole, KpiQuestionEdit, LevelPolicy, Quarter, RedemptionStatus, RequestType, RewardDraft, SurveyStatus,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything a command needs, built from flags and config
pub struct Context {
    pub config: HubConfig,
    pub store: MemoryStore,
    pub auth: StaticAuth,
    pub blobs: DirBlobStore,
    pub data_path: PathBuf,
    pub use_color: bool,
}

impl Context {
    pub fn open(cli: &Cli) -> Result<Self> {
        let config = HubConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
        let data_path = cli.data.clone().unwrap_or_else(|| config.store.snapshot_path.clone());
        let store = MemoryStore::load(&data_path)
            .with_context(|| format!("Failed to load data from {}", data_path.display()))?;
        let user = cli.user.clone().or_else(|| config.session.user_id.clone());
        let auth = match user {
            Some(id) => StaticAuth::signed_in(&id),
            None => StaticAuth::anonymous(),
        };
        let blobs = DirBlobStore::new(config.blob.root.clone());
        debug!("data {} blobs {}", data_path.display(), blobs.root().display());
        Ok(Self { config, store, auth, blobs, data_path, use_color: display::should_use_color() })
    }

    pub fn persist(&self) -> Result<()> {
        self.store
            .save(&self.data_path)
            .with_context(|| format!("Failed to save data to {}", self.data_path.display()))
    }

    pub async fn user(&self) -> Result<SessionUser> {
        require_user(&self.auth)
            .await
            .context("No user selected; pass --user or set session.user_id")
    }

    pub fn policy(&self) -> Result<LevelPolicy> {
        Ok(self.config.levels.policy()?)
    }

    fn bucket(&self) -> &str {
        &self.config.blob.bucket
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::open(&cli)?;
    match cli.command {
        Commands::Week { date } => week(&ctx, date).await,
        Commands::Kpi { company, quarter } => kpi_timeline(&ctx, company.as_deref(), quarter).await,
        Commands::InitQuarter { company, quarter } => init_quarter(&ctx, &company, quarter).await,
        Commands::EditQuestion { id, text, active } => edit_question(&ctx, &id, text, active).await,
        Commands::Pulse { employee_id, employee_name, mood, score, feedback, company } => {
            let mut draft = KpiSurveyDraft::new(&employee_id, &employee_name).with_score(score);
            draft.mood_rating = mood;
            if let Some(text) = feedback {
                draft = draft.with_feedback(&text);
            }
            pulse(&ctx, draft, company.as_deref()).await
        }
        Commands::Surveys { company } => show_surveys(&ctx, company.as_deref()).await,
        Commands::SurveyNew { title, description } => new_survey(&ctx, &title, description.as_deref()).await,
        Commands::SurveyStatus { id, status } => survey_status(&ctx, &id, status.into()).await,
        Commands::Respond { survey_id, question_id, value, text } => {
            respond(&ctx, &survey_id, &question_id, value, text.as_deref()).await
        }
        Commands::Dashboard => show_dashboard(&ctx).await,
        Commands::Achievements { tree } => show_achievements(&ctx, tree).await,
        Commands::Level { points } => level(&ctx, points),
        Commands::Rewards => show_rewards(&ctx).await,
        Commands::Redeem { reward_id } => redeem(&ctx, &reward_id).await,
        Commands::Catalog => show_catalog(&ctx).await,
        Commands::RewardNew { reward } => new_reward(&ctx, reward.into()).await,
        Commands::RewardEdit { id, reward } => edit_reward(&ctx, &id, reward.into()).await,
        Commands::RewardDelete { id } => delete_reward(&ctx, &id).await,
        Commands::Redemption { id, status } => redemption(&ctx, &id, status).await,
        Commands::Requests { all } => show_requests(&ctx, all).await,
        Commands::Request { request_type, title, description, start, end } => {
            submit_request(&ctx, request_type, &title, description.as_deref(), start, end).await
        }
        Commands::Review { id, decision } => review(&ctx, &id, decision.into()).await,
        Commands::Nav { role } => nav(&ctx, role).await,
        Commands::Resources { company } => show_resources(&ctx, company.as_deref()).await,
        Commands::Upload { file, company } => upload(&ctx, &file, company).await,
        Commands::Download { id, dest } => download(&ctx, &id, &dest).await,
        Commands::RemoveResource { id } => remove_resource(&ctx, &id).await,
    }
}

fn now_local() -> chrono::NaiveDateTime {
    Local::now().naive_local()
}

// ============================================================================
// KPI
// ============================================================================

async fn week(ctx: &Context, date: Option<NaiveDate>) -> Result<()> {
    let (resolution, quarter) = match date {
        Some(day) => {
            let at = day.and_time(NaiveTime::MIN);
            (kpi::resolve_week(&ctx.store, WeekSource::Local, at).await, Quarter::containing(day))
        }
        None => {
            let now = now_local();
            let resolution = kpi::resolve_week(&ctx.store, ctx.config.kpi.week_source, now).await;
            (resolution, Quarter::containing(now.date()))
        }
    };
    println!("{}", display::week_line(resolution.week, resolution.origin, &quarter.to_string()));
    Ok(())
}

async fn kpi_timeline(ctx: &Context, company: Option<&str>, quarter: Option<Quarter>) -> Result<()> {
    let timeline = kpi::load_timeline(&ctx.store, ctx.config.kpi.week_source, company, quarter, now_local())
        .await
        .context("Failed to load KPI questions")?;
    print!("{}", display::timeline(&timeline, ctx.use_color));
    Ok(())
}

async fn init_quarter(ctx: &Context, company: &str, quarter: Option<Quarter>) -> Result<()> {
    let quarter = quarter.unwrap_or_else(|| Quarter::containing(now_local().date()));
    let created = kpi::initialize_quarter(&ctx.store, company, quarter).await?;
    if created == 0 {
        println!("{} already has KPI questions for {}", company, quarter);
    } else {
        ctx.persist()?;
        println!("Created {} KPI questions for {} in {}", created, company, quarter);
    }
    Ok(())
}

async fn edit_question(ctx: &Context, id: &str, text: Option<String>, active: Option<bool>) -> Result<()> {
    let edit = KpiQuestionEdit { question_text: text, active };
    let question = kpi::edit_question(&ctx.store, id, &edit).await?;
    ctx.persist()?;
    println!(
        "Week {}: {}{}",
        question.week_number.map(|w| w.to_string()).unwrap_or_else(|| "-".to_string()),
        question.question_text,
        if question.is_active() { "" } else { " (inactive)" }
    );
    Ok(())
}

// ============================================================================
// Surveys
// ============================================================================

async fn pulse(ctx: &Context, draft: KpiSurveyDraft, company: Option<&str>) -> Result<()> {
    let manager = ctx.user().await?;
    let timeline = kpi::load_timeline(&ctx.store, ctx.config.kpi.week_source, company, None, now_local()).await?;
    let question = match timeline.current() {
        CurrentSlot::Scheduled(q) => Some(q),
        slot @ CurrentSlot::Unconfigured { .. } => {
            if let Some(guidance) = slot.guidance() {
                eprintln!("{}", guidance);
            }
            None
        }
    };
    let rows = surveys::submit_kpi_surveys(&ctx.store, &manager.id, &[draft], question, Utc::now()).await?;
    ctx.persist()?;
    for row in &rows {
        println!(
            "Recorded {} for week of {}: mood {}, KPI {}",
            row.employee_name, row.week_start_date, row.mood_rating, row.kpi_score
        );
    }
    Ok(())
}

async fn show_surveys(ctx: &Context, company: Option<&str>) -> Result<()> {
    let list = surveys::list_surveys(&ctx.store, company).await?;
    if list.is_empty() {
        println!("No surveys yet.");
    }
    for survey in &list {
        println!("  {:<36} {:<32} {:?}", survey.id, survey.title, survey.status);
    }
    Ok(())
}

async fn new_survey(ctx: &Context, title: &str, description: Option<&str>) -> Result<()> {
    let user = ctx.user().await?;
    let survey = surveys::create_survey(&ctx.store, &user.id, title, description).await?;
    ctx.persist()?;
    println!("Created draft survey {}", survey.id);
    Ok(())
}

async fn survey_status(ctx: &Context, id: &str, status: SurveyStatus) -> Result<()> {
    let survey = surveys::set_survey_status(&ctx.store, id, status).await?;
    ctx.persist()?;
    println!("Survey {} is now {:?}", survey.id, survey.status);
    Ok(())
}

async fn respond(
    ctx: &Context,
    survey_id: &str,
    question_id: &str,
    value: Option<f64>,
    text: Option<&str>,
) -> Result<()> {
    let user = ctx.user().await?;
    let response =
        surveys::submit_survey_response(&ctx.store, &user.id, survey_id, question_id, value, text, Utc::now())
            .await?;
    ctx.persist()?;
    println!("Recorded answer {}", response.id);
    Ok(())
}

async fn show_dashboard(ctx: &Context) -> Result<()> {
    let board = dashboard::load_dashboard(&ctx.store)
        .await
        .context("Failed to load dashboard")?;
    print!("{}", display::dashboard(&board, ctx.use_color));
    Ok(())
}

// ============================================================================
// Achievements and rewards
// ============================================================================

async fn show_achievements(ctx: &Context, tree: bool) -> Result<()> {
    let user = ctx.user().await?;
    let board = achievements::load_board(&ctx.store, Some(&user.id), &ctx.policy()?)
        .await
        .context("Failed to load achievements")?;
    if tree {
        print!("{}", display::skill_tree(&board, ctx.use_color));
    } else {
        print!("{}", display::achievements(&board, ctx.use_color));
    }
    Ok(())
}

fn level(ctx: &Context, points: u32) -> Result<()> {
    let standing = ctx.policy()?.standing(points);
    println!("{}", display::standing(&standing, points));
    Ok(())
}

async fn show_rewards(ctx: &Context) -> Result<()> {
    let user = ctx.user().await?;
    let board = rewards::load_rewards(&ctx.store, &user.id)
        .await
        .context("Failed to load rewards")?;
    print!("{}", display::rewards(&board, ctx.use_color));
    Ok(())
}

async fn redeem(ctx: &Context, reward_id: &str) -> Result<()> {
    let user = ctx.user().await?;
    let board = rewards::load_rewards(&ctx.store, &user.id).await?;
    let (redemption, after) = rewards::redeem(&ctx.store, &board, reward_id).await?;
    ctx.persist()?;
    let detail = format!(
        "{} for {} points, {} points remaining",
        reward_id,
        redemption.points_spent,
        after.balance.available()
    );
    println!("{}", display::notice(&Notice::success("Reward redeemed", detail), ctx.use_color));
    Ok(())
}

async fn show_catalog(ctx: &Context) -> Result<()> {
    let company = ctx.user().await?;
    let list = rewards::company_rewards(&ctx.store, &company.id).await?;
    print!("{}", display::catalog(&list, ctx.use_color));
    Ok(())
}

async fn new_reward(ctx: &Context, draft: RewardDraft) -> Result<()> {
    let company = ctx.user().await?;
    let reward = rewards::create_reward(&ctx.store, &company.id, &draft).await?;
    ctx.persist()?;
    let detail = format!("{} ({} points) as {}", reward.title, reward.points_cost, reward.id);
    println!("{}", display::notice(&Notice::success("Reward created", detail), ctx.use_color));
    Ok(())
}

async fn edit_reward(ctx: &Context, id: &str, draft: RewardDraft) -> Result<()> {
    let reward = rewards::update_reward(&ctx.store, id, &draft).await?;
    ctx.persist()?;
    let detail = format!("{} ({} points)", reward.title, reward.points_cost);
    println!("{}", display::notice(&Notice::success("Reward updated", detail), ctx.use_color));
    Ok(())
}

async fn delete_reward(ctx: &Context, id: &str) -> Result<()> {
    rewards::delete_reward(&ctx.store, id).await?;
    ctx.persist()?;
    println!("{}", display::notice(&Notice::success("Reward deleted", id.to_string()), ctx.use_color));
    Ok(())
}

async fn redemption(ctx: &Context, id: &str, status: RedemptionStatus) -> Result<()> {
    let updated = rewards::set_redemption_status(&ctx.store, id, status, Utc::now()).await?;
    ctx.persist()?;
    let detail = format!("{} is now {}", updated.id, updated.status);
    println!("{}", display::notice(&Notice::success("Redemption updated", detail), ctx.use_color));
    Ok(())
}

// ============================================================================
// Requests
// ============================================================================

async fn show_requests(ctx: &Context, all: bool) -> Result<()> {
    let list = if all {
        requests::all_requests(&ctx.store).await?
    } else {
        let user = ctx.user().await?;
        requests::my_requests(&ctx.store, &user.id).await?
    };
    print!("{}", display::requests(&list, ctx.use_color));
    Ok(())
}

async fn submit_request(
    ctx: &Context,
    request_type: RequestType,
    title: &str,
    description: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<()> {
    let user = ctx.user().await?;
    let mut draft = requests::RequestDraft::new(request_type, title).with_dates(start, end);
    if let Some(text) = description {
        draft = draft.with_description(text);
    }
    let request = requests::submit_request(&ctx.store, &user.id, draft).await?;
    ctx.persist()?;
    println!("Submitted {} request {}", request.request_type.label(), request.id);
    Ok(())
}

async fn review(ctx: &Context, id: &str, decision: hub_shared::RequestStatus) -> Result<()> {
    let reviewer = ctx.user().await?;
    let request = requests::review_request(&ctx.store, id, &reviewer.id, decision, Utc::now()).await?;
    ctx.persist()?;
    let detail = format!("{} {}", request.id, request.status);
    println!("{}", display::notice(&Notice::success("Request reviewed", detail), ctx.use_color));
    Ok(())
}

// ============================================================================
// Navigation
// ============================================================================

async fn nav(ctx: &Context, role: Option<AppRole>) -> Result<()> {
    let roles = match role {
        Some(role) => vec![role],
        None => {
            let user = ctx.user().await?;
            user_roles(&ctx.store, &user.id).await?
        }
    };
    let Some(landing) = landing_role(&roles) else {
        bail!("User has no roles; grant one in the user_roles table");
    };
    let apps = micro_apps_for(&roles);
    print!("{}", display::navigation(landing.as_str(), nav_items(landing), &apps, ctx.use_color));
    Ok(())
}

// ============================================================================
// Resources
// ============================================================================

async fn show_resources(ctx: &Context, company: Option<&str>) -> Result<()> {
    let list = resources::list_resources(&ctx.store, company).await?;
    print!("{}", display::resources(&list));
    Ok(())
}

async fn upload(ctx: &Context, file: &Path, company: Option<String>) -> Result<()> {
    let user = ctx.user().await?;
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file path: {}", file.display()))?
        .to_string();
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let company = company.unwrap_or_else(|| user.id.clone());

    let resource = resources::upload_resource(
        &ctx.store,
        &ctx.blobs,
        ctx.bucket(),
        &company,
        &user.id,
        &file_name,
        bytes,
        Utc::now(),
    )
    .await?;
    ctx.persist()?;
    println!("Uploaded {} as {}", resource.file_name, resource.id);
    Ok(())
}

async fn download(ctx: &Context, id: &str, dest: &Path) -> Result<()> {
    let (resource, bytes) = resources::download_resource(&ctx.store, &ctx.blobs, ctx.bucket(), id).await?;
    let target = if dest.is_dir() { dest.join(&resource.file_name) } else { dest.to_path_buf() };
    tokio::fs::write(&target, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;
    println!("Saved {} ({}) to {}", resource.file_name, display::human_size(bytes.len() as u64), target.display());
    Ok(())
}

async fn remove_resource(ctx: &Context, id: &str) -> Result<()> {
    resources::remove_resource(&ctx.store, &ctx.blobs, ctx.bucket(), id).await?;
    ctx.persist()?;
    println!("Removed resource {}", id);
    Ok(())
}
