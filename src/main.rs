//! `orchestratorctl`: CLI entry point and daemon loop for the bot/campaign
//! swarm orchestrator.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use swarm_orchestrator::adapters::sqlite::{
    initialize_database, SqliteBotRepository, SqliteCampaignRepository, SqliteScheduleRepository,
    SqliteTaskRepository,
};
use swarm_orchestrator::cli::commands::{bot, campaign, schedule, task, AppContext};
use swarm_orchestrator::cli::{Cli, Commands};
use swarm_orchestrator::domain::models::BehaviorProfile;
use swarm_orchestrator::infrastructure::config::ConfigLoader;
use swarm_orchestrator::infrastructure::logging::{LogConfig, LoggerImpl};
use swarm_orchestrator::services::{
    BotCoordinator, CampaignManager, CampaignManagerConfig, CoordinatorConfig, RandomizationEngine,
    RetryPolicy, Scheduler, SchedulerConfig, TaskQueueConfig, TaskQueueService,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load().context("failed to load configuration")?;
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging)).context("failed to init logging")?;

    let database_url = format!("sqlite:{}", config.database.path);
    let pool = initialize_database(&database_url)
        .await
        .context("failed to initialize database")?;

    let task_repo = Arc::new(SqliteTaskRepository::new(pool.clone()));
    let bot_repo = Arc::new(SqliteBotRepository::new(pool.clone()));
    let campaign_repo = Arc::new(SqliteCampaignRepository::new(pool.clone()));
    let schedule_repo = Arc::new(SqliteScheduleRepository::new(pool.clone()));

    let engine = Arc::new(RandomizationEngine::entropy());

    let queue = Arc::new(TaskQueueService::new(
        task_repo.clone(),
        TaskQueueConfig {
            concurrency: config.queue.concurrency,
            default_retry: RetryPolicy {
                initial_backoff_ms: config.queue.default_retry.backoff_ms,
                backoff_factor: 2.0,
                cap_ms: config.queue.default_retry.cap_ms,
                jitter_pct: config.queue.default_retry.jitter_pct,
            },
        },
    ));

    let bots = Arc::new(BotCoordinator::new(
        bot_repo.clone(),
        queue.clone(),
        engine.clone(),
        CoordinatorConfig {
            max_concurrent_bots: config.bots.max_concurrent as usize,
            ..CoordinatorConfig::default()
        },
    ));

    let events = Arc::new(swarm_orchestrator::services::EventBus::new(
        swarm_orchestrator::services::EventBusConfig::default(),
    ));

    let campaigns = Arc::new(CampaignManager::new(
        campaign_repo,
        bots.clone(),
        events,
        CampaignManagerConfig::default(),
    ));

    let scheduler_timezone = config
        .scheduler
        .timezone
        .parse::<chrono_tz::Tz>()
        .unwrap_or(chrono_tz::Tz::UTC);
    let scheduler = Arc::new(Scheduler::new(
        schedule_repo,
        task_repo.clone(),
        SchedulerConfig {
            timezone: scheduler_timezone,
            max_concurrent_scheduled: config.scheduler.max_concurrent_scheduled,
        },
    ));

    let ctx = AppContext { queue: queue.clone(), task_repo, bots: bots.clone(), campaigns, scheduler: scheduler.clone() };

    match cli.command {
        Commands::Bot(args) => bot::execute(args, &ctx, cli.json).await?,
        Commands::Campaign(args) => campaign::execute(args, &ctx, cli.json).await?,
        Commands::Task(args) => task::execute(args, &ctx, cli.json).await?,
        Commands::Schedule(args) => schedule::execute(args, &ctx, cli.json).await?,
        Commands::Run => run_daemon(queue, bots, scheduler).await?,
    }

    Ok(())
}

/// Drive the queue, bot ticks, and scheduler fires until interrupted. Not a
/// CLI subcommand of its own; entered by the daemon-style invocations that
/// need the background loop running (spec §4: "a driving loop... every
/// 50-200ms").
async fn run_daemon(
    queue: Arc<TaskQueueService>,
    bots: Arc<BotCoordinator>,
    scheduler: Arc<Scheduler>,
) -> Result<()> {
    let profiles: HashMap<_, _> = [
        swarm_orchestrator::domain::models::ProfileName::Retail,
        swarm_orchestrator::domain::models::ProfileName::Whale,
        swarm_orchestrator::domain::models::ProfileName::MarketMaker,
        swarm_orchestrator::domain::models::ProfileName::Stealth,
        swarm_orchestrator::domain::models::ProfileName::Aggressive,
        swarm_orchestrator::domain::models::ProfileName::Conservative,
    ]
    .into_iter()
    .map(|name| (name, BehaviorProfile::catalog_entry(name)))
    .collect();

    queue.start_processing();
    let mut ticker = tokio::time::interval(Duration::from_millis(100));

    info!("orchestrator daemon loop started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = chrono::Utc::now();
                if let Err(e) = queue.dispatch_ready().await {
                    error!(error = %e, "dispatch_ready failed");
                }
                if let Err(e) = bots.drive_ticks(&profiles, now).await {
                    error!(error = %e, "drive_ticks failed");
                }
                if let Err(e) = scheduler.drive_due(now).await {
                    error!(error = %e, "drive_due failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                queue.pause();
                queue.close();
                break;
            }
        }
    }
    Ok(())
}
