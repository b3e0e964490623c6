//! CLI subcommand modules. Each wraps a clap `Args`/`Subcommand` pair plus
//! an `execute` entry point that talks to the application services layer
//! through `AppContext`.

pub mod bot;
pub mod campaign;
pub mod schedule;
pub mod task;

use std::sync::Arc;

use crate::domain::ports::TaskRepository;
use crate::services::{BotCoordinator, CampaignManager, Scheduler, TaskQueueService};

/// Services every command needs a handle to. Built once in `main` and
/// shared by reference across the dispatched subcommand.
pub struct AppContext {
    pub queue: Arc<TaskQueueService>,
    pub task_repo: Arc<dyn TaskRepository>,
    pub bots: Arc<BotCoordinator>,
    pub campaigns: Arc<CampaignManager>,
    pub scheduler: Arc<Scheduler>,
}

/// Parse a uuid CLI argument, short-id friendly only in that it requires
/// the full value (spec CLI surface takes full ids; truncation is a
/// display-only concern).
pub fn parse_uuid(s: &str) -> anyhow::Result<uuid::Uuid> {
    uuid::Uuid::parse_str(s).map_err(|_| anyhow::anyhow!("invalid id: {s}"))
}
