//! CLI interface module
//!
//! Command definitions and handlers, plus the terminal output formatting
//! (colors, tables, relative time) shared across all of them.

pub mod commands;
pub mod display;

use clap::{Parser, Subcommand};

use commands::{bot::BotArgs, campaign::CampaignArgs, schedule::ScheduleArgs, task::TaskArgs};

#[derive(Parser, Debug)]
#[command(name = "orchestratorctl", about = "Bot/campaign swarm orchestrator", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit machine-readable JSON instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage trading bots
    Bot(BotArgs),
    /// Manage volume campaigns
    Campaign(CampaignArgs),
    /// Manage the task queue
    Task(TaskArgs),
    /// Manage scheduled tasks
    Schedule(ScheduleArgs),
    /// Run the orchestrator daemon loop (dispatch, bot ticks, schedule fires)
    Run,
}
