//! Scheduler CLI commands (spec §4.4 Scheduler).

use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Args, Subcommand};

use crate::domain::models::{TaskPayload, TaskPriority};

use super::{parse_uuid, AppContext};
use crate::cli::display::{
    action_success, list_table, output, relative_time_opt, render_list, short_id, CommandOutput,
};

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    pub command: ScheduleCommands,
}

#[derive(Subcommand, Debug)]
pub enum ScheduleCommands {
    /// Arm a one-shot balance check at a wall-clock instant (RFC 3339)
    Once {
        #[arg(long)]
        wallet_id: String,
        #[arg(long)]
        execute_at: chrono::DateTime<Utc>,
        #[arg(long, default_value = "normal")]
        priority: String,
    },
    /// Arm a recurring balance check on a cron expression
    Cron {
        #[arg(long)]
        wallet_id: String,
        #[arg(long)]
        expression: String,
        #[arg(long, default_value = "normal")]
        priority: String,
    },
    /// Cancel a scheduled task
    Cancel { id: String },
    /// Pause a recurring schedule
    Pause { id: String },
    /// Resume a paused schedule
    Resume { id: String },
    /// List scheduled tasks
    List {
        #[arg(long)]
        enabled: Option<bool>,
    },
}

fn parse_priority(s: &str) -> Result<TaskPriority> {
    Ok(match s.to_lowercase().as_str() {
        "low" => TaskPriority::Low,
        "normal" => TaskPriority::Normal,
        "high" => TaskPriority::High,
        "critical" => TaskPriority::Critical,
        other => bail!("unknown priority: {other}"),
    })
}

#[derive(Debug, serde::Serialize)]
struct ScheduleActionOutput {
    message: String,
}

impl CommandOutput for ScheduleActionOutput {
    fn to_human(&self) -> String {
        action_success(&self.message)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
struct ScheduleRow {
    id: String,
    recurring: bool,
    enabled: bool,
    next_fire: String,
    fire_count: u64,
}

#[derive(Debug, serde::Serialize)]
struct ScheduleListOutput {
    schedules: Vec<ScheduleRow>,
    total: usize,
}

impl CommandOutput for ScheduleListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["ID", "Recurring", "Enabled", "Next fire", "Fires"]);
        for s in &self.schedules {
            table.add_row([
                short_id(&s.id).to_string(),
                s.recurring.to_string(),
                s.enabled.to_string(),
                s.next_fire.clone(),
                s.fire_count.to_string(),
            ]);
        }
        render_list("schedule", table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ScheduleArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    match args.command {
        ScheduleCommands::Once { wallet_id, execute_at, priority } => {
            let payload = TaskPayload::Balance { wallet_id, token_mint: None };
            let id = ctx
                .scheduler
                .schedule_once(payload, parse_priority(&priority)?, execute_at, Utc::now())
                .await?;
            output(&ScheduleActionOutput { message: format!("Scheduled once: {id}") }, json_mode);
        }
        ScheduleCommands::Cron { wallet_id, expression, priority } => {
            let payload = TaskPayload::Balance { wallet_id, token_mint: None };
            let id = ctx
                .scheduler
                .schedule_recurring(payload, parse_priority(&priority)?, expression, Utc::now())
                .await?;
            output(&ScheduleActionOutput { message: format!("Scheduled recurring: {id}") }, json_mode);
        }
        ScheduleCommands::Cancel { id } => {
            ctx.scheduler.cancel(parse_uuid(&id)?).await?;
            output(&ScheduleActionOutput { message: format!("Schedule {id} canceled") }, json_mode);
        }
        ScheduleCommands::Pause { id } => {
            ctx.scheduler.pause(parse_uuid(&id)?).await?;
            output(&ScheduleActionOutput { message: format!("Schedule {id} paused") }, json_mode);
        }
        ScheduleCommands::Resume { id } => {
            ctx.scheduler.resume(parse_uuid(&id)?, Utc::now()).await?;
            output(&ScheduleActionOutput { message: format!("Schedule {id} resumed") }, json_mode);
        }
        ScheduleCommands::List { enabled } => {
            let filter = crate::domain::ports::ScheduleFilter { enabled };
            let schedules = ctx.scheduler.list(filter).await?;
            let out = ScheduleListOutput {
                total: schedules.len(),
                schedules: schedules
                    .iter()
                    .map(|s| ScheduleRow {
                        id: s.id.to_string(),
                        recurring: s.is_recurring(),
                        enabled: s.enabled,
                        next_fire: relative_time_opt(s.next_fire_at.as_ref()),
                        fire_count: s.fire_count,
                    })
                    .collect(),
            };
            output(&out, json_mode);
        }
    }
    Ok(())
}
