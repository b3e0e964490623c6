//! Task queue CLI commands (spec §4.3 Task Queue).

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use crate::domain::models::{Task, TaskPayload, TaskPriority, TaskStatus, TradeSide};
use crate::domain::ports::TaskFilter;

use super::{parse_uuid, AppContext};
use crate::cli::display::{
    action_success, list_table, output, render_list, short_id, CommandOutput, DetailView,
};

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommands,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Submit a manual swap task
    Swap {
        #[arg(long)]
        wallet_id: String,
        #[arg(long)]
        token_mint: String,
        #[arg(long)]
        side: String,
        #[arg(long)]
        amount: u64,
        #[arg(long, default_value = "100")]
        slippage_bps: u16,
        #[arg(long, default_value = "normal")]
        priority: String,
    },
    /// Submit a balance check task
    Balance {
        #[arg(long)]
        wallet_id: String,
        #[arg(long)]
        token_mint: Option<String>,
    },
    /// List tasks
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Show a task
    Show { id: String },
    /// Queue-wide stats
    Status,
    /// Pause dispatch
    Pause,
    /// Resume dispatch
    Resume,
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

fn parse_side(s: &str) -> Result<TradeSide> {
    Ok(match s.to_lowercase().as_str() {
        "buy" => TradeSide::Buy,
        "sell" => TradeSide::Sell,
        other => bail!("unknown trade side: {other}"),
    })
}

#[derive(Debug, serde::Serialize)]
struct TaskRow {
    id: String,
    task_type: String,
    status: String,
    priority: String,
    retry_count: u32,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            task_type: task.payload.task_type().as_str().to_string(),
            status: task.status.as_str().to_string(),
            priority: format!("{:?}", task.priority).to_lowercase(),
            retry_count: task.retry_count,
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct TaskListOutput {
    tasks: Vec<TaskRow>,
    total: usize,
}

impl CommandOutput for TaskListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["ID", "Type", "Status", "Priority", "Retry"]);
        for t in &self.tasks {
            table.add_row([
                short_id(&t.id).to_string(),
                t.task_type.clone(),
                t.status.clone(),
                t.priority.clone(),
                t.retry_count.to_string(),
            ]);
        }
        render_list("task", table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
struct TaskActionOutput {
    message: String,
}

impl CommandOutput for TaskActionOutput {
    fn to_human(&self) -> String {
        action_success(&self.message)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
struct QueueStatsOutput {
    pending: u64,
    active: u64,
    completed_last_interval: u64,
    failed_last_interval: u64,
}

impl CommandOutput for QueueStatsOutput {
    fn to_human(&self) -> String {
        format!(
            "Pending: {}\nActive: {}\nCompleted (last interval): {}\nFailed (last interval): {}",
            self.pending, self.active, self.completed_last_interval, self.failed_last_interval
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: TaskArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    match args.command {
        TaskCommands::Swap { wallet_id, token_mint, side, amount, slippage_bps, priority } => {
            let payload = TaskPayload::Swap {
                wallet_id,
                token_mint,
                side: parse_side(&side)?,
                amount,
                slippage_bps,
                priority_fee: None,
                memo: None,
            };
            let task = Task::new(payload, parse_priority(&priority)?);
            let id = ctx.queue.enqueue(task).await?;
            output(&TaskActionOutput { message: format!("Task enqueued: {id}") }, json_mode);
        }
        TaskCommands::Balance { wallet_id, token_mint } => {
            let payload = TaskPayload::Balance { wallet_id, token_mint };
            let task = Task::new(payload, TaskPriority::Normal);
            let id = ctx.queue.enqueue(task).await?;
            output(&TaskActionOutput { message: format!("Task enqueued: {id}") }, json_mode);
        }
        TaskCommands::List { status } => {
            let filter = TaskFilter {
                status: status.as_deref().and_then(TaskStatus::from_str),
                ..Default::default()
            };
            let tasks = ctx.task_repo.list(filter).await?;
            let out = TaskListOutput {
                total: tasks.len(),
                tasks: tasks.iter().map(TaskRow::from).collect(),
            };
            output(&out, json_mode);
        }
        TaskCommands::Show { id } => {
            let task = ctx
                .task_repo
                .get(parse_uuid(&id)?)
                .await?
                .ok_or_else(|| anyhow::anyhow!("task not found: {id}"))?;
            output(&SingleTask(TaskRow::from(&task)), json_mode);
        }
        TaskCommands::Status => {
            let stats = ctx.queue.queue_stats().await?;
            output(
                &QueueStatsOutput {
                    pending: stats.pending,
                    active: stats.active,
                    completed_last_interval: stats.completed_last_interval,
                    failed_last_interval: stats.failed_last_interval,
                },
                json_mode,
            );
        }
        TaskCommands::Pause => {
            ctx.queue.pause();
            output(&TaskActionOutput { message: "Queue paused".to_string() }, json_mode);
        }
        TaskCommands::Resume => {
            ctx.queue.resume();
            output(&TaskActionOutput { message: "Queue resumed".to_string() }, json_mode);
        }
    }
    Ok(())
}

struct SingleTask(TaskRow);

impl serde::Serialize for SingleTask {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl CommandOutput for SingleTask {
    fn to_human(&self) -> String {
        DetailView::new(&format!("Task {}", self.0.id))
            .field("Type", &self.0.task_type)
            .field("Status", &self.0.status)
            .field("Priority", &self.0.priority)
            .field("Retries", &self.0.retry_count.to_string())
            .render()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or_default()
    }
}
