//! Task domain model.
//!
//! Tasks are the bounded units of work the orchestrator dispatches to
//! collaborator-provided workers: swaps, transfers, balance checks,
//! pool migrations, and wallet consolidations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The kind of work a task represents. Bounded on purpose: the orchestrator
/// is not a general job runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Swap,
    Transfer,
    Balance,
    MigratePool,
    Consolidate,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Swap => "swap",
            Self::Transfer => "transfer",
            Self::Balance => "balance",
            Self::MigratePool => "migrate_pool",
            Self::Consolidate => "consolidate",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "swap" => Some(Self::Swap),
            "transfer" => Some(Self::Transfer),
            "balance" => Some(Self::Balance),
            "migrate_pool" | "migrate-pool" => Some(Self::MigratePool),
            "consolidate" => Some(Self::Consolidate),
            _ => None,
        }
    }
}

/// Dispatch priority class. Tasks within a class are FIFO (see `TaskQueue`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Normal,
    High,
    Critical,
}

impl TaskPriority {
    /// Numeric weight used by `TaskQueue`; higher sorts first.
    pub fn weight(&self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Normal => 1,
            Self::High => 2,
            Self::Critical => 3,
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Normal
    }
}

/// Status of a task in the dispatch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Retry,
    Canceled,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Retry => "retry",
            Self::Canceled => "canceled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "retry" => Some(Self::Retry),
            "canceled" | "cancelled" => Some(Self::Canceled),
            _ => None,
        }
    }

    /// Terminal statuses never transition further (spec §8 property 3).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }

    pub fn valid_transitions(&self) -> &'static [TaskStatus] {
        match self {
            Self::Pending => &[Self::Processing, Self::Canceled],
            Self::Processing => &[Self::Completed, Self::Failed, Self::Retry, Self::Canceled],
            Self::Retry => &[Self::Processing, Self::Failed, Self::Canceled],
            Self::Completed | Self::Failed | Self::Canceled => &[],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

/// Task payload, a sum type keyed by `type` (spec §9 "dynamic-typed task
/// payloads"). Each variant carries exactly the fields its processor needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskPayload {
    Swap {
        wallet_id: String,
        token_mint: String,
        side: TradeSide,
        amount: u64,
        slippage_bps: u16,
        priority_fee: Option<u64>,
        memo: Option<String>,
    },
    Transfer {
        from_wallet_id: String,
        to_wallet_id: String,
        token_mint: Option<String>,
        amount: u64,
    },
    Balance {
        wallet_id: String,
        token_mint: Option<String>,
    },
    MigratePool {
        token_mint: String,
        from_pool: String,
        to_pool: String,
    },
    Consolidate {
        wallet_ids: Vec<String>,
        destination_wallet_id: String,
        token_mint: Option<String>,
    },
}

impl TaskPayload {
    pub fn task_type(&self) -> TaskType {
        match self {
            Self::Swap { .. } => TaskType::Swap,
            Self::Transfer { .. } => TaskType::Transfer,
            Self::Balance { .. } => TaskType::Balance,
            Self::MigratePool { .. } => TaskType::MigratePool,
            Self::Consolidate { .. } => TaskType::Consolidate,
        }
    }

    /// Per-type validation run before enqueue (spec §9). Collaborator
    /// processors may layer stricter checks; this enforces only what the
    /// orchestrator itself can check without calling out.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Swap {
                amount,
                slippage_bps,
                ..
            } => {
                if *amount == 0 {
                    return Err("swap amount must be > 0".into());
                }
                if *slippage_bps > 10_000 {
                    return Err("slippage_bps must be <= 10000".into());
                }
                Ok(())
            }
            Self::Transfer { amount, from_wallet_id, to_wallet_id, .. } => {
                if *amount == 0 {
                    return Err("transfer amount must be > 0".into());
                }
                if from_wallet_id == to_wallet_id {
                    return Err("transfer source and destination must differ".into());
                }
                Ok(())
            }
            Self::Balance { .. } => Ok(()),
            Self::MigratePool { from_pool, to_pool, .. } => {
                if from_pool == to_pool {
                    return Err("migrate_pool from_pool and to_pool must differ".into());
                }
                Ok(())
            }
            Self::Consolidate { wallet_ids, .. } => {
                if wallet_ids.is_empty() {
                    return Err("consolidate requires at least one source wallet".into());
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn flip(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

/// A discrete unit of work dispatched by the Task Queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub payload: TaskPayload,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub timeout_ms: u64,
    pub created_at: DateTime<Utc>,
    /// Dispatch-order timestamp: equals `created_at` until the task is
    /// retried, then bumped to the moment it re-enters `Pending` (spec
    /// §4.3 "retried tasks re-enter at their original priority behind
    /// freshly enqueued tasks of the same priority"). `claim_next_pending`
    /// orders on this field rather than `created_at` so a retry never
    /// jumps ahead of same-priority tasks enqueued while it was backing off.
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub wallet_id: Option<String>,
    pub bot_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
    /// Deduplication key; a retried task keeps the same key as its original.
    pub idempotency_key: Option<String>,
    /// Free-form metadata, opaque to the core (spec §4.2 memo field, worker tags).
    pub metadata: HashMap<String, String>,
    pub last_error: Option<String>,
}

impl Task {
    pub fn new(payload: TaskPayload, priority: TaskPriority) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            payload,
            priority,
            status: TaskStatus::Pending,
            retry_count: 0,
            max_retries: 3,
            timeout_ms: 30_000,
            created_at: now,
            queued_at: now,
            started_at: None,
            completed_at: None,
            wallet_id: None,
            bot_id: None,
            campaign_id: None,
            idempotency_key: None,
            metadata: HashMap::new(),
            last_error: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_wallet(mut self, wallet_id: impl Into<String>) -> Self {
        self.wallet_id = Some(wallet_id.into());
        self
    }

    pub fn with_bot(mut self, bot_id: Uuid) -> Self {
        self.bot_id = Some(bot_id);
        self
    }

    pub fn with_campaign(mut self, campaign_id: Uuid) -> Self {
        self.campaign_id = Some(campaign_id);
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Mark the task as started, moving it into `Processing`.
    pub fn start(&mut self) {
        self.status = TaskStatus::Processing;
        self.started_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Record a failed attempt. Returns whether the task should be retried
    /// (caller re-enqueues at the original priority) or is now terminally
    /// failed.
    pub fn fail(&mut self, error: impl Into<String>, retryable: bool) -> bool {
        self.last_error = Some(error.into());
        if retryable && self.can_retry() {
            self.retry_count += 1;
            self.status = TaskStatus::Retry;
            true
        } else {
            self.status = TaskStatus::Failed;
            self.completed_at = Some(Utc::now());
            false
        }
    }

    pub fn cancel(&mut self) {
        self.status = TaskStatus::Canceled;
        self.completed_at = Some(Utc::now());
    }

    /// Re-enter `Pending` after a retry backoff. Bumps `queued_at` so the
    /// task sorts behind same-priority tasks enqueued while it was backing
    /// off, instead of jumping the queue on its original `created_at`
    /// (spec §4.3).
    pub fn requeue(&mut self) {
        self.status = TaskStatus::Pending;
        self.queued_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_then_terminal_failure() {
        let mut task = Task::new(
            TaskPayload::Balance {
                wallet_id: "w1".into(),
                token_mint: None,
            },
            TaskPriority::Normal,
        )
        .with_max_retries(2);

        assert!(task.fail("timeout", true));
        assert_eq!(task.status, TaskStatus::Retry);
        assert_eq!(task.retry_count, 1);

        assert!(task.fail("timeout", true));
        assert_eq!(task.retry_count, 2);

        assert!(!task.fail("timeout", true));
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.retry_count <= task.max_retries);
    }

    #[test]
    fn requeue_bumps_queued_at_past_created_at() {
        let mut task = Task::new(
            TaskPayload::Balance {
                wallet_id: "w1".into(),
                token_mint: None,
            },
            TaskPriority::Normal,
        );
        let original_created_at = task.created_at;
        let original_queued_at = task.queued_at;

        assert!(task.fail("timeout", true));
        task.requeue();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_at, original_created_at);
        assert!(task.queued_at >= original_queued_at);
    }

    #[test]
    fn non_retryable_failure_is_terminal_immediately() {
        let mut task = Task::new(
            TaskPayload::Balance {
                wallet_id: "w1".into(),
                token_mint: None,
            },
            TaskPriority::Normal,
        );
        assert!(!task.fail("unauthorized", false));
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.retry_count, 0);
    }

    #[test]
    fn swap_payload_validation() {
        let bad = TaskPayload::Swap {
            wallet_id: "w".into(),
            token_mint: "m".into(),
            side: TradeSide::Buy,
            amount: 0,
            slippage_bps: 50,
            priority_fee: None,
            memo: None,
        };
        assert!(bad.validate().is_err());
    }
}
