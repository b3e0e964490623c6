//! Scheduled task domain model (spec §4.4 Scheduler).
//!
//! A `ScheduledTask` is a template plus firing rule. Time-keeping and cron
//! evaluation live in `services::scheduler::Scheduler`; this module only
//! holds the persisted record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::{TaskPayload, TaskPriority};

/// When a scheduled task fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleType {
    /// Fire exactly once at a wall-clock instant.
    Once { execute_at: DateTime<Utc> },
    /// Fire according to a cron expression (5-field: min hour dom month dow),
    /// evaluated in the scheduler's configured timezone.
    Cron { expression: String },
}

impl ScheduleType {
    pub fn is_recurring(&self) -> bool {
        matches!(self, Self::Cron { .. })
    }
}

/// Policy for handling a recurring fire whose previous instance's enqueued
/// task has not reached a terminal state yet. Not named explicitly in the
/// distilled spec; grounded in the teacher's `TaskSchedule::overlap_policy`
/// as the natural extension of "never fires missed intervals" to the
/// still-running case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Skip this fire if the previous task is not terminal.
    Skip,
    /// Always enqueue a new copy regardless of the previous task's status.
    Allow,
    /// Cancel the previous non-terminal task before enqueueing a new copy.
    CancelPrevious,
}

impl Default for OverlapPolicy {
    fn default() -> Self {
        Self::Skip
    }
}

/// A persisted scheduled task record (spec §3 `ScheduledTask`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: Uuid,
    pub schedule: ScheduleType,

    /// Template fields copied onto each enqueued `Task`.
    pub task_payload: TaskPayload,
    pub task_priority: TaskPriority,
    pub max_retries: u32,
    pub timeout_ms: u64,

    pub overlap_policy: OverlapPolicy,
    pub enabled: bool,

    pub next_fire_at: Option<DateTime<Utc>>,
    pub last_executed_at: Option<DateTime<Utc>>,
    pub last_task_id: Option<Uuid>,
    pub fire_count: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduledTask {
    pub fn new(schedule: ScheduleType, task_payload: TaskPayload, task_priority: TaskPriority) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            schedule,
            task_payload,
            task_priority,
            max_retries: 3,
            timeout_ms: 30_000,
            overlap_policy: OverlapPolicy::Skip,
            enabled: true,
            next_fire_at: None,
            last_executed_at: None,
            last_task_id: None,
            fire_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.schedule.is_recurring()
    }

    /// Idempotency key for the next enqueued copy, so a retried scheduler
    /// tick can never double-fire (spec §8 property 5).
    pub fn next_idempotency_key(&self) -> String {
        format!("sched:{}:{}", self.id, self.fire_count + 1)
    }
}
