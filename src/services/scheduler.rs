//! Scheduler (spec §4.4): one-shot and cron-recurring task firing into the
//! Task Queue, pinned to a configured timezone and never catching up
//! missed intervals across a pause.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::{OverlapPolicy, ScheduleType, ScheduledTask, Task, TaskPayload, TaskPriority, TaskStatus};
use crate::domain::ports::{ScheduleFilter, ScheduleRepository, TaskRepository};

pub struct SchedulerConfig {
    pub timezone: Tz,
    pub max_concurrent_scheduled: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            max_concurrent_scheduled: 1_000,
        }
    }
}

/// Validate and compute the first fire instant strictly after `after` for
/// a cron expression, evaluated in `tz` (spec §4.4, §9 "cron semantics").
fn next_cron_fire(expression: &str, tz: Tz, after: DateTime<Utc>) -> OrchestratorResult<DateTime<Utc>> {
    let schedule = CronSchedule::from_str(expression)?;
    let local_after = after.with_timezone(&tz);
    schedule
        .after(&local_after)
        .next()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| OrchestratorError::Validation(format!("cron expression `{expression}` never fires after {after}")))
}

pub struct Scheduler {
    repo: Arc<dyn ScheduleRepository>,
    task_repo: Arc<dyn TaskRepository>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(repo: Arc<dyn ScheduleRepository>, task_repo: Arc<dyn TaskRepository>, config: SchedulerConfig) -> Self {
        Self { repo, task_repo, config }
    }

    /// Enqueue `payload` immediately, or arm a one-shot fire at
    /// `execute_at` (spec §4.4: a past `execute_at` enqueues immediately,
    /// §8 property 5 — exactly once, no duplicate fires).
    #[instrument(skip(self, payload), err)]
    pub async fn schedule_once(
        &self,
        payload: TaskPayload,
        priority: TaskPriority,
        execute_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> OrchestratorResult<Uuid> {
        let mut scheduled = ScheduledTask::new(ScheduleType::Once { execute_at }, payload, priority);
        scheduled.next_fire_at = Some(execute_at);
        let id = scheduled.id;

        if execute_at <= now {
            let task = self.build_fire_task(&scheduled);
            self.task_repo.create(&task).await?;
            scheduled.last_executed_at = Some(now);
            scheduled.last_task_id = Some(task.id);
            scheduled.fire_count += 1;
            scheduled.next_fire_at = None;
            scheduled.enabled = false;
        }
        self.repo.create(&scheduled).await?;
        Ok(id)
    }

    /// Arm a recurring cron job (spec §4.4). Fails with
    /// `SchedulerCapacityExceeded`-equivalent (`CapacityExceeded`) if doing
    /// so would exceed `max_concurrent_scheduled`.
    #[instrument(skip(self, payload), err)]
    pub async fn schedule_recurring(
        &self,
        payload: TaskPayload,
        priority: TaskPriority,
        cron_expr: String,
        now: DateTime<Utc>,
    ) -> OrchestratorResult<Uuid> {
        let armed = self.repo.count_recurring_enabled().await?;
        if armed >= self.config.max_concurrent_scheduled {
            return Err(OrchestratorError::CapacityExceeded(format!(
                "max_concurrent_scheduled ({}) reached",
                self.config.max_concurrent_scheduled
            )));
        }
        let next_fire = next_cron_fire(&cron_expr, self.config.timezone, now)?;
        let mut scheduled = ScheduledTask::new(ScheduleType::Cron { expression: cron_expr }, payload, priority);
        scheduled.next_fire_at = Some(next_fire);
        let id = scheduled.id;
        self.repo.create(&scheduled).await?;
        Ok(id)
    }

    fn build_fire_task(&self, scheduled: &ScheduledTask) -> Task {
        Task::new(scheduled.task_payload.clone(), scheduled.task_priority)
            .with_max_retries(scheduled.max_retries)
            .with_timeout_ms(scheduled.timeout_ms)
            .with_idempotency_key(scheduled.next_idempotency_key())
    }

    #[instrument(skip(self), err)]
    pub async fn cancel(&self, id: Uuid) -> OrchestratorResult<()> {
        self.repo.delete(id).await
    }

    #[instrument(skip(self), err)]
    pub async fn pause(&self, id: Uuid) -> OrchestratorResult<()> {
        let mut scheduled = self.get(id).await?;
        scheduled.enabled = false;
        self.repo.update(&scheduled).await
    }

    /// Resume a paused schedule. Never fires missed intervals: the next
    /// fire is the first cron-valid instant strictly after `now` (spec §4.4,
    /// §8 property 4).
    #[instrument(skip(self), err)]
    pub async fn resume(&self, id: Uuid, now: DateTime<Utc>) -> OrchestratorResult<()> {
        let mut scheduled = self.get(id).await?;
        scheduled.enabled = true;
        if let ScheduleType::Cron { expression } = &scheduled.schedule {
            scheduled.next_fire_at = Some(next_cron_fire(expression, self.config.timezone, now)?);
        }
        self.repo.update(&scheduled).await
    }

    #[instrument(skip(self), err)]
    pub async fn update_cron(&self, id: Uuid, new_cron: String, now: DateTime<Utc>) -> OrchestratorResult<()> {
        let mut scheduled = self.get(id).await?;
        let next_fire = next_cron_fire(&new_cron, self.config.timezone, now)?;
        scheduled.schedule = ScheduleType::Cron { expression: new_cron };
        scheduled.next_fire_at = Some(next_fire);
        self.repo.update(&scheduled).await
    }

    pub async fn get(&self, id: Uuid) -> OrchestratorResult<ScheduledTask> {
        self.repo.get(id).await?.ok_or_else(|| OrchestratorError::not_found("scheduled_task", id))
    }

    pub async fn list(&self, filter: ScheduleFilter) -> OrchestratorResult<Vec<ScheduledTask>> {
        self.repo.list(filter).await
    }

    /// Enqueue copies of every due, enabled recurring schedule and advance
    /// their `next_fire_at` (spec §4.4 "on recurring fire, enqueue a copy;
    /// the scheduled record persists with updated `last_executed_at`").
    #[instrument(skip(self), err)]
    pub async fn drive_due(&self, now: DateTime<Utc>) -> OrchestratorResult<usize> {
        let due = self.repo.list_enabled().await?;
        let mut fired = 0;
        for mut scheduled in due {
            let Some(next_fire_at) = scheduled.next_fire_at else { continue };
            if next_fire_at > now || !scheduled.is_recurring() {
                continue;
            }

            if scheduled.overlap_policy == OverlapPolicy::Skip {
                if let Some(last_id) = scheduled.last_task_id {
                    if let Some(last) = self.task_repo.get(last_id).await? {
                        if !last.status.is_terminal() {
                            self.rearm(&mut scheduled, now).await?;
                            continue;
                        }
                    }
                }
            } else if scheduled.overlap_policy == OverlapPolicy::CancelPrevious {
                if let Some(last_id) = scheduled.last_task_id {
                    if let Some(mut last) = self.task_repo.get(last_id).await? {
                        if !last.status.is_terminal() {
                            last.cancel();
                            self.task_repo.update(&last).await?;
                        }
                    }
                }
            }

            let task = self.build_fire_task(&scheduled);
            self.task_repo.create(&task).await?;
            scheduled.last_executed_at = Some(now);
            scheduled.last_task_id = Some(task.id);
            scheduled.fire_count += 1;
            self.rearm(&mut scheduled, now).await?;
            fired += 1;
        }
        Ok(fired)
    }

    async fn rearm(&self, scheduled: &mut ScheduledTask, now: DateTime<Utc>) -> OrchestratorResult<()> {
        if let ScheduleType::Cron { expression } = &scheduled.schedule {
            scheduled.next_fire_at = Some(next_cron_fire(expression, self.config.timezone, now)?);
        }
        scheduled.updated_at = now;
        self.repo.update(scheduled).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cron_fire_is_strictly_after_given_instant() {
        let now = Utc::now();
        let next = next_cron_fire("0 * * * * *", Tz::UTC, now).unwrap();
        assert!(next > now);
    }

    #[test]
    fn invalid_cron_is_rejected() {
        assert!(next_cron_fire("not a cron", Tz::UTC, Utc::now()).is_err());
    }
}
