//! Repository port for scheduled-task persistence (spec §4.4).

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::OrchestratorResult;
use crate::domain::models::ScheduledTask;

#[derive(Debug, Default)]
pub struct ScheduleFilter {
    pub enabled: Option<bool>,
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn create(&self, schedule: &ScheduledTask) -> OrchestratorResult<()>;

    async fn get(&self, id: Uuid) -> OrchestratorResult<Option<ScheduledTask>>;

    async fn update(&self, schedule: &ScheduledTask) -> OrchestratorResult<()>;

    async fn delete(&self, id: Uuid) -> OrchestratorResult<()>;

    async fn list(&self, filter: ScheduleFilter) -> OrchestratorResult<Vec<ScheduledTask>>;

    /// All enabled schedules, used by the tick loop to find due fires.
    async fn list_enabled(&self) -> OrchestratorResult<Vec<ScheduledTask>>;

    /// Count of currently-armed recurring schedules, for the
    /// `max_concurrent_scheduled` cap (spec §4.4).
    async fn count_recurring_enabled(&self) -> OrchestratorResult<u64>;
}
