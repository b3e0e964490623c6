//! Task repository port (spec §4.3 Task Queue persistence).

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::OrchestratorResult;
use crate::domain::models::{Task, TaskPriority, TaskStatus, TaskType};

/// Filter criteria for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub task_type: Option<TaskType>,
    pub bot_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
}

/// Repository interface for Task persistence. Implementations must provide
/// atomic compare-and-swap semantics on status transitions so that two
/// workers can never both claim the same pending task (spec §5 "Task
/// Queue's pending set is mutated under a lock equivalent").
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> OrchestratorResult<()>;

    async fn get(&self, id: Uuid) -> OrchestratorResult<Option<Task>>;

    async fn update(&self, task: &Task) -> OrchestratorResult<()>;

    async fn delete(&self, id: Uuid) -> OrchestratorResult<()>;

    async fn list(&self, filter: TaskFilter) -> OrchestratorResult<Vec<Task>>;

    /// Claim and return the single highest-priority pending task, atomically
    /// marking it `processing`. FIFO within a priority class (spec §4.3).
    async fn claim_next_pending(&self) -> OrchestratorResult<Option<Task>>;

    async fn get_by_idempotency_key(&self, key: &str) -> OrchestratorResult<Option<Task>>;

    async fn count_by_status(&self) -> OrchestratorResult<std::collections::HashMap<TaskStatus, u64>>;
}
