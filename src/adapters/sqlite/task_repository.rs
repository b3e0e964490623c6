//! SQLite implementation of `TaskRepository` (spec §4.3).
//!
//! Filterable fields (`status`, `priority`, `bot_id`, `campaign_id`) are
//! mirrored into dedicated columns for indexing; the full `Task` is kept
//! as a single JSON blob so the row shape never drifts from the domain
//! model.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::{Task, TaskPriority, TaskStatus};
use crate::domain::ports::{TaskFilter, TaskRepository};

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn decode(data: &str) -> OrchestratorResult<Task> {
        serde_json::from_str(data).map_err(OrchestratorError::from)
    }
}

fn priority_as_str(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::Low => "low",
        TaskPriority::Normal => "normal",
        TaskPriority::High => "high",
        TaskPriority::Critical => "critical",
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, task: &Task) -> OrchestratorResult<()> {
        let data = serde_json::to_string(task)?;
        sqlx::query(
            "INSERT INTO tasks (id, task_type, status, priority, priority_weight, bot_id,
             campaign_id, wallet_id, idempotency_key, created_at, queued_at, data)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(task.id.to_string())
        .bind(task.payload.task_type().as_str())
        .bind(task.status.as_str())
        .bind(priority_as_str(task.priority))
        .bind(i64::from(task.priority.weight()))
        .bind(task.bot_id.map(|id| id.to_string()))
        .bind(task.campaign_id.map(|id| id.to_string()))
        .bind(&task.wallet_id)
        .bind(&task.idempotency_key)
        .bind(task.created_at.to_rfc3339())
        .bind(task.queued_at.to_rfc3339())
        .bind(&data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> OrchestratorResult<Option<Task>> {
        let row = sqlx::query("SELECT data FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Self::decode(r.get::<String, _>("data").as_str())).transpose()
    }

    async fn update(&self, task: &Task) -> OrchestratorResult<()> {
        let data = serde_json::to_string(task)?;
        let result = sqlx::query(
            "UPDATE tasks SET status = ?, priority = ?, priority_weight = ?, bot_id = ?,
             campaign_id = ?, wallet_id = ?, idempotency_key = ?, queued_at = ?, data = ? WHERE id = ?",
        )
        .bind(task.status.as_str())
        .bind(priority_as_str(task.priority))
        .bind(i64::from(task.priority.weight()))
        .bind(task.bot_id.map(|id| id.to_string()))
        .bind(task.campaign_id.map(|id| id.to_string()))
        .bind(&task.wallet_id)
        .bind(&task.idempotency_key)
        .bind(task.queued_at.to_rfc3339())
        .bind(&data)
        .bind(task.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OrchestratorError::not_found("task", task.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> OrchestratorResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(OrchestratorError::not_found("task", id));
        }
        Ok(())
    }

    async fn list(&self, filter: TaskFilter) -> OrchestratorResult<Vec<Task>> {
        let mut query = String::from("SELECT data FROM tasks WHERE 1=1");
        if filter.status.is_some() {
            query.push_str(" AND status = ?");
        }
        if filter.task_type.is_some() {
            query.push_str(" AND task_type = ?");
        }
        if filter.bot_id.is_some() {
            query.push_str(" AND bot_id = ?");
        }
        if filter.campaign_id.is_some() {
            query.push_str(" AND campaign_id = ?");
        }
        query.push_str(" ORDER BY priority_weight DESC, queued_at ASC");

        let mut q = sqlx::query(&query);
        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(task_type) = filter.task_type {
            q = q.bind(task_type.as_str());
        }
        if let Some(bot_id) = filter.bot_id {
            q = q.bind(bot_id.to_string());
        }
        if let Some(campaign_id) = filter.campaign_id {
            q = q.bind(campaign_id.to_string());
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|r| Self::decode(r.get::<String, _>("data").as_str()))
            .collect()
    }

    async fn claim_next_pending(&self) -> OrchestratorResult<Option<Task>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT id, data FROM tasks WHERE status = 'pending'
             ORDER BY priority_weight DESC, queued_at ASC LIMIT 1",
        )
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };

        let id: String = row.get("id");
        let mut task = Self::decode(row.get::<String, _>("data").as_str())?;
        task.start();
        let data = serde_json::to_string(&task)?;

        sqlx::query("UPDATE tasks SET status = ?, data = ? WHERE id = ? AND status = 'pending'")
            .bind(task.status.as_str())
            .bind(&data)
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(task))
    }

    async fn get_by_idempotency_key(&self, key: &str) -> OrchestratorResult<Option<Task>> {
        let row = sqlx::query("SELECT data FROM tasks WHERE idempotency_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Self::decode(r.get::<String, _>("data").as_str())).transpose()
    }

    async fn count_by_status(&self) -> OrchestratorResult<HashMap<TaskStatus, u64>> {
        let rows = sqlx::query("SELECT status, COUNT(*) as n FROM tasks GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = HashMap::new();
        for row in rows {
            let status_str: String = row.get("status");
            let n: i64 = row.get("n");
            if let Some(status) = TaskStatus::from_str(&status_str) {
                counts.insert(status, n as u64);
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{all_embedded_migrations, create_test_pool, Migrator};
    use crate::domain::models::TaskPayload;

    async fn repo() -> SqliteTaskRepository {
        let pool = create_test_pool().await.unwrap();
        Migrator::new(pool.clone())
            .run_embedded_migrations(all_embedded_migrations())
            .await
            .unwrap();
        SqliteTaskRepository::new(pool)
    }

    fn balance_task(priority: TaskPriority) -> Task {
        Task::new(
            TaskPayload::Balance {
                wallet_id: "w1".into(),
                token_mint: None,
            },
            priority,
        )
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let repo = repo().await;
        let task = balance_task(TaskPriority::Normal);
        repo.create(&task).await.unwrap();

        let fetched = repo.get(task.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, task.id);
        assert_eq!(fetched.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn claim_next_pending_respects_priority_order() {
        let repo = repo().await;
        let low = balance_task(TaskPriority::Low);
        let critical = balance_task(TaskPriority::Critical);
        repo.create(&low).await.unwrap();
        repo.create(&critical).await.unwrap();

        let claimed = repo.claim_next_pending().await.unwrap().unwrap();
        assert_eq!(claimed.id, critical.id);
        assert_eq!(claimed.status, TaskStatus::Processing);
    }

    #[tokio::test]
    async fn requeued_task_sorts_behind_fresh_same_priority_peer() {
        let repo = repo().await;

        // The original task is enqueued and (per the worker's own flow) a
        // first attempt fails while it's being processed, out-of-band.
        let mut retried = balance_task(TaskPriority::Normal);
        repo.create(&retried).await.unwrap();
        retried.fail("timeout", true);

        // A fresh same-priority task is enqueued while the retry is still
        // backing off.
        let fresh = balance_task(TaskPriority::Normal);
        repo.create(&fresh).await.unwrap();

        // The retry now re-enters pending, bumping its `queued_at` past
        // both its own `created_at` and the fresh task's `queued_at`.
        retried.requeue();
        repo.update(&retried).await.unwrap();

        // Same priority class; the freshly enqueued peer must dispatch
        // first despite the retried task having the earlier `created_at`
        // (spec §4.3: retried tasks re-enter behind fresh same-priority work).
        let claimed = repo.claim_next_pending().await.unwrap().unwrap();
        assert_eq!(claimed.id, fresh.id);

        let claimed_next = repo.claim_next_pending().await.unwrap().unwrap();
        assert_eq!(claimed_next.id, retried.id);
    }

    #[tokio::test]
    async fn claim_next_pending_is_exhausted_once_empty() {
        let repo = repo().await;
        assert!(repo.claim_next_pending().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn idempotency_key_lookup_finds_the_original() {
        let repo = repo().await;
        let task = balance_task(TaskPriority::Normal).with_idempotency_key("dedupe-1");
        repo.create(&task).await.unwrap();

        let found = repo.get_by_idempotency_key("dedupe-1").await.unwrap().unwrap();
        assert_eq!(found.id, task.id);
    }

    #[tokio::test]
    async fn delete_missing_task_is_not_found() {
        let repo = repo().await;
        let result = repo.delete(Uuid::new_v4()).await;
        assert!(matches!(result, Err(OrchestratorError::NotFound { .. })));
    }
}
