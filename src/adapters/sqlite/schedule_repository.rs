//! SQLite implementation of `ScheduleRepository` (spec §4.4).

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::ScheduledTask;
use crate::domain::ports::{ScheduleFilter, ScheduleRepository};

#[derive(Clone)]
pub struct SqliteScheduleRepository {
    pool: SqlitePool,
}

impl SqliteScheduleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn decode(data: &str) -> OrchestratorResult<ScheduledTask> {
        serde_json::from_str(data).map_err(OrchestratorError::from)
    }
}

#[async_trait]
impl ScheduleRepository for SqliteScheduleRepository {
    async fn create(&self, schedule: &ScheduledTask) -> OrchestratorResult<()> {
        let data = serde_json::to_string(schedule)?;
        sqlx::query(
            "INSERT INTO schedules (id, enabled, is_recurring, data) VALUES (?, ?, ?, ?)",
        )
        .bind(schedule.id.to_string())
        .bind(schedule.enabled)
        .bind(schedule.is_recurring())
        .bind(&data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> OrchestratorResult<Option<ScheduledTask>> {
        let row = sqlx::query("SELECT data FROM schedules WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Self::decode(r.get::<String, _>("data").as_str())).transpose()
    }

    async fn update(&self, schedule: &ScheduledTask) -> OrchestratorResult<()> {
        let data = serde_json::to_string(schedule)?;
        let result = sqlx::query("UPDATE schedules SET enabled = ?, is_recurring = ?, data = ? WHERE id = ?")
            .bind(schedule.enabled)
            .bind(schedule.is_recurring())
            .bind(&data)
            .bind(schedule.id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(OrchestratorError::not_found("schedule", schedule.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> OrchestratorResult<()> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(OrchestratorError::not_found("schedule", id));
        }
        Ok(())
    }

    async fn list(&self, filter: ScheduleFilter) -> OrchestratorResult<Vec<ScheduledTask>> {
        let mut query = String::from("SELECT data FROM schedules WHERE 1=1");
        if filter.enabled.is_some() {
            query.push_str(" AND enabled = ?");
        }

        let mut q = sqlx::query(&query);
        if let Some(enabled) = filter.enabled {
            q = q.bind(enabled);
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|r| Self::decode(r.get::<String, _>("data").as_str()))
            .collect()
    }

    async fn list_enabled(&self) -> OrchestratorResult<Vec<ScheduledTask>> {
        let rows = sqlx::query("SELECT data FROM schedules WHERE enabled = 1")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| Self::decode(r.get::<String, _>("data").as_str()))
            .collect()
    }

    async fn count_recurring_enabled(&self) -> OrchestratorResult<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as n FROM schedules WHERE enabled = 1 AND is_recurring = 1",
        )
        .fetch_one(&self.pool)
        .await?;
        let n: i64 = row.get("n");
        Ok(n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{all_embedded_migrations, create_test_pool, Migrator};
    use crate::domain::models::{TaskPayload, TaskPriority, ScheduleType};

    async fn repo() -> SqliteScheduleRepository {
        let pool = create_test_pool().await.unwrap();
        Migrator::new(pool.clone())
            .run_embedded_migrations(all_embedded_migrations())
            .await
            .unwrap();
        SqliteScheduleRepository::new(pool)
    }

    fn sample_schedule() -> ScheduledTask {
        ScheduledTask::new(
            ScheduleType::Cron {
                expression: "0 0 * * * *".to_string(),
            },
            TaskPayload::Balance {
                wallet_id: "w1".into(),
                token_mint: None,
            },
            TaskPriority::Low,
        )
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let repo = repo().await;
        let schedule = sample_schedule();
        repo.create(&schedule).await.unwrap();

        let fetched = repo.get(schedule.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, schedule.id);
        assert!(fetched.is_recurring());
    }

    #[tokio::test]
    async fn count_recurring_enabled_excludes_disabled() {
        let repo = repo().await;
        let mut schedule = sample_schedule();
        repo.create(&schedule).await.unwrap();
        assert_eq!(repo.count_recurring_enabled().await.unwrap(), 1);

        schedule.enabled = false;
        repo.update(&schedule).await.unwrap();
        assert_eq!(repo.count_recurring_enabled().await.unwrap(), 0);
        assert!(repo.list_enabled().await.unwrap().is_empty());
    }
}
