//! SQLite implementation of `BotRepository` (spec §4.6).

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::BotState;
use crate::domain::ports::{BotFilter, BotRecord, BotRepository};

#[derive(Clone)]
pub struct SqliteBotRepository {
    pool: SqlitePool,
}

impl SqliteBotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn decode(data: &str) -> OrchestratorResult<BotRecord> {
        serde_json::from_str(data).map_err(OrchestratorError::from)
    }
}

fn state_as_str(state: BotState) -> &'static str {
    match state {
        BotState::Idle => "idle",
        BotState::Running => "running",
        BotState::Paused => "paused",
        BotState::Stopped => "stopped",
        BotState::Error => "error",
    }
}

#[async_trait]
impl BotRepository for SqliteBotRepository {
    async fn create(&self, bot: &BotRecord) -> OrchestratorResult<()> {
        let data = serde_json::to_string(bot)?;
        sqlx::query(
            "INSERT INTO bots (id, state, campaign_id, wallet_id, data) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(bot.id.to_string())
        .bind(state_as_str(bot.status.state))
        .bind(bot.status.campaign_id.map(|id| id.to_string()))
        .bind(&bot.config.wallet_id)
        .bind(&data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> OrchestratorResult<Option<BotRecord>> {
        let row = sqlx::query("SELECT data FROM bots WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Self::decode(r.get::<String, _>("data").as_str())).transpose()
    }

    async fn update(&self, bot: &BotRecord) -> OrchestratorResult<()> {
        let data = serde_json::to_string(bot)?;
        let result = sqlx::query("UPDATE bots SET state = ?, campaign_id = ?, data = ? WHERE id = ?")
            .bind(state_as_str(bot.status.state))
            .bind(bot.status.campaign_id.map(|id| id.to_string()))
            .bind(&data)
            .bind(bot.id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(OrchestratorError::not_found("bot", bot.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> OrchestratorResult<()> {
        let result = sqlx::query("DELETE FROM bots WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(OrchestratorError::not_found("bot", id));
        }
        Ok(())
    }

    async fn list(&self, filter: BotFilter) -> OrchestratorResult<Vec<BotRecord>> {
        let mut query = String::from("SELECT data FROM bots WHERE 1=1");
        if filter.state.is_some() {
            query.push_str(" AND state = ?");
        }
        if filter.campaign_id.is_some() {
            query.push_str(" AND campaign_id = ?");
        }

        let mut q = sqlx::query(&query);
        if let Some(state) = filter.state {
            q = q.bind(state_as_str(state));
        }
        if let Some(campaign_id) = filter.campaign_id {
            q = q.bind(campaign_id.to_string());
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|r| Self::decode(r.get::<String, _>("data").as_str()))
            .collect()
    }

    async fn count_by_state(&self, state: BotState) -> OrchestratorResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) as n FROM bots WHERE state = ?")
            .bind(state_as_str(state))
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
    use crate::domain::models::{BotConfig, BotMode, BotStatus, ProfileName};

    async fn repo() -> SqliteBotRepository {
        let pool = create_test_pool().await.unwrap();
        Migrator::new(pool.clone())
            .run_embedded_migrations(all_embedded_migrations())
            .await
            .unwrap();
        SqliteBotRepository::new(pool)
    }

    fn sample_record() -> BotRecord {
        let now = chrono::Utc::now();
        BotRecord {
            id: Uuid::new_v4(),
            config: BotConfig {
                wallet_id: "w1".into(),
                target_token: "mint1".into(),
                mode: BotMode::Volume,
                min_trade_size: 100,
                max_trade_size: 1_000,
                min_interval_ms: 1_000,
                max_interval_ms: 5_000,
                buy_probability: 0.5,
                max_daily_trades: 100,
                max_daily_volume: 10_000,
                enabled: true,
                profile: ProfileName::Retail,
            },
            status: BotStatus::new("w1", now),
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let repo = repo().await;
        let record = sample_record();
        repo.create(&record).await.unwrap();

        let fetched = repo.get(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, record.id);
        assert_eq!(fetched.config.wallet_id, "w1");
    }

    #[tokio::test]
    async fn count_by_state_reflects_updates() {
        let repo = repo().await;
        let mut record = sample_record();
        repo.create(&record).await.unwrap();
        assert_eq!(repo.count_by_state(BotState::Idle).await.unwrap(), 1);

        record.status.state = BotState::Running;
        repo.update(&record).await.unwrap();
        assert_eq!(repo.count_by_state(BotState::Idle).await.unwrap(), 0);
        assert_eq!(repo.count_by_state(BotState::Running).await.unwrap(), 1);
    }
}
