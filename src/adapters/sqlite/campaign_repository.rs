//! SQLite implementation of `CampaignRepository` (spec §4.7, §4.8).

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::{Campaign, CampaignState};
use crate::domain::ports::{CampaignFilter, CampaignRepository};

#[derive(Clone)]
pub struct SqliteCampaignRepository {
    pool: SqlitePool,
}

impl SqliteCampaignRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn decode(data: &str) -> OrchestratorResult<Campaign> {
        serde_json::from_str(data).map_err(OrchestratorError::from)
    }
}

fn state_as_str(state: CampaignState) -> &'static str {
    match state {
        CampaignState::Draft => "draft",
        CampaignState::Active => "active",
        CampaignState::Paused => "paused",
        CampaignState::Completed => "completed",
        CampaignState::Failed => "failed",
    }
}

#[async_trait]
impl CampaignRepository for SqliteCampaignRepository {
    async fn create(&self, campaign: &Campaign) -> OrchestratorResult<()> {
        let data = serde_json::to_string(campaign)?;
        sqlx::query("INSERT INTO campaigns (id, state, created_at, data) VALUES (?, ?, ?, ?)")
            .bind(campaign.id.to_string())
            .bind(state_as_str(campaign.state))
            .bind(campaign.created_at.to_rfc3339())
            .bind(&data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> OrchestratorResult<Option<Campaign>> {
        let row = sqlx::query("SELECT data FROM campaigns WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Self::decode(r.get::<String, _>("data").as_str())).transpose()
    }

    async fn update(&self, campaign: &Campaign) -> OrchestratorResult<()> {
        let data = serde_json::to_string(campaign)?;
        let result = sqlx::query("UPDATE campaigns SET state = ?, data = ? WHERE id = ?")
            .bind(state_as_str(campaign.state))
            .bind(&data)
            .bind(campaign.id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(OrchestratorError::not_found("campaign", campaign.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> OrchestratorResult<()> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(OrchestratorError::not_found("campaign", id));
        }
        Ok(())
    }

    async fn list(&self, filter: CampaignFilter) -> OrchestratorResult<Vec<Campaign>> {
        let mut query = String::from("SELECT data FROM campaigns WHERE 1=1");
        if filter.state.is_some() {
            query.push_str(" AND state = ?");
        }
        query.push_str(" ORDER BY created_at ASC");

        let mut q = sqlx::query(&query);
        if let Some(state) = filter.state {
            q = q.bind(state_as_str(state));
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|r| Self::decode(r.get::<String, _>("data").as_str()))
            .collect()
    }

    async fn count_active(&self) -> OrchestratorResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) as n FROM campaigns WHERE state = 'active'")
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
    use crate::domain::models::{CampaignConfig, CampaignMode};

    async fn repo() -> SqliteCampaignRepository {
        let pool = create_test_pool().await.unwrap();
        Migrator::new(pool.clone())
            .run_embedded_migrations(all_embedded_migrations())
            .await
            .unwrap();
        SqliteCampaignRepository::new(pool)
    }

    fn sample_campaign() -> Campaign {
        Campaign::new(CampaignConfig {
            name: "launch".into(),
            target_token: "mint1".into(),
            target_volume_24h: 100_000,
            target_tx_count_24h: 500,
            duration_hours: 24,
            bot_count: 10,
            mode: CampaignMode::Moderate,
            wallet_tag: None,
            wallet_funding_amount: 10_000,
        })
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let repo = repo().await;
        let campaign = sample_campaign();
        repo.create(&campaign).await.unwrap();

        let fetched = repo.get(campaign.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, campaign.id);
        assert_eq!(fetched.config.name, "launch");
    }

    #[tokio::test]
    async fn count_active_only_counts_active_state() {
        let repo = repo().await;
        let mut campaign = sample_campaign();
        repo.create(&campaign).await.unwrap();
        assert_eq!(repo.count_active().await.unwrap(), 0);

        campaign.state = CampaignState::Active;
        repo.update(&campaign).await.unwrap();
        assert_eq!(repo.count_active().await.unwrap(), 1);
    }
}
