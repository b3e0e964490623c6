//! Repository port for campaign persistence (spec §4.7, §4.8).

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::OrchestratorResult;
use crate::domain::models::{Campaign, CampaignState};

#[derive(Debug, Default)]
pub struct CampaignFilter {
    pub state: Option<CampaignState>,
}

#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn create(&self, campaign: &Campaign) -> OrchestratorResult<()>;

    async fn get(&self, id: Uuid) -> OrchestratorResult<Option<Campaign>>;

    async fn update(&self, campaign: &Campaign) -> OrchestratorResult<()>;

    async fn delete(&self, id: Uuid) -> OrchestratorResult<()>;

    async fn list(&self, filter: CampaignFilter) -> OrchestratorResult<Vec<Campaign>>;

    async fn count_active(&self) -> OrchestratorResult<u64>;
}
