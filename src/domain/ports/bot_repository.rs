//! Repository port for bot persistence (spec §4.6 Bot Coordinator).

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::OrchestratorResult;
use crate::domain::models::{BotConfig, BotState, BotStatus};

#[derive(Debug, Default)]
pub struct BotFilter {
    pub state: Option<BotState>,
    pub campaign_id: Option<Uuid>,
}

/// A bot record as persisted: id, its (mostly immutable) config, and its
/// mutable runtime status.
#[derive(Debug, Clone)]
pub struct BotRecord {
    pub id: Uuid,
    pub config: BotConfig,
    pub status: BotStatus,
}

#[async_trait]
pub trait BotRepository: Send + Sync {
    async fn create(&self, bot: &BotRecord) -> OrchestratorResult<()>;

    async fn get(&self, id: Uuid) -> OrchestratorResult<Option<BotRecord>>;

    async fn update(&self, bot: &BotRecord) -> OrchestratorResult<()>;

    async fn delete(&self, id: Uuid) -> OrchestratorResult<()>;

    async fn list(&self, filter: BotFilter) -> OrchestratorResult<Vec<BotRecord>>;

    async fn count_by_state(&self, state: BotState) -> OrchestratorResult<u64>;
}
