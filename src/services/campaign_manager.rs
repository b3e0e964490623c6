//! Campaign Manager (spec §4.8): materializes a swarm of bots for a volume
//! campaign, derives their per-bot caps from the campaign's targets, and
//! folds worker-reported trades into the campaign's aggregate metrics.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::{
    BotConfig, BotMode, Campaign, CampaignConfig, CampaignState, ProfileName, TaskPayload,
    TradeSide,
};
use crate::domain::ports::{CampaignFilter, CampaignRepository};

use super::bot_coordinator::BotCoordinator;
use super::event_bus::{EventBus, OrchestratorEvent, TargetKind};

pub struct CampaignManagerConfig {
    pub max_concurrent_campaigns: u64,
}

impl Default for CampaignManagerConfig {
    fn default() -> Self {
        Self { max_concurrent_campaigns: 20 }
    }
}

/// Aggregate figures across every campaign the manager is tracking (spec
/// §4.8 `get_aggregate_stats`).
#[derive(Debug, Clone, Default)]
pub struct CampaignStats {
    pub active_campaigns: u64,
    pub total_volume: u64,
    pub total_tx_count: u64,
    pub total_bots: u64,
}

pub struct CampaignManager {
    repo: Arc<dyn CampaignRepository>,
    coordinator: Arc<BotCoordinator>,
    events: Arc<EventBus>,
    config: CampaignManagerConfig,
}

impl CampaignManager {
    pub fn new(
        repo: Arc<dyn CampaignRepository>,
        coordinator: Arc<BotCoordinator>,
        events: Arc<EventBus>,
        config: CampaignManagerConfig,
    ) -> Self {
        Self {
            repo,
            coordinator,
            events,
            config,
        }
    }

    /// Create a campaign and materialize its bot swarm (spec §4.8): derive
    /// per-bot trade/volume caps and interval/size bands from the campaign
    /// config, create one bot per `bot_count` via the Coordinator, and
    /// attach them.
    #[instrument(skip(self, campaign_config, wallet_ids), err)]
    pub async fn create_campaign(
        &self,
        campaign_config: CampaignConfig,
        wallet_ids: Vec<String>,
    ) -> OrchestratorResult<Uuid> {
        campaign_config
            .validate()
            .map_err(OrchestratorError::Validation)?;
        if wallet_ids.len() != campaign_config.bot_count as usize {
            return Err(OrchestratorError::Validation(format!(
                "expected {} wallet ids for bot_count, got {}",
                campaign_config.bot_count,
                wallet_ids.len()
            )));
        }
        let active = self.repo.count_active().await?;
        if active >= self.config.max_concurrent_campaigns {
            return Err(OrchestratorError::CapacityExceeded(format!(
                "max_concurrent_campaigns ({}) reached",
                self.config.max_concurrent_campaigns
            )));
        }

        let (min_interval_ms, max_interval_ms) = campaign_config.mode.interval_band_ms();
        let (min_trade_size, max_trade_size) = campaign_config.trade_size_band();
        let max_daily_trades = campaign_config.per_bot_max_daily_trades();
        let max_daily_volume = campaign_config.per_bot_max_daily_volume();
        let target_token = campaign_config.target_token.clone();

        let mut campaign = Campaign::new(campaign_config);
        self.repo.create(&campaign).await?;

        let base_config = BotConfig {
            wallet_id: String::new(),
            target_token,
            mode: BotMode::Volume,
            min_trade_size,
            max_trade_size,
            min_interval_ms,
            max_interval_ms,
            buy_probability: 0.5,
            max_daily_trades,
            max_daily_volume,
            enabled: true,
            profile: ProfileName::Retail,
        };

        let bot_ids = self
            .coordinator
            .create_bot_swarm(&base_config, wallet_ids, None)
            .await?;
        for bot_id in &bot_ids {
            campaign.add_bot(*bot_id);
        }
        self.repo.update(&campaign).await?;
        Ok(campaign.id)
    }

    #[instrument(skip(self), err)]
    pub async fn start(&self, id: Uuid) -> OrchestratorResult<()> {
        let mut campaign = self.get(id).await?;
        self.transition(&mut campaign, CampaignState::Active)?;
        campaign.started_at.get_or_insert(Utc::now());
        self.repo.update(&campaign).await?;
        for bot_id in campaign.bot_ids.clone() {
            self.coordinator.start_bot(bot_id).await?;
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn pause(&self, id: Uuid) -> OrchestratorResult<()> {
        let mut campaign = self.get(id).await?;
        self.transition(&mut campaign, CampaignState::Paused)?;
        self.repo.update(&campaign).await?;
        for bot_id in campaign.bot_ids.clone() {
            self.coordinator.pause_bot(bot_id).await?;
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn stop(&self, id: Uuid) -> OrchestratorResult<()> {
        let mut campaign = self.get(id).await?;
        self.transition(&mut campaign, CampaignState::Completed)?;
        campaign.ended_at = Some(Utc::now());
        self.repo.update(&campaign).await?;
        for bot_id in campaign.bot_ids.clone() {
            self.coordinator.stop_bot(bot_id).await?;
        }
        Ok(())
    }

    fn transition(&self, campaign: &mut Campaign, to: CampaignState) -> OrchestratorResult<()> {
        if !campaign.state.can_transition_to(to) {
            return Err(OrchestratorError::state_conflict(
                "campaign",
                campaign.id,
                format!("cannot transition {:?} -> {:?}", campaign.state, to),
            ));
        }
        let from = campaign.state;
        campaign.state = to;
        self.events.publish(OrchestratorEvent::CampaignStateChanged {
            campaign_id: campaign.id,
            from,
            to,
        });
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn get_status(&self, id: Uuid) -> OrchestratorResult<CampaignState> {
        Ok(self.get(id).await?.state)
    }

    #[instrument(skip(self), err)]
    pub async fn get_metrics(&self, id: Uuid) -> OrchestratorResult<Campaign> {
        self.get(id).await
    }

    /// Propagate a size/interval/bot-count adjustment to every bot in the
    /// campaign (spec §4.8 `adjust_params`). Bot count deltas are applied
    /// via the Coordinator (not modeled here: the caller supplies fresh
    /// wallet ids for `add_bots > 0` through `grow`).
    #[instrument(skip(self), err)]
    pub async fn adjust_params(
        &self,
        id: Uuid,
        interval_delta_pct: f64,
        size_delta_pct: f64,
    ) -> OrchestratorResult<()> {
        let campaign = self.get(id).await?;
        for bot_id in &campaign.bot_ids {
            let bot_id = *bot_id;
            self.coordinator
                .update_bot_config(bot_id, |config| {
                    config.min_interval_ms =
                        scale(config.min_interval_ms, interval_delta_pct);
                    config.max_interval_ms =
                        scale(config.max_interval_ms, interval_delta_pct);
                    config.min_trade_size = scale(config.min_trade_size, size_delta_pct);
                    config.max_trade_size = scale(config.max_trade_size, size_delta_pct);
                })
                .await?;
        }
        Ok(())
    }

    /// Remove `count` bots from the campaign (spec §4.9 "remove bots"):
    /// stops and detaches the most recently added bots first.
    #[instrument(skip(self), err)]
    pub async fn shrink(&self, id: Uuid, count: u32) -> OrchestratorResult<()> {
        let mut campaign = self.get(id).await?;
        for _ in 0..count {
            let Some(bot_id) = campaign.bot_ids.pop() else { break };
            self.coordinator.stop_bot(bot_id).await?;
            self.coordinator.remove(bot_id).await?;
        }
        self.repo.update(&campaign).await
    }

    #[instrument(skip(self), err)]
    pub async fn remove(&self, id: Uuid) -> OrchestratorResult<()> {
        let campaign = self.get(id).await?;
        for bot_id in campaign.bot_ids {
            let _ = self.coordinator.stop_bot(bot_id).await;
            self.coordinator.remove(bot_id).await?;
        }
        self.repo.delete(id).await
    }

    /// Fold a worker-reported trade outcome into the campaign's aggregate
    /// metrics exactly once (spec §3 invariant, §8 property 2), and emit
    /// `TargetReached` for any category newly crossed.
    #[instrument(skip(self), err)]
    pub async fn record_trade(
        &self,
        id: Uuid,
        trade_id: Uuid,
        wallet_id: &str,
        side: TradeSide,
        amount: u64,
        fees: u64,
        success: bool,
        now: DateTime<Utc>,
    ) -> OrchestratorResult<()> {
        let mut campaign = self.get(id).await?;
        if !campaign.record_trade(trade_id, wallet_id, side, amount, fees, success) {
            return Ok(());
        }
        for kind in campaign.newly_reached_targets(now) {
            self.events.publish(OrchestratorEvent::TargetReached {
                campaign_id: id,
                kind: match kind {
                    crate::domain::models::TargetKindFlag::Volume => TargetKind::Volume,
                    crate::domain::models::TargetKindFlag::Transactions => {
                        TargetKind::Transactions
                    }
                    crate::domain::models::TargetKindFlag::Time => TargetKind::Time,
                },
            });
        }
        self.repo.update(&campaign).await
    }

    #[instrument(skip(self), err)]
    pub async fn get_aggregate_stats(&self) -> OrchestratorResult<CampaignStats> {
        let campaigns = self
            .repo
            .list(CampaignFilter { state: Some(CampaignState::Active) })
            .await?;
        let mut stats = CampaignStats {
            active_campaigns: campaigns.len() as u64,
            ..Default::default()
        };
        for campaign in &campaigns {
            stats.total_volume += campaign.metrics.total_volume;
            stats.total_tx_count += campaign.metrics.tx_count;
            stats.total_bots += campaign.bot_ids.len() as u64;
        }
        Ok(stats)
    }

    async fn get(&self, id: Uuid) -> OrchestratorResult<Campaign> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| OrchestratorError::not_found("campaign", id))
    }

    /// List campaigns matching `filter` (CLI `campaign list`).
    pub async fn list(&self, filter: CampaignFilter) -> OrchestratorResult<Vec<Campaign>> {
        self.repo.list(filter).await
    }
}

/// Build a synthetic `Task` payload for a campaign-driven manual swap
/// (primarily used by tests and the CLI's ad-hoc trigger command).
pub fn manual_swap_payload(wallet_id: String, token_mint: String, side: TradeSide, amount: u64) -> TaskPayload {
    TaskPayload::Swap {
        wallet_id,
        token_mint,
        side,
        amount,
        slippage_bps: 100,
        priority_fee: None,
        memo: None,
    }
}

fn scale(value: u64, delta_pct: f64) -> u64 {
    let scaled = value as f64 * (1.0 + delta_pct / 100.0);
    scaled.max(1.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CampaignMode, Task, TaskStatus};
    use crate::domain::ports::{BotFilter, BotRecord, BotRepository, TaskFilter, TaskRepository};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct InMemoryTasks {
        records: RwLock<HashMap<Uuid, Task>>,
    }

    #[async_trait]
    impl TaskRepository for InMemoryTasks {
        async fn create(&self, task: &Task) -> OrchestratorResult<()> {
            self.records.write().await.insert(task.id, task.clone());
            Ok(())
        }
        async fn get(&self, id: Uuid) -> OrchestratorResult<Option<Task>> {
            Ok(self.records.read().await.get(&id).cloned())
        }
        async fn update(&self, task: &Task) -> OrchestratorResult<()> {
            self.records.write().await.insert(task.id, task.clone());
            Ok(())
        }
        async fn delete(&self, id: Uuid) -> OrchestratorResult<()> {
            self.records.write().await.remove(&id);
            Ok(())
        }
        async fn list(&self, _filter: TaskFilter) -> OrchestratorResult<Vec<Task>> {
            Ok(self.records.read().await.values().cloned().collect())
        }
        async fn claim_next_pending(&self) -> OrchestratorResult<Option<Task>> {
            Ok(None)
        }
        async fn get_by_idempotency_key(&self, _key: &str) -> OrchestratorResult<Option<Task>> {
            Ok(None)
        }
        async fn count_by_status(&self) -> OrchestratorResult<HashMap<TaskStatus, u64>> {
            Ok(HashMap::new())
        }
    }

    #[derive(Default)]
    struct InMemoryBots {
        records: RwLock<HashMap<Uuid, BotRecord>>,
    }

    #[async_trait]
    impl BotRepository for InMemoryBots {
        async fn create(&self, bot: &BotRecord) -> OrchestratorResult<()> {
            self.records.write().await.insert(bot.id, bot.clone());
            Ok(())
        }
        async fn get(&self, id: Uuid) -> OrchestratorResult<Option<BotRecord>> {
            Ok(self.records.read().await.get(&id).cloned())
        }
        async fn update(&self, bot: &BotRecord) -> OrchestratorResult<()> {
            self.records.write().await.insert(bot.id, bot.clone());
            Ok(())
        }
        async fn delete(&self, id: Uuid) -> OrchestratorResult<()> {
            self.records.write().await.remove(&id);
            Ok(())
        }
        async fn list(&self, filter: BotFilter) -> OrchestratorResult<Vec<BotRecord>> {
            Ok(self
                .records
                .read()
                .await
                .values()
                .filter(|b| filter.state.is_none_or(|s| b.status.state == s))
                .cloned()
                .collect())
        }
        async fn count_by_state(&self, state: crate::domain::models::BotState) -> OrchestratorResult<u64> {
            Ok(self.records.read().await.values().filter(|b| b.status.state == state).count() as u64)
        }
    }

    #[derive(Default)]
    struct InMemoryCampaigns {
        records: RwLock<HashMap<Uuid, Campaign>>,
    }

    #[async_trait]
    impl CampaignRepository for InMemoryCampaigns {
        async fn create(&self, campaign: &Campaign) -> OrchestratorResult<()> {
            self.records.write().await.insert(campaign.id, campaign.clone());
            Ok(())
        }
        async fn get(&self, id: Uuid) -> OrchestratorResult<Option<Campaign>> {
            Ok(self.records.read().await.get(&id).cloned())
        }
        async fn update(&self, campaign: &Campaign) -> OrchestratorResult<()> {
            self.records.write().await.insert(campaign.id, campaign.clone());
            Ok(())
        }
        async fn delete(&self, id: Uuid) -> OrchestratorResult<()> {
            self.records.write().await.remove(&id);
            Ok(())
        }
        async fn list(&self, filter: CampaignFilter) -> OrchestratorResult<Vec<Campaign>> {
            Ok(self
                .records
                .read()
                .await
                .values()
                .filter(|c| filter.state.is_none_or(|s| c.state == s))
                .cloned()
                .collect())
        }
        async fn count_active(&self) -> OrchestratorResult<u64> {
            Ok(self
                .records
                .read()
                .await
                .values()
                .filter(|c| c.state == CampaignState::Active)
                .count() as u64)
        }
    }

    fn sample_config(bot_count: u32) -> CampaignConfig {
        CampaignConfig {
            name: "test".into(),
            target_token: "MINT".into(),
            target_volume_24h: 1_000_000,
            target_tx_count_24h: 100,
            duration_hours: 24,
            bot_count,
            mode: CampaignMode::Moderate,
            wallet_tag: None,
            wallet_funding_amount: 10_000_000,
        }
    }

    async fn manager() -> CampaignManager {
        let bots = Arc::new(InMemoryBots::default());
        let campaigns: Arc<dyn CampaignRepository> = Arc::new(InMemoryCampaigns::default());
        let engine = Arc::new(crate::services::randomization::RandomizationEngine::seeded(1));
        let tasks: Arc<dyn TaskRepository> = Arc::new(InMemoryTasks::default());
        let queue = Arc::new(super::super::task_queue::TaskQueueService::new(tasks, Default::default()));
        let coordinator = Arc::new(BotCoordinator::new(bots, queue, engine, Default::default()));
        let events = Arc::new(EventBus::default());
        CampaignManager::new(campaigns, coordinator, events, CampaignManagerConfig::default())
    }

    #[tokio::test]
    async fn create_campaign_materializes_one_bot_per_wallet() {
        let manager = manager().await;
        let id = manager
            .create_campaign(sample_config(3), vec!["w1".into(), "w2".into(), "w3".into()])
            .await
            .unwrap();
        let campaign = manager.get_metrics(id).await.unwrap();
        assert_eq!(campaign.bot_ids.len(), 3);
    }

    #[tokio::test]
    async fn record_trade_is_idempotent_per_trade_id() {
        let manager = manager().await;
        let id = manager
            .create_campaign(sample_config(1), vec!["w1".into()])
            .await
            .unwrap();
        let trade_id = Uuid::new_v4();
        manager
            .record_trade(id, trade_id, "w1", TradeSide::Buy, 1_000, 10, true, Utc::now())
            .await
            .unwrap();
        manager
            .record_trade(id, trade_id, "w1", TradeSide::Buy, 1_000, 10, true, Utc::now())
            .await
            .unwrap();
        let campaign = manager.get_metrics(id).await.unwrap();
        assert_eq!(campaign.metrics.total_volume, 1_000);
        assert_eq!(campaign.metrics.tx_count, 1);
    }

    #[tokio::test]
    async fn mismatched_wallet_count_is_rejected() {
        let manager = manager().await;
        let result = manager.create_campaign(sample_config(2), vec!["w1".into()]).await;
        assert!(result.is_err());
    }
}
