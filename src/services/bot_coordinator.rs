//! Bot Coordinator (spec §4.6): owns the fleet of bots, enforces
//! fleet-wide concurrency, batched swarm creation, and graceful shutdown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::{BehaviorProfile, BotConfig, BotState, BotStatus, ProfileName, TradeSide};
use crate::domain::ports::{BotFilter, BotRecord, BotRepository, TaskRepository};

use super::anti_detection::OutcomeWindow;
use super::bot;
use super::randomization::RandomizationEngine;
use super::task_queue::TaskQueueService;

/// Per-bot tick bookkeeping that is not part of the durable `BotStatus`
/// record (spec §9 "ambient singletons become explicit dependencies" — the
/// coordinator, not the bot record, owns this transient state).
#[derive(Default)]
struct BotRuntime {
    outcomes: OutcomeWindow,
    last_side: Option<TradeSide>,
    next_fire_at: Option<chrono::DateTime<chrono::Utc>>,
    in_flight: bool,
}

pub struct CoordinatorConfig {
    pub max_concurrent_bots: usize,
    pub error_streak_window: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_bots: 200,
            error_streak_window: 10,
        }
    }
}

/// Owns every `Bot` in the system. Campaigns reference bots by id only
/// (spec §3 "Ownership"): the coordinator is the exclusive mutator.
pub struct BotCoordinator {
    repo: Arc<dyn BotRepository>,
    queue: Arc<TaskQueueService>,
    engine: Arc<RandomizationEngine>,
    config: CoordinatorConfig,
    runtime: RwLock<HashMap<Uuid, BotRuntime>>,
}

impl BotCoordinator {
    pub fn new(
        repo: Arc<dyn BotRepository>,
        queue: Arc<TaskQueueService>,
        engine: Arc<RandomizationEngine>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            repo,
            queue,
            engine,
            config,
            runtime: RwLock::new(HashMap::new()),
        }
    }

    #[instrument(skip(self), err)]
    pub async fn create_bot(&self, config: BotConfig) -> OrchestratorResult<Uuid> {
        config.validate().map_err(OrchestratorError::Validation)?;
        let id = Uuid::new_v4();
        let status = BotStatus::new(config.wallet_id.clone(), chrono::Utc::now());
        let record = BotRecord { id, config, status };
        self.repo.create(&record).await?;
        self.runtime.write().await.insert(id, BotRuntime::default());
        Ok(id)
    }

    /// Batch-create a swarm of `count` bots sharing `base_config`, with
    /// distinct wallet ids supplied by `wallet_ids` and profiles drawn from
    /// `weights` (default: spec §4.6's 70/20/10 retail/whale/market-maker
    /// split).
    #[instrument(skip(self, base_config, wallet_ids, weights), err)]
    pub async fn create_bot_swarm(
        &self,
        base_config: &BotConfig,
        wallet_ids: Vec<String>,
        weights: Option<&[(ProfileName, f64)]>,
    ) -> OrchestratorResult<Vec<Uuid>> {
        let weights = weights.unwrap_or_else(|| BehaviorProfile::default_swarm_weights());
        let (names, probs): (Vec<ProfileName>, Vec<f64>) = weights.iter().cloned().unzip();
        let mut ids = Vec::with_capacity(wallet_ids.len());
        for wallet_id in wallet_ids {
            let profile = *self.engine.weighted_choice(&names, &probs);
            let config = BotConfig {
                wallet_id,
                profile,
                ..base_config.clone()
            };
            ids.push(self.create_bot(config).await?);
        }
        Ok(ids)
    }

    async fn get_record(&self, id: Uuid) -> OrchestratorResult<BotRecord> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| OrchestratorError::not_found("bot", id))
    }

    #[instrument(skip(self), err)]
    pub async fn start_bot(&self, id: Uuid) -> OrchestratorResult<()> {
        let running = self.repo.count_by_state(BotState::Running).await?;
        if running >= self.config.max_concurrent_bots as u64 {
            return Err(OrchestratorError::CapacityExceeded(format!(
                "max_concurrent_bots ({}) reached",
                self.config.max_concurrent_bots
            )));
        }
        let mut record = self.get_record(id).await?;
        bot::validate_transition(record.status.state, BotState::Running)
            .map_err(|e| OrchestratorError::state_conflict("bot", id, e))?;
        record.status.state = BotState::Running;
        self.repo.update(&record).await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn pause_bot(&self, id: Uuid) -> OrchestratorResult<()> {
        self.transition(id, BotState::Paused).await
    }

    #[instrument(skip(self), err)]
    pub async fn stop_bot(&self, id: Uuid) -> OrchestratorResult<()> {
        self.transition(id, BotState::Stopped).await
    }

    async fn transition(&self, id: Uuid, to: BotState) -> OrchestratorResult<()> {
        let mut record = self.get_record(id).await?;
        bot::validate_transition(record.status.state, to).map_err(|e| OrchestratorError::state_conflict("bot", id, e))?;
        record.status.state = to;
        self.repo.update(&record).await
    }

    #[instrument(skip(self), err)]
    pub async fn update_bot_config(&self, id: Uuid, mutate: impl FnOnce(&mut BotConfig)) -> OrchestratorResult<()> {
        let mut record = self.get_record(id).await?;
        mutate(&mut record.config);
        record.config.validate().map_err(OrchestratorError::Validation)?;
        self.repo.update(&record).await
    }

    #[instrument(skip(self), err)]
    pub async fn remove(&self, id: Uuid) -> OrchestratorResult<()> {
        self.repo.delete(id).await?;
        self.runtime.write().await.remove(&id);
        Ok(())
    }

    pub async fn get_bot_status(&self, id: Uuid) -> OrchestratorResult<BotStatus> {
        Ok(self.get_record(id).await?.status)
    }

    pub async fn list_bots(&self, filter: BotFilter) -> OrchestratorResult<Vec<BotRecord>> {
        self.repo.list(filter).await
    }

    pub async fn start_all(&self) -> OrchestratorResult<Vec<Uuid>> {
        let bots = self.repo.list(BotFilter::default()).await?;
        let mut started = Vec::new();
        for bot in bots {
            if self.start_bot(bot.id).await.is_ok() {
                started.push(bot.id);
            }
        }
        Ok(started)
    }

    pub async fn stop_all(&self) -> OrchestratorResult<()> {
        let bots = self.repo.list(BotFilter::default()).await?;
        for bot in bots {
            let _ = self.stop_bot(bot.id).await;
        }
        Ok(())
    }

    /// One scheduling step for every `running` bot whose `next_fire_at` is
    /// due: compute the tick outcome and either enqueue a swap or arm the
    /// next wait. Bots mid-flight (awaiting a worker callback) are skipped,
    /// preserving "a bot never has two in-flight" (spec §5).
    #[instrument(skip(self, profiles), err)]
    pub async fn drive_ticks(&self, profiles: &HashMap<ProfileName, BehaviorProfile>, now: chrono::DateTime<chrono::Utc>) -> OrchestratorResult<usize> {
        let running = self.repo.list(BotFilter { state: Some(BotState::Running), campaign_id: None }).await?;
        let mut to_enqueue = Vec::new();
        for record in running {
            let mut runtime = self.runtime.write().await;
            let rt = runtime.entry(record.id).or_default();
            if rt.in_flight {
                continue;
            }
            if let Some(next) = rt.next_fire_at {
                if next > now {
                    continue;
                }
            }
            let profile = profiles
                .get(&record.config.profile)
                .cloned()
                .unwrap_or_else(|| BehaviorProfile::catalog_entry(record.config.profile));
            let outcome = bot::tick(
                record.id,
                &record.config,
                &record.status,
                &profile,
                &self.engine,
                &rt.outcomes,
                rt.last_side,
                record.status.campaign_id,
                now,
            );
            match outcome {
                bot::TickOutcome::Wait { resume_at } => {
                    rt.next_fire_at = Some(resume_at);
                }
                bot::TickOutcome::EmitSwap { task, next_fire_at } => {
                    rt.next_fire_at = Some(next_fire_at);
                    rt.in_flight = true;
                    if let crate::domain::models::TaskPayload::Swap { side, .. } = &task.payload {
                        rt.last_side = Some(*side);
                    }
                    to_enqueue.push(task);
                }
            }
        }

        // Dispatch every swap emitted this tick concurrently rather than
        // one bot at a time: a fair scheduler gives each bot its own
        // share of event-loop time (spec §4.6), and no ordering across
        // bots is promised anyway (spec §5).
        let results = futures::future::join_all(to_enqueue.into_iter().map(|task| self.queue.enqueue(task))).await;
        let mut fired = 0;
        for result in results {
            result?;
            fired += 1;
        }
        Ok(fired)
    }

    /// Applied when a worker reports a swap outcome for `bot_id` (spec
    /// §4.5 step 6): updates counters, the error-streak window, and clears
    /// the in-flight flag so the next tick can fire.
    #[instrument(skip(self), err)]
    pub async fn record_trade_outcome(&self, bot_id: Uuid, amount: u64, success: bool, error: Option<String>) -> OrchestratorResult<()> {
        let mut record = self.get_record(bot_id).await?;
        let now = chrono::Utc::now();
        if success {
            record.status.record_trade(amount, now);
        } else if let Some(err) = error {
            record.status.record_error(err);
        }
        self.repo.update(&record).await?;

        let mut runtime = self.runtime.write().await;
        let rt = runtime.entry(bot_id).or_default();
        rt.outcomes.record(success);
        rt.in_flight = false;
        Ok(())
    }

    /// Signal every running bot to finish its current task and stop, with
    /// a deadline; bots exceeding the deadline are force-stopped and
    /// logged (spec §4.6, §8 property 10).
    #[instrument(skip(self))]
    pub async fn shutdown(&self, deadline: StdDuration) -> OrchestratorResult<()> {
        let running = self
            .repo
            .list(BotFilter {
                state: Some(BotState::Running),
                campaign_id: None,
            })
            .await?;
        for bot in &running {
            let _ = self.pause_bot(bot.id).await;
        }

        let wait_for_idle = async {
            loop {
                let runtime = self.runtime.read().await;
                let any_in_flight = running.iter().any(|b| runtime.get(&b.id).map(|rt| rt.in_flight).unwrap_or(false));
                drop(runtime);
                if !any_in_flight {
                    return;
                }
                tokio::time::sleep(StdDuration::from_millis(50)).await;
            }
        };

        if timeout(deadline, wait_for_idle).await.is_err() {
            warn!(bot_count = running.len(), "shutdown deadline exceeded, force-stopping bots");
        }
        for bot in running {
            let mut record = self.get_record(bot.id).await?;
            record.status.state = BotState::Stopped;
            self.repo.update(&record).await?;
            self.runtime.write().await.entry(bot.id).and_modify(|rt| rt.in_flight = false);
        }
        Ok(())
    }
}
