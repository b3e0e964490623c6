//! Volume campaign domain model (spec §4.7, §3 `Campaign`/`CampaignConfig`/
//! `CampaignMetrics`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignMode {
    Aggressive,
    Moderate,
    Stealth,
}

impl CampaignMode {
    /// Interval band in milliseconds (spec §4.8).
    pub fn interval_band_ms(&self) -> (u64, u64) {
        match self {
            Self::Aggressive => (5_000, 60_000),
            Self::Moderate => (15_000, 300_000),
            Self::Stealth => (60_000, 900_000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub name: String,
    pub target_token: String,
    pub target_volume_24h: u64,
    pub target_tx_count_24h: u64,
    pub duration_hours: u32,
    pub bot_count: u32,
    pub mode: CampaignMode,
    pub wallet_tag: Option<String>,
    pub wallet_funding_amount: u64,
}

impl CampaignConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.bot_count == 0 {
            return Err("bot_count must be > 0".into());
        }
        if self.target_volume_24h == 0 {
            return Err("target_volume_24h must be > 0".into());
        }
        if self.duration_hours == 0 {
            return Err("duration_hours must be > 0".into());
        }
        Ok(())
    }

    /// Per-bot daily trade cap derived from the campaign target (spec §4.8).
    pub fn per_bot_max_daily_trades(&self) -> u64 {
        self.target_tx_count_24h.div_ceil(u64::from(self.bot_count))
    }

    /// Per-bot daily volume cap derived from the campaign target (spec §4.8).
    pub fn per_bot_max_daily_volume(&self) -> u64 {
        self.target_volume_24h / u64::from(self.bot_count)
    }

    /// Trade size band derived from wallet funding amount (spec §4.8):
    /// `[funding/100, funding/10]`.
    pub fn trade_size_band(&self) -> (u64, u64) {
        (
            (self.wallet_funding_amount / 100).max(1),
            (self.wallet_funding_amount / 10).max(1),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignState {
    Draft,
    Active,
    Paused,
    Completed,
    Failed,
}

impl Default for CampaignState {
    fn default() -> Self {
        Self::Draft
    }
}

impl CampaignState {
    pub fn valid_transitions(&self) -> &'static [CampaignState] {
        match self {
            Self::Draft => &[Self::Active, Self::Failed],
            Self::Active => &[Self::Paused, Self::Completed, Self::Failed],
            Self::Paused => &[Self::Active, Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => &[],
        }
    }

    pub fn can_transition_to(&self, new_state: Self) -> bool {
        self.valid_transitions().contains(&new_state)
    }
}

/// Which target-reached category has already fired, so a retracting counter
/// (spec §4.7 "do not fire again if counter retracts") never re-fires.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetsFired {
    pub volume: bool,
    pub transactions: bool,
    pub time: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignMetrics {
    pub total_volume: u64,
    pub buy_volume: u64,
    pub sell_volume: u64,
    pub tx_count: u64,
    pub unique_wallets: HashSet<String>,
    pub total_fees: u64,
    pub success_count: u64,
    pub failure_count: u64,
    /// Trade ids already folded in, enforcing "exactly once" idempotency
    /// (spec §3 invariant, §8 property 2).
    pub applied_trade_ids: HashSet<Uuid>,
}

impl CampaignMetrics {
    pub fn avg_trade_size(&self) -> f64 {
        if self.tx_count == 0 {
            0.0
        } else {
            self.total_volume as f64 / self.tx_count as f64
        }
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.success_count + self.failure_count;
        if total == 0 {
            1.0
        } else {
            self.success_count as f64 / total as f64
        }
    }

    pub fn progress_percent(&self, target_volume_24h: u64) -> f64 {
        if target_volume_24h == 0 {
            0.0
        } else {
            (100.0 * self.total_volume as f64 / target_volume_24h as f64).min(100.0)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub config: CampaignConfig,
    pub state: CampaignState,
    /// Exclusive set of bot ids owned for aggregate accounting (spec §3
    /// invariant: no duplicates).
    pub bot_ids: Vec<Uuid>,
    pub metrics: CampaignMetrics,
    pub targets_fired: TargetsFired,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Campaign {
    pub fn new(config: CampaignConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            state: CampaignState::Draft,
            bot_ids: Vec::new(),
            metrics: CampaignMetrics::default(),
            targets_fired: TargetsFired::default(),
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    pub fn add_bot(&mut self, bot_id: Uuid) {
        if !self.bot_ids.contains(&bot_id) {
            self.bot_ids.push(bot_id);
        }
    }

    pub fn remove_bot(&mut self, bot_id: Uuid) {
        self.bot_ids.retain(|id| *id != bot_id);
    }

    pub fn elapsed_hours(&self, now: DateTime<Utc>) -> f64 {
        match self.started_at {
            Some(started) => (now - started).num_seconds() as f64 / 3600.0,
            None => 0.0,
        }
    }

    /// Fold a completed trade into the aggregate metrics, exactly once per
    /// `trade_id` (spec §3 invariant, §8 property 2: a campaign's metrics
    /// never double-count a trade).
    #[allow(clippy::too_many_arguments)]
    pub fn record_trade(
        &mut self,
        trade_id: Uuid,
        wallet_id: &str,
        side: super::task::TradeSide,
        amount: u64,
        fees: u64,
        success: bool,
    ) -> bool {
        if !self.metrics.applied_trade_ids.insert(trade_id) {
            return false;
        }
        if success {
            self.metrics.total_volume += amount;
            match side {
                super::task::TradeSide::Buy => self.metrics.buy_volume += amount,
                super::task::TradeSide::Sell => self.metrics.sell_volume += amount,
            }
            self.metrics.tx_count += 1;
            self.metrics.total_fees += fees;
            self.metrics.success_count += 1;
            self.metrics.unique_wallets.insert(wallet_id.to_string());
        } else {
            self.metrics.failure_count += 1;
        }
        true
    }

    /// Evaluate target-reached thresholds against current metrics,
    /// returning the categories newly crossed this call (spec §4.7: a
    /// retracting counter never re-fires once a category has latched).
    pub fn newly_reached_targets(&mut self, now: DateTime<Utc>) -> Vec<TargetKindFlag> {
        let mut reached = Vec::new();
        if !self.targets_fired.volume && self.metrics.total_volume >= self.config.target_volume_24h {
            self.targets_fired.volume = true;
            reached.push(TargetKindFlag::Volume);
        }
        if !self.targets_fired.transactions && self.metrics.tx_count >= self.config.target_tx_count_24h {
            self.targets_fired.transactions = true;
            reached.push(TargetKindFlag::Transactions);
        }
        if !self.targets_fired.time && self.elapsed_hours(now) >= f64::from(self.config.duration_hours) {
            self.targets_fired.time = true;
            reached.push(TargetKindFlag::Time);
        }
        reached
    }
}

/// Which target category was newly crossed (spec §4.7); distinct from
/// `TargetsFired`'s latch bits so callers can react to the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKindFlag {
    Volume,
    Transactions,
    Time,
}
