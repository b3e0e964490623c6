//! Trading bot domain model (spec §4.5, §3 `BotConfig`/`BotStatus`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::behavior_profile::ProfileName;

/// What a bot is trying to accomplish; biases buy/sell draws (spec §4.5 step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotMode {
    Volume,
    MarketMake,
    Accumulate,
    Distribute,
}

/// Immutable identity fields plus mutable cadence/sizing parameters for a bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub wallet_id: String,
    pub target_token: String,
    pub mode: BotMode,
    pub min_trade_size: u64,
    pub max_trade_size: u64,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub buy_probability: f64,
    pub max_daily_trades: u64,
    pub max_daily_volume: u64,
    pub enabled: bool,
    pub profile: ProfileName,
}

impl BotConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.buy_probability) {
            return Err("buy_probability must be in [0, 1]".into());
        }
        if self.min_trade_size > self.max_trade_size {
            return Err("min_trade_size must be <= max_trade_size".into());
        }
        if self.min_interval_ms > self.max_interval_ms {
            return Err("min_interval_ms must be <= max_interval_ms".into());
        }
        if self.max_trade_size == 0 {
            return Err("max_trade_size must be > 0".into());
        }
        Ok(())
    }
}

/// Bot lifecycle state (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotState {
    Idle,
    Running,
    Paused,
    Stopped,
    Error,
}

impl Default for BotState {
    fn default() -> Self {
        Self::Idle
    }
}

impl BotState {
    pub fn valid_transitions(&self) -> &'static [BotState] {
        match self {
            Self::Idle => &[Self::Running],
            Self::Running => &[Self::Paused, Self::Stopped, Self::Error],
            Self::Paused => &[Self::Running, Self::Stopped, Self::Error],
            Self::Stopped => &[],
            Self::Error => &[Self::Idle],
        }
    }

    pub fn can_transition_to(&self, new_state: Self) -> bool {
        self.valid_transitions().contains(&new_state)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Mutable runtime status tracked alongside a bot (spec §3 `BotStatus`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotStatus {
    pub state: BotState,
    pub trades_completed: u64,
    pub volume_generated: u64,
    pub trades_today: u64,
    pub volume_today: u64,
    pub errors: Vec<String>,
    pub last_active: Option<DateTime<Utc>>,
    pub wallet_id: String,
    pub campaign_id: Option<Uuid>,
    /// UTC date of the last daily-counter reset, for midnight rollover
    /// (spec §9 "date-based daily caps must be deterministic and testable").
    pub counters_date: chrono::NaiveDate,
}

impl BotStatus {
    pub fn new(wallet_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            state: BotState::Idle,
            trades_completed: 0,
            volume_generated: 0,
            trades_today: 0,
            volume_today: 0,
            errors: Vec::new(),
            last_active: None,
            wallet_id: wallet_id.into(),
            campaign_id: None,
            counters_date: now.date_naive(),
        }
    }

    /// Roll the daily counters over if `now` has crossed into a new UTC day.
    pub fn roll_daily_counters_if_needed(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if today != self.counters_date {
            self.trades_today = 0;
            self.volume_today = 0;
            self.counters_date = today;
        }
    }

    pub fn record_trade(&mut self, amount: u64, now: DateTime<Utc>) {
        self.roll_daily_counters_if_needed(now);
        self.trades_completed += 1;
        self.volume_generated += amount;
        self.trades_today += 1;
        self.volume_today += amount;
        self.last_active = Some(now);
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Last `k` outcomes considered failures, for the anti-detection
    /// back-off rule (spec §4.2). `errors` only records failures, so this is
    /// simply whether the tail of the error log is dense enough; the actual
    /// windowing over interleaved successes is done by the caller which
    /// tracks a rolling outcome buffer, not this log.
    pub fn recent_error_count(&self, window: usize) -> usize {
        self.errors.len().min(window)
    }

    pub fn daily_caps_reached(&self, config: &BotConfig) -> bool {
        self.trades_today >= config.max_daily_trades || self.volume_today >= config.max_daily_volume
    }
}
