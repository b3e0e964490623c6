//! Trading Bot tick logic (spec §4.5): the per-bot state machine's single
//! step. Kept as a pure function of `(config, status, profile, now)` so the
//! [`super::bot_coordinator::BotCoordinator`] owns all I/O (persistence,
//! enqueueing, clock) and this module owns only the decision.

use chrono::{DateTime, Timelike, Utc};
use uuid::Uuid;

use crate::domain::models::{
    BehaviorProfile, BotConfig, BotMode, BotState, BotStatus, Task, TaskPayload, TaskPriority, TradeSide,
};

use super::anti_detection::{AntiDetection, BackoffConfig, OutcomeWindow};
use super::randomization::RandomizationEngine;

/// What a tick decided to do. The coordinator applies exactly one of these.
pub enum TickOutcome {
    /// Bot is outside active hours, in cooldown, or past its daily cap;
    /// sleep until `resume_at` without emitting a task.
    Wait { resume_at: DateTime<Utc> },
    /// Emit a swap task and schedule the next tick at `next_fire_at`.
    EmitSwap { task: Task, next_fire_at: DateTime<Utc> },
}

/// Draw a side for the next trade, biased by bot mode (spec §4.5 step 3).
fn draw_side(mode: BotMode, buy_probability: f64, engine: &RandomizationEngine, last_side: Option<TradeSide>) -> TradeSide {
    let p = match mode {
        BotMode::Accumulate => (buy_probability + 0.25).min(0.95),
        BotMode::Distribute => (buy_probability - 0.25).max(0.05),
        BotMode::MarketMake => {
            // Alternate with a small random deviation rather than a flat
            // coin flip, so a market-maker's book stays roughly balanced.
            let flipped = last_side.map(TradeSide::flip).unwrap_or(TradeSide::Buy);
            let deviates = engine.coin(0.15);
            return if deviates { flipped.flip() } else { flipped };
        }
        BotMode::Volume => buy_probability,
    };
    if engine.coin(p) {
        TradeSide::Buy
    } else {
        TradeSide::Sell
    }
}

/// Midnight UTC strictly after `now`, for the daily-cap wait (spec §4.5
/// step 2).
fn next_midnight_utc(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive().succ_opt().unwrap_or(now.date_naive());
    tomorrow.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

/// Compute the next tick's outcome for a `running` bot.
///
/// `last_side` and `outcomes` carry the rolling state the coordinator keeps
/// per bot across ticks (last trade side for market-make alternation, and
/// the error-streak window for anti-detection back-off); they are not
/// persisted on [`BotStatus`] because they are tick-local bookkeeping, not
/// part of the spec's durable bot record.
#[allow(clippy::too_many_arguments)]
pub fn tick(
    bot_id: Uuid,
    config: &BotConfig,
    status: &BotStatus,
    profile: &BehaviorProfile,
    engine: &RandomizationEngine,
    outcomes: &OutcomeWindow,
    last_side: Option<TradeSide>,
    campaign_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> TickOutcome {
    let anti = AntiDetection::new(engine);

    // Step 1: anti-detection cooldown / outside active hours.
    if let Some(cooldown_ms) = anti.backoff_cooldown(outcomes, BackoffConfig::default()) {
        return TickOutcome::Wait {
            resume_at: now + chrono::Duration::milliseconds(cooldown_ms as i64),
        };
    }
    if !profile.active_hours.is_active_hour(now.hour(), 0.25) {
        let interval = anti.next_interval(
            config.min_interval_ms,
            config.max_interval_ms,
            profile.timing_distribution,
            &profile.active_hours,
            now,
        );
        return TickOutcome::Wait {
            resume_at: now + chrono::Duration::milliseconds(interval as i64),
        };
    }

    // Step 2: daily caps.
    if status.daily_caps_reached(config) {
        return TickOutcome::Wait {
            resume_at: next_midnight_utc(now),
        };
    }

    // Step 3-4: side and size.
    let side = draw_side(config.mode, config.buy_probability, engine, last_side);
    let size = anti.next_size(
        config.min_trade_size,
        config.max_trade_size,
        profile.size_distribution,
        &profile.active_hours,
        now,
    );

    // Step 5: build the swap task.
    let memo = anti.memo(profile);
    let payload = TaskPayload::Swap {
        wallet_id: config.wallet_id.clone(),
        token_mint: config.target_token.clone(),
        side,
        amount: size,
        slippage_bps: 100,
        priority_fee: None,
        memo,
    };
    let mut task = Task::new(payload, TaskPriority::Normal).with_wallet(config.wallet_id.clone()).with_bot(bot_id);
    if let Some(campaign_id) = campaign_id {
        task = task.with_campaign(campaign_id);
    }

    // Step 7: next interval.
    let interval = anti.next_interval(
        config.min_interval_ms,
        config.max_interval_ms,
        profile.timing_distribution,
        &profile.active_hours,
        now,
    );

    TickOutcome::EmitSwap {
        task,
        next_fire_at: now + chrono::Duration::milliseconds(interval as i64),
    }
}

/// Whether `from` may transition to `to` per spec §4.5's state diagram,
/// delegating to [`BotState::can_transition_to`] but named at the call site
/// the coordinator uses (`start_bot`, `pause_bot`, ...).
pub fn validate_transition(from: BotState, to: BotState) -> Result<(), String> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(format!("bot cannot transition from {from:?} to {to:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ProfileName;

    fn retail_config() -> BotConfig {
        BotConfig {
            wallet_id: "w1".into(),
            target_token: "MINT".into(),
            mode: BotMode::Volume,
            min_trade_size: 100,
            max_trade_size: 1_000,
            min_interval_ms: 1_000,
            max_interval_ms: 5_000,
            buy_probability: 0.6,
            max_daily_trades: 100,
            max_daily_volume: 1_000_000,
            enabled: true,
            profile: ProfileName::Retail,
        }
    }

    #[test]
    fn daily_cap_produces_wait_until_midnight() {
        let config = retail_config();
        let mut status = BotStatus::new("w1", Utc::now());
        status.trades_today = config.max_daily_trades;
        let profile = BehaviorProfile::catalog_entry(ProfileName::MarketMaker); // flat active hours
        let engine = RandomizationEngine::seeded(1);
        let outcomes = OutcomeWindow::new(10);
        let now = Utc::now();

        match tick(Uuid::new_v4(), &config, &status, &profile, &engine, &outcomes, None, None, now) {
            TickOutcome::Wait { resume_at } => assert!(resume_at > now),
            TickOutcome::EmitSwap { .. } => panic!("expected wait"),
        }
    }

    #[test]
    fn healthy_bot_emits_swap() {
        let config = retail_config();
        let status = BotStatus::new("w1", Utc::now());
        let profile = BehaviorProfile::catalog_entry(ProfileName::MarketMaker);
        let engine = RandomizationEngine::seeded(2);
        let outcomes = OutcomeWindow::new(10);
        let now = Utc::now();

        match tick(Uuid::new_v4(), &config, &status, &profile, &engine, &outcomes, None, None, now) {
            TickOutcome::EmitSwap { task, next_fire_at } => {
                assert!(next_fire_at > now);
                if let TaskPayload::Swap { amount, .. } = task.payload {
                    assert!((config.min_trade_size..=config.max_trade_size).contains(&amount));
                } else {
                    panic!("expected swap payload");
                }
            }
            TickOutcome::Wait { .. } => panic!("expected emit"),
        }
    }

    #[test]
    fn error_streak_suspends_emission() {
        let config = retail_config();
        let status = BotStatus::new("w1", Utc::now());
        let profile = BehaviorProfile::catalog_entry(ProfileName::MarketMaker);
        let engine = RandomizationEngine::seeded(3);
        let mut outcomes = OutcomeWindow::new(10);
        for _ in 0..6 {
            outcomes.record(false);
        }
        let now = Utc::now();

        match tick(Uuid::new_v4(), &config, &status, &profile, &engine, &outcomes, None, None, now) {
            TickOutcome::Wait { .. } => {}
            TickOutcome::EmitSwap { .. } => panic!("expected backoff wait"),
        }
    }
}
