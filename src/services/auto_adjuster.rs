//! Auto-Adjuster (spec §4.9): closed-loop controller comparing projected
//! vs target volume and recommending bot count / interval changes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::models::{AdjustmentRecommendation, AdjustmentReason, Campaign};

#[derive(Debug, Clone, Copy)]
pub struct AdjusterConfig {
    pub tolerance: f64,
    /// Required config per spec §9 Open Question (no source default; we
    /// specify 0.5 as the suggested default).
    pub gain: f64,
    pub cool_down_seconds: i64,
    pub min_bots: u32,
    pub max_bots: u32,
    pub max_bot_delta_per_tick: u32,
    /// Auto-Adjuster refuses to add bots while queue pending exceeds this
    /// (spec §5 "back-pressure").
    pub adjuster_pending_cap: u64,
}

impl Default for AdjusterConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.05,
            gain: 0.5,
            cool_down_seconds: 120,
            min_bots: 1,
            max_bots: 500,
            max_bot_delta_per_tick: 10,
            adjuster_pending_cap: 5_000,
        }
    }
}

/// Per-campaign adjuster state: last-adjustment timestamp (cool-down) and
/// a consecutive-failure counter for the degraded-mode rule (spec §4.9
/// Failure semantics).
#[derive(Default)]
struct CampaignAdjusterState {
    last_adjustment_at: Option<DateTime<Utc>>,
    consecutive_failures: u32,
    degraded: bool,
}

const DEGRADED_THRESHOLD: u32 = 5;

pub struct AutoAdjuster {
    config: AdjusterConfig,
    state: RwLock<HashMap<Uuid, CampaignAdjusterState>>,
}

impl AutoAdjuster {
    pub fn new(config: AdjusterConfig) -> Self {
        Self {
            config,
            state: RwLock::new(HashMap::new()),
        }
    }

    pub async fn is_degraded(&self, campaign_id: Uuid) -> bool {
        self.state.read().await.get(&campaign_id).map(|s| s.degraded).unwrap_or(false)
    }

    /// Run one tick for `campaign`. `current_bot_count` and `pending_tasks`
    /// are supplied by the caller (the Campaign Manager), which is the one
    /// with access to the Coordinator and Task Queue.
    pub async fn tick(
        &self,
        campaign: &Campaign,
        current_bot_count: u32,
        pending_tasks: u64,
        now: DateTime<Utc>,
    ) -> AdjustmentRecommendation {
        let result = self.compute(campaign, current_bot_count, pending_tasks, now).await;
        let mut state = self.state.write().await;
        let entry = state.entry(campaign.id).or_default();
        match &result {
            Ok(rec) => {
                entry.consecutive_failures = 0;
                entry.degraded = false;
                if !rec.is_noop() {
                    entry.last_adjustment_at = Some(now);
                }
                rec.clone()
            }
            Err(_) => {
                entry.consecutive_failures += 1;
                if entry.consecutive_failures >= DEGRADED_THRESHOLD {
                    entry.degraded = true;
                }
                AdjustmentRecommendation::none(AdjustmentReason::WithinDeadband)
            }
        }
    }

    async fn compute(
        &self,
        campaign: &Campaign,
        current_bot_count: u32,
        pending_tasks: u64,
        now: DateTime<Utc>,
    ) -> Result<AdjustmentRecommendation, ()> {
        let elapsed_hours = campaign.elapsed_hours(now);
        if elapsed_hours <= 0.0 {
            return Ok(AdjustmentRecommendation::none(AdjustmentReason::WithinDeadband));
        }

        // Cool-down: at most one non-zero adjustment per window (spec §8
        // property 9).
        {
            let state = self.state.read().await;
            if let Some(entry) = state.get(&campaign.id) {
                if let Some(last) = entry.last_adjustment_at {
                    if (now - last).num_seconds() < self.config.cool_down_seconds {
                        return Ok(AdjustmentRecommendation::none(AdjustmentReason::CoolingDown));
                    }
                }
            }
        }

        let target_duration_hours = f64::from(campaign.config.duration_hours);
        let projected_volume =
            campaign.metrics.total_volume as f64 * target_duration_hours / elapsed_hours;
        let target = campaign.config.target_volume_24h.max(1) as f64;
        let ratio = projected_volume / target;

        if (ratio - 1.0).abs() < self.config.tolerance {
            return Ok(AdjustmentRecommendation::none(AdjustmentReason::WithinDeadband));
        }

        if ratio < 1.0 {
            if pending_tasks > self.config.adjuster_pending_cap {
                return Ok(AdjustmentRecommendation::none(AdjustmentReason::WithinDeadband));
            }
            if current_bot_count >= self.config.max_bots {
                return Ok(AdjustmentRecommendation {
                    add_bots: 0,
                    remove_bots: 0,
                    interval_delta_pct: -10.0,
                    size_delta_pct: 0.0,
                    reason: Some(AdjustmentReason::UnderTargetTightenIntervals),
                });
            }
            let raw = (current_bot_count as f64 * (1.0 / ratio - 1.0) * self.config.gain).ceil();
            let add = raw.clamp(1.0, self.config.max_bot_delta_per_tick as f64) as i32;
            let add = add.min((self.config.max_bots - current_bot_count) as i32).max(1);
            Ok(AdjustmentRecommendation {
                add_bots: add,
                remove_bots: 0,
                interval_delta_pct: 0.0,
                size_delta_pct: 0.0,
                reason: Some(AdjustmentReason::UnderTargetAddBots),
            })
        } else {
            if current_bot_count <= self.config.min_bots {
                return Ok(AdjustmentRecommendation {
                    add_bots: 0,
                    remove_bots: 0,
                    interval_delta_pct: 10.0,
                    size_delta_pct: 0.0,
                    reason: Some(AdjustmentReason::OverTargetWidenIntervals),
                });
            }
            let raw = (current_bot_count as f64 * (1.0 - 1.0 / ratio) * self.config.gain).ceil();
            let remove = raw.clamp(1.0, self.config.max_bot_delta_per_tick as f64) as i32;
            let remove = remove.min((current_bot_count - self.config.min_bots) as i32).max(1);
            Ok(AdjustmentRecommendation {
                add_bots: 0,
                remove_bots: remove,
                interval_delta_pct: 0.0,
                size_delta_pct: 0.0,
                reason: Some(AdjustmentReason::OverTargetRemoveBots),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CampaignConfig, CampaignMode};

    fn campaign_with(total_volume: u64, started_hours_ago: i64, bot_count: u32) -> Campaign {
        let config = CampaignConfig {
            name: "t".into(),
            target_token: "MINT".into(),
            target_volume_24h: 1_000_000 * 24,
            target_tx_count_24h: 1000,
            duration_hours: 24,
            bot_count,
            mode: CampaignMode::Moderate,
            wallet_tag: None,
            wallet_funding_amount: 10_000_000,
        };
        let mut c = Campaign::new(config);
        c.started_at = Some(Utc::now() - chrono::Duration::hours(started_hours_ago));
        c.metrics.total_volume = total_volume;
        c
    }

    #[tokio::test]
    async fn under_target_recommends_adding_bots() {
        let adjuster = AutoAdjuster::new(AdjusterConfig::default());
        let campaign = campaign_with(100_000, 6, 10);
        let rec = adjuster.tick(&campaign, 10, 0, Utc::now()).await;
        assert!(rec.add_bots >= 1);
        assert!(rec.add_bots as u32 <= adjuster.config.max_bot_delta_per_tick);
    }

    #[tokio::test]
    async fn within_deadband_is_noop() {
        let adjuster = AutoAdjuster::new(AdjusterConfig::default());
        // projected == target exactly.
        let campaign = campaign_with(1_000_000, 24, 10);
        let rec = adjuster.tick(&campaign, 10, 0, Utc::now()).await;
        assert!(rec.is_noop());
    }

    #[tokio::test]
    async fn cooldown_blocks_second_adjustment() {
        let adjuster = AutoAdjuster::new(AdjusterConfig::default());
        let campaign = campaign_with(100_000, 6, 10);
        let now = Utc::now();
        let first = adjuster.tick(&campaign, 10, 0, now).await;
        assert!(!first.is_noop());
        let second = adjuster.tick(&campaign, 10, 0, now + chrono::Duration::seconds(10)).await;
        assert!(second.is_noop());
    }
}
