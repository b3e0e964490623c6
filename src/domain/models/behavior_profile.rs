//! Behavior profile catalog (spec §4.1, §3 `BehaviorProfile`).
//!
//! A profile bundles the distributions and active-hours curve that make one
//! bot "read" as a retail trader, a whale, a market maker, and so on. The
//! catalog is static; bots select a profile by name at creation.

use serde::{Deserialize, Serialize};

use super::randomization::{SizeDistribution, TimingDistribution};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileName {
    Retail,
    Whale,
    MarketMaker,
    Stealth,
    Aggressive,
    Conservative,
}

/// An hour-of-day activity curve: 24 non-negative floats, normalized so the
/// maximum value is 1.0. Interval draws are divided by the curve value at
/// the current hour; size draws are multiplied (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityCurve(pub [f64; 24]);

impl ActivityCurve {
    /// Flat curve: every hour equally active. Used by profiles with no
    /// day/night bias (whale, market-maker).
    pub fn flat() -> Self {
        Self([1.0; 24])
    }

    /// Active 08:00–23:00 UTC, tapering at the edges; quiet overnight.
    pub fn daytime_retail() -> Self {
        let mut hours = [0.15_f64; 24];
        for h in 8..23 {
            hours[h] = 1.0;
        }
        hours[7] = 0.4;
        hours[23] = 0.4;
        Self(hours)
    }

    /// Mostly quiet, occasional bursts — a stealth trader avoiding patterns.
    pub fn sparse() -> Self {
        Self([0.3; 24])
    }

    pub fn multiplier_at(&self, hour: u32) -> f64 {
        self.0[(hour % 24) as usize].max(0.01)
    }

    /// The window considered "active hours"; hours with multiplier below
    /// this fraction of the curve's max are outside it (spec §4.2).
    pub fn is_active_hour(&self, hour: u32, threshold_fraction: f64) -> bool {
        let max = self.0.iter().cloned().fold(0.0_f64, f64::max).max(0.01);
        self.multiplier_at(hour) >= max * threshold_fraction
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorProfile {
    pub name: ProfileName,
    pub size_distribution: SizeDistribution,
    pub timing_distribution: TimingDistribution,
    pub active_hours: ActivityCurve,
}

impl BehaviorProfile {
    pub fn catalog_entry(name: ProfileName) -> Self {
        match name {
            ProfileName::Retail => Self {
                name,
                size_distribution: SizeDistribution::SkewedLow,
                timing_distribution: TimingDistribution::Poisson,
                active_hours: ActivityCurve::daytime_retail(),
            },
            ProfileName::Whale => Self {
                name,
                size_distribution: SizeDistribution::SkewedHigh,
                timing_distribution: TimingDistribution::Normal,
                active_hours: ActivityCurve::flat(),
            },
            ProfileName::MarketMaker => Self {
                name,
                size_distribution: SizeDistribution::Uniform,
                timing_distribution: TimingDistribution::Uniform,
                active_hours: ActivityCurve::flat(),
            },
            ProfileName::Stealth => Self {
                name,
                size_distribution: SizeDistribution::SkewedLow,
                timing_distribution: TimingDistribution::Exponential,
                active_hours: ActivityCurve::sparse(),
            },
            ProfileName::Aggressive => Self {
                name,
                size_distribution: SizeDistribution::SkewedHigh,
                timing_distribution: TimingDistribution::Uniform,
                active_hours: ActivityCurve::flat(),
            },
            ProfileName::Conservative => Self {
                name,
                size_distribution: SizeDistribution::Normal,
                timing_distribution: TimingDistribution::Normal,
                active_hours: ActivityCurve::daytime_retail(),
            },
        }
    }

    /// Weighted selection used by `create_bot_swarm` (spec §4.6 "70% retail,
    /// 20% whale, 10% market-maker" example distribution).
    pub fn default_swarm_weights() -> &'static [(ProfileName, f64)] {
        &[
            (ProfileName::Retail, 0.70),
            (ProfileName::Whale, 0.20),
            (ProfileName::MarketMaker, 0.10),
        ]
    }
}
