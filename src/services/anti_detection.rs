//! Anti-Detection heuristics (spec §4.2): wraps Randomization Engine draws
//! with the activity-multiplier curve, error-streak back-off, and a
//! realistic memo generator.

use chrono::{DateTime, Timelike, Utc};

use crate::domain::models::{ActivityCurve, BehaviorProfile, SizeDistribution, TimingDistribution};

use super::randomization::RandomizationEngine;

/// Fraction of a curve's peak below which an hour is considered outside
/// "active hours" (spec §4.2 `active_hours` window).
const ACTIVE_HOUR_THRESHOLD: f64 = 0.25;

/// Multiplier applied to the base interval when outside active hours,
/// producing the "extra-long intervals" spec §4.2 calls for.
const COLD_PERIOD_STRETCH: f64 = 4.0;

/// A bounded rolling window of recent trade outcomes, used to detect error
/// streaks (spec §4.2 "if a bot's last K outcomes include >= F failures").
#[derive(Debug, Clone, Default)]
pub struct OutcomeWindow {
    outcomes: std::collections::VecDeque<bool>,
    capacity: usize,
}

impl OutcomeWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            outcomes: std::collections::VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, success: bool) {
        if self.outcomes.len() == self.capacity {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(success);
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|s| !**s).count()
    }
}

/// Parameters for the error-streak back-off rule.
#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    pub window: usize,
    pub failure_threshold: usize,
    pub mean_cooldown_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            window: 10,
            failure_threshold: 5,
            mean_cooldown_ms: 60_000,
        }
    }
}

/// Applies the anti-detection rules on top of a [`RandomizationEngine`].
pub struct AntiDetection<'a> {
    engine: &'a RandomizationEngine,
}

impl<'a> AntiDetection<'a> {
    pub fn new(engine: &'a RandomizationEngine) -> Self {
        Self { engine }
    }

    /// Draw the next inter-trade interval, adjusted for the profile's
    /// activity curve and active-hours window (spec §4.2).
    pub fn next_interval(
        &self,
        min_ms: u64,
        max_ms: u64,
        distribution: TimingDistribution,
        curve: &ActivityCurve,
        now: DateTime<Utc>,
    ) -> u64 {
        let base = self.engine.next_interval(min_ms, max_ms, distribution);
        let hour = now.hour();
        let multiplier = curve.multiplier_at(hour).max(0.01);
        let stretched = if curve.is_active_hour(hour, ACTIVE_HOUR_THRESHOLD) {
            (base as f64 / multiplier).round() as u64
        } else {
            ((base as f64 / multiplier) * COLD_PERIOD_STRETCH).round() as u64
        };
        stretched.max(min_ms)
    }

    /// Draw the next trade size, adjusted for the profile's activity curve
    /// (spec §4.2: "size draws are multiplied").
    pub fn next_size(
        &self,
        min: u64,
        max: u64,
        distribution: SizeDistribution,
        curve: &ActivityCurve,
        now: DateTime<Utc>,
    ) -> u64 {
        let base = self.engine.next_size(min, max, distribution);
        let multiplier = curve.multiplier_at(now.hour());
        ((base as f64) * multiplier).round().clamp(min as f64, max as f64) as u64
    }

    /// Whether a bot whose last `window.capacity()` outcomes are `outcomes`
    /// should suspend emission, and for how long if so (spec §4.2).
    pub fn backoff_cooldown(&self, outcomes: &OutcomeWindow, config: BackoffConfig) -> Option<u64> {
        if outcomes.failure_count() >= config.failure_threshold {
            Some(self.engine.next_interval(
                config.mean_cooldown_ms / 4,
                config.mean_cooldown_ms * 4,
                TimingDistribution::Exponential,
            ))
        } else {
            None
        }
    }

    /// An optional short human-shaped memo attached to a swap payload,
    /// opaque to the core (spec §4.2). Returns `None` most of the time so
    /// memo presence itself isn't a detectable pattern.
    pub fn memo(&self, profile: &BehaviorProfile) -> Option<String> {
        if !self.engine.coin(0.08) {
            return None;
        }
        let phrases: &[&str] = match profile.name {
            crate::domain::models::ProfileName::Retail => &["gm", "lfg", "ape", "yolo"],
            crate::domain::models::ProfileName::Whale => &["accumulating", "building position"],
            crate::domain::models::ProfileName::MarketMaker => &["mm", "rebalance"],
            crate::domain::models::ProfileName::Stealth => &[""],
            crate::domain::models::ProfileName::Aggressive => &["sending it", "full send"],
            crate::domain::models::ProfileName::Conservative => &["dca", "steady"],
        };
        let weights = vec![1.0; phrases.len()];
        let chosen = *self.engine.weighted_choice(phrases, &weights);
        if chosen.is_empty() {
            None
        } else {
            Some(chosen.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_streak_triggers_backoff() {
        let engine = RandomizationEngine::seeded(1);
        let anti = AntiDetection::new(&engine);
        let mut window = OutcomeWindow::new(10);
        for _ in 0..6 {
            window.record(false);
        }
        let cooldown = anti.backoff_cooldown(&window, BackoffConfig::default());
        assert!(cooldown.is_some());
    }

    #[test]
    fn healthy_streak_has_no_backoff() {
        let engine = RandomizationEngine::seeded(1);
        let anti = AntiDetection::new(&engine);
        let mut window = OutcomeWindow::new(10);
        for _ in 0..10 {
            window.record(true);
        }
        assert!(anti.backoff_cooldown(&window, BackoffConfig::default()).is_none());
    }

    #[test]
    fn cold_hours_stretch_interval() {
        let engine = RandomizationEngine::seeded(5);
        let anti = AntiDetection::new(&engine);
        let curve = ActivityCurve::daytime_retail();
        let noon = Utc::now().with_hour(14).unwrap();
        let midnight = Utc::now().with_hour(3).unwrap();
        let day_interval = anti.next_interval(1_000, 5_000, TimingDistribution::Uniform, &curve, noon);
        let night_interval = anti.next_interval(1_000, 5_000, TimingDistribution::Uniform, &curve, midnight);
        assert!(night_interval >= day_interval);
    }
}
