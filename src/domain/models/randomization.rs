//! Distribution tags used by the Randomization Engine (spec §4.1).
//!
//! These are pure markers; the actual draw logic lives in
//! `services::randomization::RandomizationEngine` so it can own the RNG
//! state. Keeping the tags in the domain layer lets `BotConfig` and
//! `BehaviorProfile` reference a distribution choice without depending on
//! the service.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingDistribution {
    Uniform,
    Poisson,
    Normal,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeDistribution {
    Uniform,
    SkewedLow,
    SkewedHigh,
    Normal,
}
