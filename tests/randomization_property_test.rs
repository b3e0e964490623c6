//! Property tests for the Randomization Engine (spec §4.1): every draw must
//! stay within its requested bounds regardless of distribution or seed.

use proptest::prelude::*;
use swarm_orchestrator::domain::models::{SizeDistribution, TimingDistribution};
use swarm_orchestrator::services::RandomizationEngine;

fn timing_distribution() -> impl Strategy<Value = TimingDistribution> {
    prop_oneof![
        Just(TimingDistribution::Uniform),
        Just(TimingDistribution::Poisson),
        Just(TimingDistribution::Normal),
        Just(TimingDistribution::Exponential),
    ]
}

fn size_distribution() -> impl Strategy<Value = SizeDistribution> {
    prop_oneof![
        Just(SizeDistribution::Uniform),
        Just(SizeDistribution::SkewedLow),
        Just(SizeDistribution::SkewedHigh),
        Just(SizeDistribution::Normal),
    ]
}

proptest! {
    #[test]
    fn next_interval_stays_within_bounds(
        seed in any::<u64>(),
        min_ms in 1u64..10_000,
        span in 0u64..50_000,
        distribution in timing_distribution(),
    ) {
        let engine = RandomizationEngine::seeded(seed);
        let max_ms = min_ms + span;
        let draw = engine.next_interval(min_ms, max_ms, distribution);
        prop_assert!(draw >= min_ms && draw <= max_ms);
    }

    #[test]
    fn next_size_stays_within_bounds(
        seed in any::<u64>(),
        min in 1u64..1_000_000,
        span in 0u64..5_000_000,
        distribution in size_distribution(),
    ) {
        let engine = RandomizationEngine::seeded(seed);
        let max = min + span;
        let draw = engine.next_size(min, max, distribution);
        prop_assert!(draw >= min && draw <= max);
    }

    #[test]
    fn jitter_stays_within_percent_band(
        seed in any::<u64>(),
        value in 1u64..1_000_000,
        percent in 0.0f64..1.0,
    ) {
        let engine = RandomizationEngine::seeded(seed);
        let jittered = engine.jitter(value, percent);
        let band = (value as f64 * percent).ceil() as u64 + 1;
        prop_assert!(jittered.abs_diff(value) <= band);
    }

    #[test]
    fn seeded_engine_is_deterministic(
        seed in any::<u64>(),
        min_ms in 1u64..10_000,
        span in 0u64..50_000,
        distribution in timing_distribution(),
    ) {
        let max_ms = min_ms + span;
        let a = RandomizationEngine::seeded(seed).next_interval(min_ms, max_ms, distribution);
        let b = RandomizationEngine::seeded(seed).next_interval(min_ms, max_ms, distribution);
        prop_assert_eq!(a, b);
    }
}

#[test]
fn degenerate_band_collapses_to_single_value() {
    let engine = RandomizationEngine::seeded(7);
    for _ in 0..20 {
        assert_eq!(engine.next_interval(500, 500, TimingDistribution::Normal), 500);
        assert_eq!(engine.next_size(100, 100, SizeDistribution::SkewedHigh), 100);
    }
}
