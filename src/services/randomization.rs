//! Randomization Engine (spec §4.1): seedable draws for timing and size,
//! jitter, weighted choice, and coin flips. Pure and stateless aside from
//! the RNG itself, so bots and the auto-adjuster can share one instance
//! behind an `Arc` without coordinating anything but the RNG lock.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, LogNormal, Normal};

use crate::domain::models::{SizeDistribution, TimingDistribution};

/// Clamp `v` into `[lo, hi]`, tolerating `lo > hi` by swapping (callers
/// validate config elsewhere, but a defensive clamp keeps draws in-range
/// even if a caller passes a degenerate band).
fn clamp_into(v: f64, lo: f64, hi: f64) -> f64 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    v.clamp(lo, hi)
}

enum AnyRng {
    Seeded(StdRng),
    Entropy(rand::rngs::ThreadRng),
}

impl AnyRng {
    fn gen_f64(&mut self) -> f64 {
        match self {
            Self::Seeded(r) => r.gen::<f64>(),
            Self::Entropy(r) => r.gen::<f64>(),
        }
    }

    fn sample_normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        // std_dev of 0 would panic Normal::new; callers pass at least a
        // tiny epsilon via next_interval/next_size's sigma computation, but
        // guard anyway since config comes from campaign/bot parameters.
        let std_dev = std_dev.max(1e-9);
        let dist = Normal::new(mean, std_dev).unwrap_or_else(|_| Normal::new(mean, 1.0).unwrap());
        match self {
            Self::Seeded(r) => dist.sample(r),
            Self::Entropy(r) => dist.sample(r),
        }
    }

    fn sample_lognormal(&mut self, mu: f64, sigma: f64) -> f64 {
        let sigma = sigma.max(1e-9);
        let dist = LogNormal::new(mu, sigma).unwrap_or_else(|_| LogNormal::new(0.0, 1.0).unwrap());
        match self {
            Self::Seeded(r) => dist.sample(r),
            Self::Entropy(r) => dist.sample(r),
        }
    }

    fn sample_exp(&mut self, rate: f64) -> f64 {
        let rate = rate.max(1e-9);
        let dist = rand_distr::Exp::new(rate).unwrap_or_else(|_| rand_distr::Exp::new(1.0).unwrap());
        match self {
            Self::Seeded(r) => dist.sample(r),
            Self::Entropy(r) => dist.sample(r),
        }
    }
}

/// Deterministic-when-seeded source of timing/size draws (spec §4.1).
///
/// Construct with [`RandomizationEngine::seeded`] for reproducible test
/// sequences, or [`RandomizationEngine::entropy`] for system-entropy-backed
/// production draws. Every draw is a single closed-form sample plus a
/// clamp — no retry-on-reject loops, so draws are constant-time regardless
/// of distribution parameters (spec §4.1 contract).
pub struct RandomizationEngine {
    rng: Mutex<AnyRng>,
}

impl RandomizationEngine {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(AnyRng::Seeded(StdRng::seed_from_u64(seed))),
        }
    }

    pub fn entropy() -> Self {
        Self {
            rng: Mutex::new(AnyRng::Entropy(rand::thread_rng())),
        }
    }

    /// Re-seed an existing engine, discarding prior RNG state. Used by
    /// tests that need to replay a sequence (spec §8 scenario S4).
    pub fn reseed(&self, seed: u64) {
        *self.rng.lock().expect("randomization engine mutex poisoned") = AnyRng::Seeded(StdRng::seed_from_u64(seed));
    }

    /// Draw an integer interval in milliseconds, clamped into `[min_ms,
    /// max_ms]` (spec §4.1, §8 property 6).
    pub fn next_interval(&self, min_ms: u64, max_ms: u64, distribution: TimingDistribution) -> u64 {
        if min_ms >= max_ms {
            return min_ms;
        }
        let (lo, hi) = (min_ms as f64, max_ms as f64);
        let mid = (lo + hi) / 2.0;
        let mut rng = self.rng.lock().expect("randomization engine mutex poisoned");
        let raw = match distribution {
            TimingDistribution::Uniform => {
                let u = rng.gen_f64();
                lo + u * (hi - lo)
            }
            TimingDistribution::Poisson => {
                // Inter-arrival time of a Poisson process with rate
                // lambda = 1/mean is Exponential(lambda).
                let mean = mid.max(1.0);
                rng.sample_exp(1.0 / mean)
            }
            TimingDistribution::Normal => {
                let sigma = (hi - lo) / 6.0;
                rng.sample_normal(mid, sigma)
            }
            TimingDistribution::Exponential => rng.sample_exp(1.0 / mid.max(1.0)),
        };
        clamp_into(raw, lo, hi).round() as u64
    }

    /// Draw an integer size, clamped into `[min, max]` (spec §4.1).
    pub fn next_size(&self, min: u64, max: u64, distribution: SizeDistribution) -> u64 {
        if min >= max {
            return min;
        }
        let (lo, hi) = (min as f64, max as f64);
        let mid = (lo + hi) / 2.0;
        let mut rng = self.rng.lock().expect("randomization engine mutex poisoned");
        let raw = match distribution {
            SizeDistribution::Uniform => {
                let u = rng.gen_f64();
                lo + u * (hi - lo)
            }
            SizeDistribution::Normal => {
                let sigma = (hi - lo) / 6.0;
                rng.sample_normal(mid, sigma)
            }
            SizeDistribution::SkewedLow => {
                // Lognormal mode = exp(mu - sigma^2); choose mu so the mode
                // sits near the 25th percentile of the range.
                let sigma = 0.6_f64;
                let target = lo + (hi - lo) * 0.25;
                let mu = (target.max(1.0)).ln() + sigma * sigma;
                rng.sample_lognormal(mu, sigma)
            }
            SizeDistribution::SkewedHigh => {
                // Mirror of skewed-low: reflect the draw across the range
                // midpoint so the mode sits near the 75th percentile.
                let sigma = 0.6_f64;
                let target = lo + (hi - lo) * 0.25;
                let mu = (target.max(1.0)).ln() + sigma * sigma;
                let mirrored = rng.sample_lognormal(mu, sigma);
                lo + hi - mirrored
            }
        };
        clamp_into(raw, lo, hi).round() as u64
    }

    /// Scale `value` by a uniform factor in `[1-percent, 1+percent]` (spec
    /// §4.1 `jitter`).
    pub fn jitter(&self, value: u64, percent: f64) -> u64 {
        let percent = percent.clamp(0.0, 1.0);
        let mut rng = self.rng.lock().expect("randomization engine mutex poisoned");
        let factor = 1.0 - percent + rng.gen_f64() * (2.0 * percent);
        ((value as f64) * factor).round().max(0.0) as u64
    }

    /// `true` with probability `p` (spec §4.1 `coin`).
    pub fn coin(&self, p: f64) -> bool {
        let p = p.clamp(0.0, 1.0);
        let mut rng = self.rng.lock().expect("randomization engine mutex poisoned");
        rng.gen_f64() < p
    }

    /// Select one of `items` with probability proportional to the matching
    /// entry in `weights` (spec §4.1 `weighted_choice`). Panics if the
    /// slices differ in length or `items` is empty — both are caller bugs,
    /// not runtime conditions.
    pub fn weighted_choice<'a, T>(&self, items: &'a [T], weights: &[f64]) -> &'a T {
        assert_eq!(items.len(), weights.len(), "weighted_choice: items/weights length mismatch");
        assert!(!items.is_empty(), "weighted_choice: items must not be empty");
        let total: f64 = weights.iter().sum();
        let mut rng = self.rng.lock().expect("randomization engine mutex poisoned");
        let mut target = rng.gen_f64() * total;
        for (item, w) in items.iter().zip(weights) {
            if target < *w {
                return item;
            }
            target -= w;
        }
        items.last().expect("non-empty checked above")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_always_in_range() {
        let engine = RandomizationEngine::seeded(1);
        for dist in [
            TimingDistribution::Uniform,
            TimingDistribution::Poisson,
            TimingDistribution::Normal,
            TimingDistribution::Exponential,
        ] {
            for _ in 0..200 {
                let v = engine.next_interval(100, 500, dist);
                assert!((100..=500).contains(&v), "{v} out of range for {dist:?}");
            }
        }
    }

    #[test]
    fn size_always_in_range() {
        let engine = RandomizationEngine::seeded(7);
        for dist in [
            SizeDistribution::Uniform,
            SizeDistribution::SkewedLow,
            SizeDistribution::SkewedHigh,
            SizeDistribution::Normal,
        ] {
            for _ in 0..200 {
                let v = engine.next_size(10, 1_000, dist);
                assert!((10..=1_000).contains(&v), "{v} out of range for {dist:?}");
            }
        }
    }

    #[test]
    fn seeded_sequence_is_reproducible() {
        let a = RandomizationEngine::seeded(42);
        let seq_a: Vec<u64> = (0..1000)
            .map(|_| a.next_interval(100, 500, TimingDistribution::Poisson))
            .collect();

        a.reseed(42);
        let seq_b: Vec<u64> = (0..1000)
            .map(|_| a.next_interval(100, 500, TimingDistribution::Poisson))
            .collect();

        assert_eq!(seq_a, seq_b);
        assert!(seq_a.iter().all(|v| (100..=500).contains(v)));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let engine = RandomizationEngine::seeded(3);
        for _ in 0..100 {
            let v = engine.jitter(1_000, 0.1);
            assert!((900..=1_100).contains(&v));
        }
    }

    #[test]
    fn weighted_choice_respects_zero_weight() {
        let engine = RandomizationEngine::seeded(9);
        let items = ["a", "b"];
        for _ in 0..50 {
            assert_eq!(*engine.weighted_choice(&items, &[1.0, 0.0]), "a");
        }
    }
}
