//! Benchmarks the Randomization Engine's draw throughput (spec §4.1) across
//! its timing and size distributions, plus the priority-weight comparisons
//! that drive queue dispatch ordering (spec §4.3).

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use swarm_orchestrator::domain::models::{SizeDistribution, TaskPriority, TimingDistribution};
use swarm_orchestrator::services::RandomizationEngine;

fn bench_next_interval(c: &mut Criterion) {
    let engine = RandomizationEngine::seeded(42);
    let mut group = c.benchmark_group("next_interval");

    for dist in [
        TimingDistribution::Uniform,
        TimingDistribution::Poisson,
        TimingDistribution::Normal,
        TimingDistribution::Exponential,
    ] {
        group.bench_function(format!("{dist:?}"), |b| {
            b.iter(|| black_box(engine.next_interval(50, 200, dist)));
        });
    }
    group.finish();
}

fn bench_next_size(c: &mut Criterion) {
    let engine = RandomizationEngine::seeded(42);
    let mut group = c.benchmark_group("next_size");

    for dist in [
        SizeDistribution::Uniform,
        SizeDistribution::SkewedLow,
        SizeDistribution::SkewedHigh,
        SizeDistribution::Normal,
    ] {
        group.bench_function(format!("{dist:?}"), |b| {
            b.iter(|| black_box(engine.next_size(1_000, 1_000_000, dist)));
        });
    }
    group.finish();
}

fn bench_jitter_and_coin(c: &mut Criterion) {
    let engine = RandomizationEngine::seeded(7);
    c.bench_function("jitter_10pct", |b| {
        b.iter(|| black_box(engine.jitter(1_000, 0.1)));
    });
    c.bench_function("coin_flip", |b| {
        b.iter(|| black_box(engine.coin(0.5)));
    });
}

/// Mirrors the comparator `SqliteTaskRepository::claim_next_pending` pushes
/// down into `ORDER BY priority_weight DESC, queued_at ASC`; benchmarked
/// here as a pure in-memory sort to isolate the comparison cost from I/O.
fn bench_priority_sort(c: &mut Criterion) {
    let priorities = [
        TaskPriority::Low,
        TaskPriority::Normal,
        TaskPriority::High,
        TaskPriority::Critical,
    ];
    let mut group = c.benchmark_group("priority_sort");

    for size in [100usize, 10_000] {
        group.bench_function(format!("{size}_tasks"), |b| {
            b.iter_batched(
                || {
                    (0..size)
                        .map(|i| priorities[i % priorities.len()])
                        .collect::<Vec<_>>()
                },
                |mut weights| {
                    weights.sort_by_key(|p| std::cmp::Reverse(p.weight()));
                    black_box(weights)
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_next_interval,
    bench_next_size,
    bench_jitter_and_coin,
    bench_priority_sort
);
criterion_main!(benches);
