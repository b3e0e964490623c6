//! Benchmarks the Task Queue's enqueue/dispatch path (spec §4.3) against an
//! in-memory `TaskRepository`, mirroring the teacher's `task_queue` bench
//! target name but exercising this crate's priority-queue semantics.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tokio::sync::RwLock;
use uuid::Uuid;

use swarm_orchestrator::domain::errors::OrchestratorResult;
use swarm_orchestrator::domain::models::{Task, TaskPayload, TaskPriority, TaskStatus, TaskType};
use swarm_orchestrator::domain::ports::{TaskFilter, TaskRepository};
use swarm_orchestrator::services::{TaskQueueConfig, TaskQueueService};

/// Minimal in-memory repository, just enough to drive the benchmark without
/// touching a filesystem or the sqlite adapter's I/O cost.
#[derive(Default)]
struct InMemoryTasks {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

#[async_trait]
impl TaskRepository for InMemoryTasks {
    async fn create(&self, task: &Task) -> OrchestratorResult<()> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> OrchestratorResult<Option<Task>> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn update(&self, task: &Task) -> OrchestratorResult<()> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> OrchestratorResult<()> {
        self.tasks.write().await.remove(&id);
        Ok(())
    }

    async fn list(&self, _filter: TaskFilter) -> OrchestratorResult<Vec<Task>> {
        Ok(self.tasks.read().await.values().cloned().collect())
    }

    async fn claim_next_pending(&self) -> OrchestratorResult<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        let next = tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .max_by(|a, b| {
                a.priority
                    .weight()
                    .cmp(&b.priority.weight())
                    .then(b.queued_at.cmp(&a.queued_at))
            })
            .map(|t| t.id);
        match next {
            Some(id) => {
                let task = tasks.get_mut(&id).unwrap();
                task.start();
                Ok(Some(task.clone()))
            }
            None => Ok(None),
        }
    }

    async fn get_by_idempotency_key(&self, _key: &str) -> OrchestratorResult<Option<Task>> {
        Ok(None)
    }

    async fn count_by_status(&self) -> OrchestratorResult<HashMap<TaskStatus, u64>> {
        let tasks = self.tasks.read().await;
        let mut counts = HashMap::new();
        for t in tasks.values() {
            *counts.entry(t.status).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

fn sample_task(priority: TaskPriority) -> Task {
    Task::new(
        TaskPayload::Balance {
            wallet_id: "bench-wallet".into(),
            token_mint: None,
        },
        priority,
    )
}

fn bench_enqueue_batch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("enqueue_batch");

    for size in [10usize, 100, 1_000] {
        group.bench_function(format!("{size}_tasks"), |b| {
            b.to_async(&rt).iter_batched(
                || {
                    let repo: Arc<dyn TaskRepository> = Arc::new(InMemoryTasks::default());
                    let queue = TaskQueueService::new(repo, TaskQueueConfig::default());
                    let tasks: Vec<Task> = (0..size)
                        .map(|i| {
                            let priority = match i % 4 {
                                0 => TaskPriority::Low,
                                1 => TaskPriority::Normal,
                                2 => TaskPriority::High,
                                _ => TaskPriority::Critical,
                            };
                            sample_task(priority)
                        })
                        .collect();
                    (queue, tasks)
                },
                |(queue, tasks)| async move { black_box(queue.enqueue_batch(tasks).await.unwrap()) },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_queue_stats(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    c.bench_function("queue_stats_1000_mixed", |b| {
        b.to_async(&rt).iter_batched(
            || {
                let repo: Arc<dyn TaskRepository> = Arc::new(InMemoryTasks::default());
                let queue = TaskQueueService::new(repo, TaskQueueConfig::default());
                (queue, (0..1_000).map(|_| sample_task(TaskPriority::Normal)).collect::<Vec<_>>())
            },
            |(queue, tasks)| async move {
                queue.enqueue_batch(tasks).await.unwrap();
                black_box(queue.queue_stats().await.unwrap())
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_task_type_lookup(c: &mut Criterion) {
    let type_names: Vec<TaskType> = vec![
        TaskType::Swap,
        TaskType::Transfer,
        TaskType::Balance,
        TaskType::MigratePool,
        TaskType::Consolidate,
    ];
    c.bench_function("task_type_as_str_roundtrip", |b| {
        b.iter(|| {
            for t in &type_names {
                black_box(TaskType::from_str(t.as_str()));
            }
        });
    });
}

criterion_group!(benches, bench_enqueue_batch, bench_queue_stats, bench_task_type_lookup);
criterion_main!(benches);
