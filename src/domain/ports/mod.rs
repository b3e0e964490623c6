//! Domain ports: async traits the orchestrator's services depend on,
//! satisfied either by in-crate adapters (SQLite, in-memory) or by
//! collaborator integrations out of scope for this crate (spec §6).

pub mod bot_repository;
pub mod campaign_repository;
pub mod collaborators;
pub mod schedule_repository;
pub mod task_repository;

pub use bot_repository::{BotFilter, BotRecord, BotRepository};
pub use campaign_repository::{CampaignFilter, CampaignRepository};
pub use collaborators::{
    BalanceProvider, CollaboratorError, CollaboratorResult, KvStore, MetricsFormat, MetricsSink,
    PoolState, PoolStateReader, SwapOutcome, SwapRequest, SystemTimeSource, TimeSource,
    TradingExecutor, WalletSigner,
};
pub use schedule_repository::{ScheduleFilter, ScheduleRepository};
pub use task_repository::{TaskFilter, TaskRepository};
