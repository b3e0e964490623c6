//! Domain models
//!
//! Pure domain entities with business logic and validation rules. These are
//! framework-agnostic and contain no infrastructure concerns.

pub mod adjustment;
pub mod behavior_profile;
pub mod bot;
pub mod campaign;
pub mod config;
pub mod randomization;
pub mod schedule;
pub mod task;
pub mod trade_record;

pub use adjustment::{AdjustmentRecommendation, AdjustmentReason};
pub use behavior_profile::{ActivityCurve, BehaviorProfile, ProfileName};
pub use bot::{BotConfig, BotMode, BotState, BotStatus};
pub use campaign::{
    Campaign, CampaignConfig, CampaignMetrics, CampaignMode, CampaignState, TargetKindFlag,
    TargetsFired,
};
pub use config::{
    AdjusterSettings, BotsSettings, DatabaseSettings, LoggingSettings, OrchestratorConfig,
    PoolMonitorSettings, QueueSettings, RandomizationSettings, RetrySettings, SchedulerSettings,
};
pub use randomization::{SizeDistribution, TimingDistribution};
pub use schedule::{OverlapPolicy, ScheduleType, ScheduledTask};
pub use task::{Task, TaskPayload, TaskPriority, TaskStatus, TaskType, TradeSide};
pub use trade_record::TradeRecord;
