//! Orchestrator configuration (spec §6): sections map directly onto the
//! collaborator/runtime knobs the orchestrator's services are constructed
//! from. Loaded hierarchically by `infrastructure::config::ConfigLoader`.

use serde::{Deserialize, Serialize};

use super::randomization::{SizeDistribution, TimingDistribution};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotsSettings {
    pub max_concurrent: u32,
}

impl Default for BotsSettings {
    fn default() -> Self {
        Self { max_concurrent: 200 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub attempts: u32,
    pub backoff_ms: u64,
    pub cap_ms: u64,
    pub jitter_pct: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff_ms: 1_000,
            cap_ms: 10_000,
            jitter_pct: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    pub concurrency: usize,
    pub default_retry: RetrySettings,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            concurrency: 50,
            default_retry: RetrySettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub timezone: String,
    pub max_concurrent_scheduled: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            max_concurrent_scheduled: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomizationSettings {
    pub default_timing_distribution: TimingDistribution,
    pub default_size_distribution: SizeDistribution,
    pub timing_jitter_percent: f64,
    pub size_jitter_percent: f64,
}

impl Default for RandomizationSettings {
    fn default() -> Self {
        Self {
            default_timing_distribution: TimingDistribution::Poisson,
            default_size_distribution: SizeDistribution::Normal,
            timing_jitter_percent: 0.15,
            size_jitter_percent: 0.20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolMonitorSettings {
    pub polling_interval_ms: u64,
    pub min_liquidity: u64,
    pub auto_redirect: bool,
}

impl Default for PoolMonitorSettings {
    fn default() -> Self {
        Self {
            polling_interval_ms: 30_000,
            min_liquidity: 10_000,
            auto_redirect: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjusterSettings {
    pub tick_interval_s: u64,
    pub tolerance: f64,
    pub gain: f64,
    pub cool_down_seconds: i64,
    pub min_bots: u32,
    pub max_bots: u32,
    pub max_bot_delta_per_tick: u32,
}

impl Default for AdjusterSettings {
    fn default() -> Self {
        Self {
            tick_interval_s: 60,
            tolerance: 0.05,
            gain: 0.5,
            cool_down_seconds: 120,
            min_bots: 1,
            max_bots: 500,
            max_bot_delta_per_tick: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: ".orchestrator/orchestrator.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
    pub log_dir: Option<String>,
    pub retention_days: u32,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            log_dir: None,
            retention_days: 30,
        }
    }
}

/// Root configuration, hierarchically merged by the config loader (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub bots: BotsSettings,
    pub queue: QueueSettings,
    pub scheduler: SchedulerSettings,
    pub randomization: RandomizationSettings,
    pub pool_monitor: PoolMonitorSettings,
    pub adjuster: AdjusterSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub shutdown_timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            bots: BotsSettings::default(),
            queue: QueueSettings::default(),
            scheduler: SchedulerSettings::default(),
            randomization: RandomizationSettings::default(),
            pool_monitor: PoolMonitorSettings::default(),
            adjuster: AdjusterSettings::default(),
            database: DatabaseSettings::default(),
            logging: LoggingSettings::default(),
            shutdown_timeout_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_yaml() {
        let config = OrchestratorConfig::default();
        let yaml = serde_yaml::to_string(&config).expect("serialize");
        let back: OrchestratorConfig = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(config, back);
    }

    #[test]
    fn default_adjuster_bounds_are_sane() {
        let config = OrchestratorConfig::default();
        assert!(config.adjuster.min_bots <= config.adjuster.max_bots);
        assert!(config.queue.default_retry.cap_ms >= config.queue.default_retry.backoff_ms);
    }
}
