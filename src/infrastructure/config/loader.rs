use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::OrchestratorConfig;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid bots.max_concurrent: {0}. Must be between 1 and 5000")]
    InvalidMaxConcurrentBots(u32),

    #[error("Invalid queue.concurrency: {0}. Must be at least 1")]
    InvalidQueueConcurrency(usize),

    #[error(
        "Invalid retry backoff: backoff_ms ({0}) must be less than cap_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid scheduler.timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid database.max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid adjuster bounds: min_bots ({0}) must be <= max_bots ({1})")]
    InvalidAdjusterBounds(u32, u32),

    #[error("Invalid adjuster.tolerance: {0}. Must be in (0, 1]")]
    InvalidTolerance(f64),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `.orchestrator/config.yaml` (project config)
    /// 3. `.orchestrator/local.yaml` (project local overrides, optional)
    /// 4. Environment variables (`ORCHESTRATOR_*` prefix, highest priority)
    ///
    /// Configuration is always project-local (pwd/.orchestrator/) so a
    /// single machine can run multiple orchestrator instances against
    /// different campaigns.
    pub fn load() -> Result<OrchestratorConfig> {
        let config: OrchestratorConfig = Figment::new()
            .merge(Serialized::defaults(OrchestratorConfig::default()))
            .merge(Yaml::file(".orchestrator/config.yaml"))
            .merge(Yaml::file(".orchestrator/local.yaml"))
            .merge(Env::prefixed("ORCHESTRATOR_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<OrchestratorConfig> {
        let config: OrchestratorConfig = Figment::new()
            .merge(Serialized::defaults(OrchestratorConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &OrchestratorConfig) -> Result<(), ConfigError> {
        if config.bots.max_concurrent == 0 || config.bots.max_concurrent > 5_000 {
            return Err(ConfigError::InvalidMaxConcurrentBots(
                config.bots.max_concurrent,
            ));
        }

        if config.queue.concurrency == 0 {
            return Err(ConfigError::InvalidQueueConcurrency(config.queue.concurrency));
        }

        let retry = &config.queue.default_retry;
        if retry.backoff_ms >= retry.cap_ms {
            return Err(ConfigError::InvalidBackoff(retry.backoff_ms, retry.cap_ms));
        }

        if config.scheduler.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ConfigError::InvalidTimezone(config.scheduler.timezone.clone()));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.adjuster.min_bots > config.adjuster.max_bots {
            return Err(ConfigError::InvalidAdjusterBounds(
                config.adjuster.min_bots,
                config.adjuster.max_bots,
            ));
        }

        if config.adjuster.tolerance <= 0.0 || config.adjuster.tolerance > 1.0 {
            return Err(ConfigError::InvalidTolerance(config.adjuster.tolerance));
        }

        if config.shutdown_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "shutdown_timeout_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.bots.max_concurrent, 200);
        assert_eq!(config.database.path, ".orchestrator/orchestrator.db");
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
bots:
  max_concurrent: 20
database:
  path: /custom/path.db
  max_connections: 5
logging:
  level: debug
  format: pretty
  retention_days: 7
";

        let config: OrchestratorConfig = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.bots.max_concurrent, 20);
        assert_eq!(config.database.path, "/custom/path.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.retention_days, 7);

        ConfigLoader::validate(&config).expect("parsed config should be valid");
    }

    #[test]
    fn test_validate_valid_config() {
        let config = OrchestratorConfig::default();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_max_concurrent_bots() {
        let mut config = OrchestratorConfig::default();
        config.bots.max_concurrent = 0;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidMaxConcurrentBots(0)
        ));
    }

    #[test]
    fn test_validate_too_many_bots() {
        let mut config = OrchestratorConfig::default();
        config.bots.max_concurrent = 10_000;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidMaxConcurrentBots(10_000)
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = OrchestratorConfig::default();
        config.logging.level = "invalid".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        match result.unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("expected InvalidLogLevel, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = OrchestratorConfig::default();
        config.logging.format = "xml".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        match result.unwrap_err() {
            ConfigError::InvalidLogFormat(format) => assert_eq!(format, "xml"),
            other => panic!("expected InvalidLogFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_zero_queue_concurrency() {
        let mut config = OrchestratorConfig::default();
        config.queue.concurrency = 0;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidQueueConcurrency(0)
        ));
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = OrchestratorConfig::default();
        config.database.path = String::new();

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::EmptyDatabasePath));
    }

    #[test]
    fn test_validate_zero_max_connections() {
        let mut config = OrchestratorConfig::default();
        config.database.max_connections = 0;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidMaxConnections(0)
        ));
    }

    #[test]
    fn test_validate_invalid_backoff() {
        let mut config = OrchestratorConfig::default();
        config.queue.default_retry.backoff_ms = 30_000;
        config.queue.default_retry.cap_ms = 10_000;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidBackoff(30_000, 10_000)
        ));
    }

    #[test]
    fn test_validate_invalid_timezone() {
        let mut config = OrchestratorConfig::default();
        config.scheduler.timezone = "Not/A_Zone".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::InvalidTimezone(_)));
    }

    #[test]
    fn test_validate_inverted_adjuster_bounds() {
        let mut config = OrchestratorConfig::default();
        config.adjuster.min_bots = 50;
        config.adjuster.max_bots = 10;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidAdjusterBounds(50, 10)
        ));
    }

    #[test]
    fn test_env_override() {
        temp_env::with_vars(
            [
                ("ORCHESTRATOR_BOTS__MAX_CONCURRENT", Some("25")),
                ("ORCHESTRATOR_LOGGING__LEVEL", Some("debug")),
            ],
            || {
                let config: OrchestratorConfig = Figment::new()
                    .merge(Serialized::defaults(OrchestratorConfig::default()))
                    .merge(Env::prefixed("ORCHESTRATOR_").split("__"))
                    .extract()
                    .expect("env-overridden config should extract");

                assert_eq!(config.bots.max_concurrent, 25);
                assert_eq!(config.logging.level, "debug");
                assert_eq!(
                    config.queue.concurrency,
                    OrchestratorConfig::default().queue.concurrency,
                    "fields without an env override keep their default"
                );
            },
        );
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "bots:\n  max_concurrent: 5\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(
            override_file,
            "bots:\n  max_concurrent: 15\nlogging:\n  level: debug"
        )
        .unwrap();
        override_file.flush().unwrap();

        let config: OrchestratorConfig = Figment::new()
            .merge(Serialized::defaults(OrchestratorConfig::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.bots.max_concurrent, 15, "override should win");
        assert_eq!(
            config.logging.level, "debug",
            "override should win for nested fields"
        );
        assert_eq!(
            config.logging.format, "json",
            "base value should persist when not overridden"
        );
    }
}
