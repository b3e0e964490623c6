//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON log formatting
//! - Log rotation
//! - Secret scrubbing
//! - Audit trail

pub mod audit;
pub mod config;
pub mod logger;
pub mod rotation;
pub mod secret_scrubbing;

pub use audit::{AuditEvent, AuditEventType, AuditLogger, AuditOutcome};
pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::LoggerImpl;
pub use secret_scrubbing::SecretScrubbingLayer;

use crate::domain::models::config::LoggingSettings;

impl From<&LoggingSettings> for LogConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level.clone(),
            format: if settings.format == "pretty" {
                LogFormat::Pretty
            } else {
                LogFormat::Json
            },
            log_dir: settings.log_dir.as_ref().map(std::path::PathBuf::from),
            enable_stdout: true,
            rotation: RotationPolicy::Daily,
            retention_days: i64::from(settings.retention_days),
        }
    }
}
