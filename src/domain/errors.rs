//! Domain errors for the orchestrator.

use thiserror::Error;

/// Domain-level errors, one variant per error kind the orchestrator surfaces
/// to callers (bot/campaign/task/scheduler operations alike).
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid state for {entity} {id}: {reason}")]
    StateConflict {
        entity: &'static str,
        id: String,
        reason: String,
    },

    #[error("transient external failure: {0}")]
    TransientExternal(String),

    #[error("permanent external failure: {0}")]
    PermanentExternal(String),

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

impl OrchestratorError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn state_conflict(entity: &'static str, id: impl ToString, reason: impl Into<String>) -> Self {
        Self::StateConflict {
            entity,
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Whether an error should be retried by the Task Queue's retry policy (spec
/// §4.3, §7). Processors may override the default classification via a
/// collaborator-supplied predicate; this is the fallback.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for OrchestratorError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientExternal(_))
    }
}

impl From<sqlx::Error> for OrchestratorError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<cron::error::Error> for OrchestratorError {
    fn from(err: cron::error::Error) -> Self {
        Self::Validation(format!("invalid cron expression: {err}"))
    }
}
