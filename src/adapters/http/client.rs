//! Shared HTTP client construction for collaborator adapters (spec §6).
//!
//! Each collaborator port (wallet signer, trading executor, balance
//! provider, metrics sink, pool state reader) is a thin contract the
//! orchestrator consumes; these adapters are reference HTTP clients
//! against a configurable base URL, not DEX/RPC integrations.

use governor::{Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use std::time::Duration;

use crate::domain::ports::collaborators::CollaboratorError;

/// An in-process, non-keyed rate limiter for a single collaborator client
/// (spec §6 "Wallet signer: ... Rate-limited"). Throttles client-side so
/// the orchestrator paces itself ahead of the collaborator's own limit
/// rather than only reacting to `RateLimited` after the fact.
pub type HttpRateLimiter = RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>;

pub(super) fn build_rate_limiter(per_second: u32) -> HttpRateLimiter {
    let quota = Quota::per_second(NonZeroU32::new(per_second.max(1)).expect("per_second clamped to >= 1"));
    RateLimiter::direct(quota)
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Client-side requests/second cap; `None` disables throttling.
    pub rate_limit_per_sec: Option<u32>,
}

impl HttpClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_secs: 30,
            rate_limit_per_sec: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_rate_limit_per_sec(mut self, per_sec: u32) -> Self {
        self.rate_limit_per_sec = Some(per_sec);
        self
    }
}

pub(super) fn build_http_client(timeout_secs: u64) -> Result<Client, CollaboratorError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| CollaboratorError::NetworkError(e.to_string()))
}

/// Map a transport-level `reqwest` failure onto the collaborator error
/// space. HTTP status codes are classified by each adapter, since what a
/// 409 or 422 *means* is endpoint-specific.
pub(super) fn map_transport_error(err: reqwest::Error) -> CollaboratorError {
    if err.is_timeout() {
        CollaboratorError::Timeout
    } else {
        CollaboratorError::NetworkError(err.to_string())
    }
}

pub(super) fn classify_status(status: reqwest::StatusCode, body: String) -> CollaboratorError {
    match status.as_u16() {
        401 | 403 => CollaboratorError::Unauthorized,
        429 => CollaboratorError::RateLimited,
        408 => CollaboratorError::Timeout,
        _ => CollaboratorError::NetworkError(format!("status {status}: {body}")),
    }
}
