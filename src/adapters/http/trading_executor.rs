//! HTTP-backed `TradingExecutor` (spec §6). DEX routing, simulation, and
//! submission all live behind this contract; Jupiter/Raydium/Orca/PumpFun
//! integration is explicitly out of scope here.

use async_trait::async_trait;

use crate::domain::ports::collaborators::{CollaboratorResult, SwapOutcome, SwapRequest, TradingExecutor};

use super::client::{build_http_client, build_rate_limiter, classify_status, map_transport_error, HttpClientConfig, HttpRateLimiter};

pub struct HttpTradingExecutor {
    http: reqwest::Client,
    config: HttpClientConfig,
    limiter: Option<HttpRateLimiter>,
}

impl HttpTradingExecutor {
    pub fn new(config: HttpClientConfig) -> CollaboratorResult<Self> {
        let http = build_http_client(config.timeout_secs)
            .map_err(|_| crate::domain::ports::collaborators::CollaboratorError::NetworkError("failed to build client".into()))?;
        let limiter = config.rate_limit_per_sec.map(build_rate_limiter);
        Ok(Self { http, config, limiter })
    }
}

#[async_trait]
impl TradingExecutor for HttpTradingExecutor {
    async fn execute_swap(&self, request: SwapRequest) -> CollaboratorResult<SwapOutcome> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        let mut builder = self.http.post(format!("{}/swaps", self.config.base_url));
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.json(&request).send().await.map_err(map_transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status_for_swap(status, &text));
        }

        response.json().await.map_err(map_transport_error)
    }
}

/// Swap-specific status mapping: a 422 from an executor is almost always a
/// simulation or slippage rejection, not a generic client error, so it gets
/// its own classification ahead of the shared fallback.
fn classify_status_for_swap(
    status: reqwest::StatusCode,
    body: &str,
) -> crate::domain::ports::collaborators::CollaboratorError {
    use crate::domain::ports::collaborators::CollaboratorError;
    match status.as_u16() {
        422 if body.contains("slippage") => CollaboratorError::SlippageExceeded,
        422 if body.contains("liquidity") => CollaboratorError::InsufficientLiquidity,
        422 if body.contains("funds") || body.contains("balance") => CollaboratorError::InsufficientFunds,
        422 => CollaboratorError::SimulationFailed(body.to_string()),
        404 => CollaboratorError::NoRoute,
        409 => CollaboratorError::BlockhashExpired,
        504 => CollaboratorError::ConfirmationTimeout,
        _ => classify_status(status, body.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slippage_body_maps_to_slippage_exceeded() {
        use crate::domain::ports::collaborators::CollaboratorError;
        let err = classify_status_for_swap(reqwest::StatusCode::UNPROCESSABLE_ENTITY, "slippage tolerance exceeded");
        assert!(matches!(err, CollaboratorError::SlippageExceeded));
    }

    #[test]
    fn unmatched_422_falls_back_to_simulation_failed() {
        use crate::domain::ports::collaborators::CollaboratorError;
        let err = classify_status_for_swap(reqwest::StatusCode::UNPROCESSABLE_ENTITY, "unknown instruction");
        assert!(matches!(err, CollaboratorError::SimulationFailed(_)));
    }
}
