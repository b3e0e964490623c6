//! HTTP-backed `WalletSigner` (spec §6). The orchestrator never holds key
//! material; signing is delegated to whatever key-custody service the
//! collaborator exposes behind this contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::ports::collaborators::{CollaboratorResult, WalletSigner};

use super::client::{build_http_client, build_rate_limiter, classify_status, map_transport_error, HttpClientConfig, HttpRateLimiter};

pub struct HttpWalletSigner {
    http: reqwest::Client,
    config: HttpClientConfig,
    limiter: Option<HttpRateLimiter>,
}

impl HttpWalletSigner {
    pub fn new(config: HttpClientConfig) -> CollaboratorResult<Self> {
        let http = build_http_client(config.timeout_secs)
            .map_err(|_| crate::domain::ports::collaborators::CollaboratorError::NetworkError("failed to build client".into()))?;
        let limiter = config.rate_limit_per_sec.map(build_rate_limiter);
        Ok(Self { http, config, limiter })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.post(format!("{}{path}", self.config.base_url));
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    /// Waits for a rate-limit slot before an outgoing request, pacing the
    /// orchestrator ahead of the signer's own limit rather than only
    /// reacting to `RateLimited` responses after the fact (spec §6).
    async fn throttle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

#[derive(Serialize)]
struct SignRequest<'a> {
    wallet_id: &'a str,
    tx_bytes_b64: String,
}

#[derive(Deserialize)]
struct SignResponse {
    signed_tx_bytes_b64: String,
}

#[derive(Deserialize)]
struct AddressResponse {
    address: String,
}

#[async_trait]
impl WalletSigner for HttpWalletSigner {
    async fn sign_transaction(&self, wallet_id: &str, tx_bytes: &[u8]) -> CollaboratorResult<Vec<u8>> {
        use base64::Engine;
        let body = SignRequest {
            wallet_id,
            tx_bytes_b64: base64::engine::general_purpose::STANDARD.encode(tx_bytes),
        };

        self.throttle().await;
        let response = self
            .request("/sign")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, text));
        }

        let parsed: SignResponse = response.json().await.map_err(map_transport_error)?;
        base64::engine::general_purpose::STANDARD
            .decode(parsed.signed_tx_bytes_b64)
            .map_err(|e| crate::domain::ports::collaborators::CollaboratorError::NetworkError(e.to_string()))
    }

    async fn get_address(&self, wallet_id: &str) -> CollaboratorResult<String> {
        self.throttle().await;
        let response = self
            .http
            .get(format!("{}/wallets/{wallet_id}/address", self.config.base_url))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(crate::domain::ports::collaborators::CollaboratorError::WalletNotFound(
                wallet_id.to_string(),
            ));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, text));
        }

        let parsed: AddressResponse = response.json().await.map_err(map_transport_error)?;
        Ok(parsed.address)
    }
}
