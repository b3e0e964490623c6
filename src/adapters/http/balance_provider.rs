//! HTTP-backed `BalanceProvider` (spec §6).

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::domain::ports::collaborators::{BalanceProvider, CollaboratorResult};

use super::client::{build_http_client, classify_status, map_transport_error, HttpClientConfig};

pub struct HttpBalanceProvider {
    http: reqwest::Client,
    config: HttpClientConfig,
}

impl HttpBalanceProvider {
    pub fn new(config: HttpClientConfig) -> CollaboratorResult<Self> {
        let http = build_http_client(config.timeout_secs)
            .map_err(|_| crate::domain::ports::collaborators::CollaboratorError::NetworkError("failed to build client".into()))?;
        Ok(Self { http, config })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.get(format!("{}{path}", self.config.base_url));
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: u64,
}

#[async_trait]
impl BalanceProvider for HttpBalanceProvider {
    async fn get_balance(&self, wallet_id: &str, token_mint: Option<&str>) -> CollaboratorResult<u64> {
        let mut builder = self.get(&format!("/wallets/{wallet_id}/balance"));
        if let Some(mint) = token_mint {
            builder = builder.query(&[("token_mint", mint)]);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, text));
        }

        let parsed: BalanceResponse = response.json().await.map_err(map_transport_error)?;
        Ok(parsed.balance)
    }

    async fn get_all_balances(&self, wallet_id: &str) -> CollaboratorResult<HashMap<String, u64>> {
        let response = self
            .get(&format!("/wallets/{wallet_id}/balances"))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, text));
        }

        response.json().await.map_err(map_transport_error)
    }
}
