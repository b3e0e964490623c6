//! HTTP-backed `PoolStateReader` (spec §6, feeds the migration monitor of
//! spec §4.10). Liquidity/venue classification is owned by the collaborator;
//! this adapter only relays it.

use async_trait::async_trait;

use crate::domain::ports::collaborators::{CollaboratorResult, PoolState, PoolStateReader};

use super::client::{build_http_client, classify_status, map_transport_error, HttpClientConfig};

pub struct HttpPoolStateReader {
    http: reqwest::Client,
    config: HttpClientConfig,
}

impl HttpPoolStateReader {
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

#[async_trait]
impl PoolStateReader for HttpPoolStateReader {
    async fn get_pool(&self, address: &str) -> CollaboratorResult<Option<PoolState>> {
        let response = self
            .get(&format!("/pools/{address}"))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, text));
        }

        let pool: PoolState = response.json().await.map_err(map_transport_error)?;
        Ok(Some(pool))
    }

    async fn get_pools_for_token(&self, token_mint: &str) -> CollaboratorResult<Vec<PoolState>> {
        let response = self
            .get("/pools")
            .query(&[("token_mint", token_mint)])
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
