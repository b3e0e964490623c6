//! HTTP-backed `MetricsSink` (spec §6). Forwards per-trade records and
//! serves aggregate export in whatever format the caller requests; metric
//! aggregation itself happens on the collaborator side, not here.

use async_trait::async_trait;

use crate::domain::models::TradeRecord;
use crate::domain::ports::collaborators::{CollaboratorResult, MetricsFormat, MetricsSink};

use super::client::{build_http_client, classify_status, map_transport_error, HttpClientConfig};

pub struct HttpMetricsSink {
    http: reqwest::Client,
    config: HttpClientConfig,
}

impl HttpMetricsSink {
    pub fn new(config: HttpClientConfig) -> CollaboratorResult<Self> {
        let http = build_http_client(config.timeout_secs)
            .map_err(|_| crate::domain::ports::collaborators::CollaboratorError::NetworkError("failed to build client".into()))?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl MetricsSink for HttpMetricsSink {
    async fn record_trade(&self, trade: &TradeRecord) -> CollaboratorResult<()> {
        let mut builder = self.http.post(format!("{}/trades", self.config.base_url));
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.json(trade).send().await.map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, text));
        }

        Ok(())
    }

    async fn export(&self, format: MetricsFormat) -> CollaboratorResult<String> {
        let format_param = match format {
            MetricsFormat::Json => "json",
            MetricsFormat::Prometheus => "prometheus",
        };

        let mut builder = self
            .http
            .get(format!("{}/metrics", self.config.base_url))
            .query(&[("format", format_param)]);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, text));
        }

        response.text().await.map_err(map_transport_error)
    }
}
