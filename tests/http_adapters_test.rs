//! Integration tests for the HTTP-backed collaborator adapters (spec §6)
//! against a `mockito` mock server, rather than a live collaborator.

use swarm_orchestrator::adapters::http::{
    HttpBalanceProvider, HttpClientConfig, HttpMetricsSink, HttpWalletSigner,
};
use swarm_orchestrator::domain::models::{TradeRecord, TradeSide};
use swarm_orchestrator::domain::ports::collaborators::{
    BalanceProvider, CollaboratorError, MetricsFormat, MetricsSink, WalletSigner,
};
use uuid::Uuid;

fn config(base_url: String) -> HttpClientConfig {
    HttpClientConfig::new(base_url).with_api_key("test-key")
}

#[tokio::test]
async fn wallet_signer_signs_transaction() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/sign")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"signed_tx_bytes_b64":"aGVsbG8="}"#)
        .create_async()
        .await;

    let signer = HttpWalletSigner::new(config(server.url())).expect("client builds");
    let signed = signer
        .sign_transaction("wallet-1", b"unsigned-bytes")
        .await
        .expect("sign succeeds");

    assert_eq!(signed, b"hello");
    mock.assert_async().await;
}

#[tokio::test]
async fn wallet_signer_maps_404_to_wallet_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/wallets/missing/address")
        .with_status(404)
        .create_async()
        .await;

    let signer = HttpWalletSigner::new(config(server.url())).expect("client builds");
    let err = signer.get_address("missing").await.unwrap_err();

    assert!(matches!(err, CollaboratorError::WalletNotFound(id) if id == "missing"));
}

#[tokio::test]
async fn wallet_signer_maps_429_to_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/wallets/busy/address")
        .with_status(429)
        .create_async()
        .await;

    let signer = HttpWalletSigner::new(config(server.url())).expect("client builds");
    let err = signer.get_address("busy").await.unwrap_err();

    assert!(matches!(err, CollaboratorError::RateLimited));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn balance_provider_reads_single_balance() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/wallets/w1/balance")
        .match_query(mockito::Matcher::UrlEncoded("token_mint".into(), "So11111111111111111111111111111111111111112".into()))
        .with_status(200)
        .with_body(r#"{"balance":424242}"#)
        .create_async()
        .await;

    let provider = HttpBalanceProvider::new(config(server.url())).expect("client builds");
    let balance = provider
        .get_balance("w1", Some("So11111111111111111111111111111111111111112"))
        .await
        .expect("balance fetch succeeds");

    assert_eq!(balance, 424_242);
}

#[tokio::test]
async fn balance_provider_unauthorized_is_not_retryable() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/wallets/w1/balances")
        .with_status(401)
        .create_async()
        .await;

    let provider = HttpBalanceProvider::new(config(server.url())).expect("client builds");
    let err = provider.get_all_balances("w1").await.unwrap_err();

    assert!(matches!(err, CollaboratorError::Unauthorized));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn metrics_sink_records_trade_and_exports() {
    let mut server = mockito::Server::new_async().await;
    let record_mock = server
        .mock("POST", "/trades")
        .with_status(200)
        .create_async()
        .await;
    let export_mock = server
        .mock("GET", "/metrics")
        .match_query(mockito::Matcher::UrlEncoded("format".into(), "prometheus".into()))
        .with_status(200)
        .with_body("swarm_trades_total 1\n")
        .create_async()
        .await;

    let sink = HttpMetricsSink::new(config(server.url())).expect("client builds");
    let trade = TradeRecord::new(Uuid::new_v4(), "w1", None, "mint", TradeSide::Buy, 1_000);
    sink.record_trade(&trade).await.expect("record succeeds");
    let body = sink.export(MetricsFormat::Prometheus).await.expect("export succeeds");

    assert!(body.contains("swarm_trades_total"));
    record_mock.assert_async().await;
    export_mock.assert_async().await;
}
