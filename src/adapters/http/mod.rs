//! HTTP adapters for the collaborator ports (spec §6). Each is a thin
//! reqwest client against a configurable base URL; DEX routing, wallet
//! custody, and RPC plumbing live on the other side of the contract.

pub mod balance_provider;
pub mod client;
pub mod metrics_sink;
pub mod pool_state_reader;
pub mod trading_executor;
pub mod wallet_signer;

pub use balance_provider::HttpBalanceProvider;
pub use client::HttpClientConfig;
pub use metrics_sink::HttpMetricsSink;
pub use pool_state_reader::HttpPoolStateReader;
pub use trading_executor::HttpTradingExecutor;
pub use wallet_signer::HttpWalletSigner;
