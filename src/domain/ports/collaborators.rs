//! Collaborator ports (spec §6 "External Interfaces — consumed from
//! collaborators"). These abstract the well-understood surfaces the
//! orchestrator does not implement itself: signing, execution, balances,
//! durable KV, time, metrics export, and pool state. The core only ever
//! depends on these traits; concrete DEX/RPC/wallet-vault adapters are out
//! of scope (spec §1).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::models::TradeSide;

/// Errors a collaborator can report. These map onto spec §7's
/// `TransientExternal` / `PermanentExternal` classes; callers consult
/// `CollaboratorError::is_retryable` rather than matching variants directly,
/// so the retry policy stays centralized.
#[derive(Debug, Error, Clone)]
pub enum CollaboratorError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("rate limited")]
    RateLimited,
    #[error("wallet not found: {0}")]
    WalletNotFound(String),
    #[error("no route")]
    NoRoute,
    #[error("slippage exceeded")]
    SlippageExceeded,
    #[error("insufficient liquidity")]
    InsufficientLiquidity,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("simulation failed: {0}")]
    SimulationFailed(String),
    #[error("confirmation timeout")]
    ConfirmationTimeout,
    #[error("blockhash expired")]
    BlockhashExpired,
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("timeout")]
    Timeout,
}

impl CollaboratorError {
    /// Default classification (spec §9 Open Question: "formalize the
    /// classification table via a collaborator-supplied predicate" — this
    /// is that table; processors may still override per task type).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited
                | Self::Timeout
                | Self::NetworkError(_)
                | Self::BlockhashExpired
                | Self::ConfirmationTimeout
        )
    }
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Signs and addresses wallets. The orchestrator never holds key material.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    async fn sign_transaction(&self, wallet_id: &str, tx_bytes: &[u8]) -> CollaboratorResult<Vec<u8>>;
    async fn get_address(&self, wallet_id: &str) -> CollaboratorResult<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    pub wallet_id: String,
    pub token_mint: String,
    pub side: TradeSide,
    pub amount: u64,
    pub slippage_bps: u16,
    pub priority_fee: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub signature: String,
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee: u64,
}

/// Executes swaps against whatever DEX aggregation the collaborator wires
/// up (Jupiter/Raydium/Orca/PumpFun are all out of scope here, spec §1).
#[async_trait]
pub trait TradingExecutor: Send + Sync {
    async fn execute_swap(&self, request: SwapRequest) -> CollaboratorResult<SwapOutcome>;
}

#[async_trait]
pub trait BalanceProvider: Send + Sync {
    async fn get_balance(&self, wallet_id: &str, token_mint: Option<&str>) -> CollaboratorResult<u64>;
    async fn get_all_balances(&self, wallet_id: &str) -> CollaboratorResult<HashMap<String, u64>>;
}

/// Durable namespaced KV store backing the Task Queue (spec §6). Must
/// support atomic compare-and-swap for queue state transitions.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> CollaboratorResult<Option<Vec<u8>>>;
    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> CollaboratorResult<()>;
    async fn delete(&self, namespace: &str, key: &str) -> CollaboratorResult<()>;
    /// Set `key` to `new` only if its current value equals `expected`
    /// (`None` means "must not currently exist"). Returns whether the swap
    /// applied.
    async fn compare_and_swap(
        &self,
        namespace: &str,
        key: &str,
        expected: Option<Vec<u8>>,
        new: Vec<u8>,
    ) -> CollaboratorResult<bool>;
}

/// Injected clock so daily-rollover and scheduling logic is deterministic
/// under test (spec §6, §9 "date-based daily caps must be deterministic").
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsFormat {
    Json,
    Prometheus,
}

#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn record_trade(&self, trade: &crate::domain::models::TradeRecord) -> CollaboratorResult<()>;
    async fn export(&self, format: MetricsFormat) -> CollaboratorResult<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolState {
    pub address: String,
    pub token_mint: String,
    /// Coarse venue classification used by the migration monitor (spec
    /// §4.10), e.g. "bonding_curve" or "amm".
    pub venue_class: String,
    pub tvl: u64,
    pub reserves: u64,
}

#[async_trait]
pub trait PoolStateReader: Send + Sync {
    async fn get_pool(&self, address: &str) -> CollaboratorResult<Option<PoolState>>;
    async fn get_pools_for_token(&self, token_mint: &str) -> CollaboratorResult<Vec<PoolState>>;
}
