//! Pool/Migration Monitor (spec §4.10): polls pool state per watched token
//! and fires a migration event when liquidity moves from one venue class
//! to another (bonding curve -> standard AMM).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::domain::ports::collaborators::{CollaboratorResult, PoolState, PoolStateReader};

#[derive(Debug, Clone)]
pub struct MigrationEvent {
    pub token_mint: String,
    pub from_venue: String,
    pub to_venue: String,
    pub from_pool: String,
    pub to_pool: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PoolMonitorConfig {
    pub min_liquidity: u64,
    /// A venue is considered "collapsed" once its reserves fall below this
    /// fraction of its last-observed reserves.
    pub collapse_threshold_fraction: f64,
    pub auto_redirect: bool,
}

impl Default for PoolMonitorConfig {
    fn default() -> Self {
        Self {
            min_liquidity: 10_000,
            collapse_threshold_fraction: 0.1,
            auto_redirect: true,
        }
    }
}

/// Last-seen pool state per token, so a poll can detect a venue-class
/// change rather than just current state.
#[derive(Default)]
struct TokenHistory {
    last_seen: HashMap<String, PoolState>,
}

pub struct PoolMonitor {
    reader: Arc<dyn PoolStateReader>,
    config: PoolMonitorConfig,
    history: RwLock<HashMap<String, TokenHistory>>,
}

impl PoolMonitor {
    pub fn new(reader: Arc<dyn PoolStateReader>, config: PoolMonitorConfig) -> Self {
        Self {
            reader,
            config,
            history: RwLock::new(HashMap::new()),
        }
    }

    /// Poll `token_mint`'s pools once, returning a migration event if this
    /// poll detects one (spec §4.10 detection rule: new pool in a
    /// different venue class, TVL above `min_liquidity`, prior venue's
    /// reserves collapsed below threshold).
    #[instrument(skip(self))]
    pub async fn poll_token(&self, token_mint: &str, now: DateTime<Utc>) -> CollaboratorResult<Option<MigrationEvent>> {
        let pools = self.reader.get_pools_for_token(token_mint).await?;
        let mut history = self.history.write().await;
        let entry = history.entry(token_mint.to_string()).or_default();

        let mut event = None;
        for pool in &pools {
            let prior = entry.last_seen.values().find(|p| p.venue_class != pool.venue_class);
            if let Some(prior) = prior {
                let prior_collapsed =
                    (prior.reserves as f64) < (prior.tvl.max(1) as f64) * self.config.collapse_threshold_fraction;
                if pool.tvl >= self.config.min_liquidity && prior_collapsed && event.is_none() {
                    event = Some(MigrationEvent {
                        token_mint: token_mint.to_string(),
                        from_venue: prior.venue_class.clone(),
                        to_venue: pool.venue_class.clone(),
                        from_pool: prior.address.clone(),
                        to_pool: pool.address.clone(),
                        timestamp: now,
                    });
                }
            }
        }

        entry.last_seen = pools.into_iter().map(|p| (p.address.clone(), p)).collect();
        Ok(event)
    }
}
