//! Trade record domain model (spec §3 `TradeRecord`). Append-only, produced
//! on worker completion and folded into campaign metrics exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::TradeSide;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub bot_id: Uuid,
    pub wallet_id: String,
    pub campaign_id: Option<Uuid>,
    pub token_mint: String,
    pub side: TradeSide,
    pub amount: u64,
    pub price: f64,
    pub fees: u64,
    pub signature: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl TradeRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bot_id: Uuid,
        wallet_id: impl Into<String>,
        campaign_id: Option<Uuid>,
        token_mint: impl Into<String>,
        side: TradeSide,
        amount: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            bot_id,
            wallet_id: wallet_id.into(),
            campaign_id,
            token_mint: token_mint.into(),
            side,
            amount,
            price: 0.0,
            fees: 0,
            signature: None,
            timestamp: Utc::now(),
            success: false,
            error_message: None,
        }
    }
}
