//! Auto-Adjuster recommendation (spec §4.9, §3 `AdjustmentRecommendation`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    UnderTargetAddBots,
    UnderTargetTightenIntervals,
    OverTargetRemoveBots,
    OverTargetWidenIntervals,
    WithinDeadband,
    CoolingDown,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AdjustmentRecommendation {
    pub add_bots: i32,
    pub remove_bots: i32,
    /// Percentage change to apply to interval bounds; negative tightens.
    pub interval_delta_pct: f64,
    /// Percentage change to apply to trade size bounds.
    pub size_delta_pct: f64,
    pub reason: Option<AdjustmentReason>,
}

impl AdjustmentRecommendation {
    pub fn none(reason: AdjustmentReason) -> Self {
        Self {
            reason: Some(reason),
            ..Default::default()
        }
    }

    pub fn is_noop(&self) -> bool {
        self.add_bots == 0 && self.remove_bots == 0 && self.interval_delta_pct == 0.0 && self.size_delta_pct == 0.0
    }
}
