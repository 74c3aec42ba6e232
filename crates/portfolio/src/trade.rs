use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Asset id to the ordered trades observed for it. Sequences may differ in length.
pub type TradeMatrix = BTreeMap<String, Vec<Trade>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastResult {
    Win,
    Loss,
    #[default]
    None,
}

/// One observation for one asset at one timestep.
///
/// Probability, payoff and volatility are optional so that an incomplete
/// payload still deserializes; sizing treats a missing field as "no edge"
/// and requests nothing for that step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(default, alias = "pWins")]
    pub p_wins: Option<f64>,
    #[serde(default, rename = "r", alias = "R")]
    pub payoff_ratio: Option<f64>,
    #[serde(default, alias = "realizedVol")]
    pub realized_vol: Option<f64>,
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub outcome: f64,
    #[serde(default, alias = "lastResult")]
    pub last_result: LastResult,
}

impl Trade {
    pub fn new(
        p_wins: f64,
        payoff_ratio: f64,
        cluster: impl Into<String>,
        outcome: f64,
        last_result: LastResult,
    ) -> Self {
        Self {
            p_wins: Some(p_wins),
            payoff_ratio: Some(payoff_ratio),
            realized_vol: None,
            cluster: cluster.into(),
            outcome,
            last_result,
        }
    }

    pub fn with_realized_vol(mut self, realized_vol: f64) -> Self {
        self.realized_vol = Some(realized_vol);
        self
    }

    /// Signed return multiple applied to the sized capital. Non-finite
    /// outcomes contribute nothing.
    pub fn realized_outcome(&self) -> f64 {
        if self.outcome.is_finite() {
            self.outcome
        } else {
            0.0
        }
    }

    pub fn is_win(&self) -> bool {
        self.last_result == LastResult::Win
    }

    /// True when both the win probability and payoff ratio are present and
    /// finite. Trades without them must not be sized.
    pub fn has_statistics(&self) -> bool {
        matches!(
            (self.p_wins, self.payoff_ratio),
            (Some(p_wins), Some(payoff_ratio)) if p_wins.is_finite() && payoff_ratio.is_finite()
        )
    }
}
