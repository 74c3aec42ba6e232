use std::fmt;

use portfolio::{AssetState, LastResult, Trade};
use serde::{Deserialize, Serialize};

/// Everything a risk module may look at when sizing one trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingInputs {
    pub capital: f64,
    pub high_water_mark: f64,
    pub step: u32,
    pub p_wins: Option<f64>,
    pub payoff_ratio: Option<f64>,
    pub realized_vol: Option<f64>,
    pub last_result: LastResult,
}

impl SizingInputs {
    pub fn from_trade(state: &AssetState, trade: &Trade) -> Self {
        Self {
            capital: state.capital,
            high_water_mark: state.high_water_mark,
            step: state.step,
            p_wins: trade.p_wins,
            payoff_ratio: trade.payoff_ratio,
            realized_vol: trade.realized_vol,
            last_result: trade.last_result,
        }
    }
}

/// A stateless sizing adjustment. `adjust` returns a multiplier in `[0, 1]`.
pub trait RiskModule: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn adjust(&self, inputs: &SizingInputs) -> f64;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    pub id: String,
    pub name: String,
    pub version: String,
    pub enabled: bool,
    pub priority: i32,
}

impl ModuleMetadata {
    pub fn position_sizer() -> Self {
        Self {
            id: "position_sizer".to_string(),
            name: "Position Sizer Orchestrator".to_string(),
            version: "1.0.0".to_string(),
            enabled: true,
            priority: 1,
        }
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
