use serde::{Deserialize, Serialize};

use crate::caps::PortfolioCaps;
use crate::state::DEFAULT_INITIAL_CAPITAL;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    #[serde(alias = "initialCapital")]
    pub initial_capital: f64,
    pub caps: PortfolioCaps,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            caps: PortfolioCaps::default(),
        }
    }
}
