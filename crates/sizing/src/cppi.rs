use crate::error::SizingError;
use crate::module::{RiskModule, SizingInputs};

pub const DEFAULT_FLOOR_RATIO: f64 = 0.9;
pub const DEFAULT_FREEZE_THRESHOLD: f64 = 0.05;

/// Freezes sizing once the cushion above `high_water_mark * floor_ratio`
/// shrinks to `freeze_threshold * high_water_mark` or less.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CppiFreeze {
    floor_ratio: f64,
    freeze_threshold: f64,
}

impl CppiFreeze {
    pub fn new(floor_ratio: f64, freeze_threshold: f64) -> Result<Self, SizingError> {
        if !floor_ratio.is_finite() || floor_ratio <= 0.0 || floor_ratio >= 1.0 {
            return Err(SizingError::InvalidFloorRatio(floor_ratio));
        }
        if !freeze_threshold.is_finite() || freeze_threshold < 0.0 {
            return Err(SizingError::InvalidFreezeThreshold(freeze_threshold));
        }

        Ok(Self {
            floor_ratio,
            freeze_threshold,
        })
    }

    pub fn cushion(&self, capital: f64, high_water_mark: f64) -> f64 {
        capital - high_water_mark * self.floor_ratio
    }

    pub fn is_frozen(&self, capital: f64, high_water_mark: f64) -> bool {
        self.cushion(capital, high_water_mark) <= self.freeze_threshold * high_water_mark
    }
}

impl Default for CppiFreeze {
    fn default() -> Self {
        Self {
            floor_ratio: DEFAULT_FLOOR_RATIO,
            freeze_threshold: DEFAULT_FREEZE_THRESHOLD,
        }
    }
}

impl RiskModule for CppiFreeze {
    fn name(&self) -> &str {
        "cppi_freeze"
    }

    fn adjust(&self, inputs: &SizingInputs) -> f64 {
        if self.is_frozen(inputs.capital, inputs.high_water_mark) {
            0.0
        } else {
            1.0
        }
    }
}
