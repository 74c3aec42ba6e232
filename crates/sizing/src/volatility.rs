use crate::error::SizingError;
use crate::module::{clamp_unit, RiskModule, SizingInputs};

pub const DEFAULT_TARGET_VOL: f64 = 0.1;
pub const DEFAULT_CAP_MULTIPLIER: f64 = 2.0;

/// Scales size by `target_vol / realized_vol`, never above one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityTarget {
    target_vol: f64,
    cap_multiplier: f64,
}

impl VolatilityTarget {
    pub fn new(target_vol: f64, cap_multiplier: f64) -> Result<Self, SizingError> {
        if !target_vol.is_finite() || target_vol <= 0.0 {
            return Err(SizingError::InvalidTargetVol(target_vol));
        }
        if !cap_multiplier.is_finite() || cap_multiplier <= 0.0 {
            return Err(SizingError::InvalidCapMultiplier(cap_multiplier));
        }

        Ok(Self {
            target_vol,
            cap_multiplier,
        })
    }
}

impl Default for VolatilityTarget {
    fn default() -> Self {
        Self {
            target_vol: DEFAULT_TARGET_VOL,
            cap_multiplier: DEFAULT_CAP_MULTIPLIER,
        }
    }
}

impl RiskModule for VolatilityTarget {
    fn name(&self) -> &str {
        "volatility_target"
    }

    fn adjust(&self, inputs: &SizingInputs) -> f64 {
        match inputs.realized_vol {
            Some(vol) if vol.is_finite() && vol > 0.0 => {
                clamp_unit((self.target_vol / vol).min(self.cap_multiplier))
            }
            _ => 1.0,
        }
    }
}
