use crate::error::{is_unit_fraction, SizingError};
use crate::module::{clamp_unit, RiskModule, SizingInputs};

pub const DEFAULT_STEP_DOWN: f64 = 0.8;
pub const DEFAULT_MAX_STEPS: u32 = 3;
pub const DEFAULT_STREAK_FLOOR: f64 = 0.5;

/// Shrinks size geometrically along a run of consecutive wins,
/// `max(floor, step_down ^ min(step, max_steps))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreakDecay {
    step_down: f64,
    max_steps: u32,
    floor: f64,
}

impl StreakDecay {
    pub fn new(step_down: f64, max_steps: u32, floor: f64) -> Result<Self, SizingError> {
        if !step_down.is_finite() || step_down <= 0.0 || step_down > 1.0 {
            return Err(SizingError::InvalidStepDown(step_down));
        }
        if !is_unit_fraction(floor) {
            return Err(SizingError::InvalidStreakFloor(floor));
        }

        Ok(Self {
            step_down,
            max_steps,
            floor,
        })
    }
}

impl Default for StreakDecay {
    fn default() -> Self {
        Self {
            step_down: DEFAULT_STEP_DOWN,
            max_steps: DEFAULT_MAX_STEPS,
            floor: DEFAULT_STREAK_FLOOR,
        }
    }
}

impl RiskModule for StreakDecay {
    fn name(&self) -> &str {
        "streak_decay"
    }

    fn adjust(&self, inputs: &SizingInputs) -> f64 {
        let exponent = inputs.step.min(self.max_steps);
        let factor = self
            .step_down
            .powi(i32::try_from(exponent).unwrap_or(i32::MAX));
        clamp_unit(factor.max(self.floor))
    }
}
