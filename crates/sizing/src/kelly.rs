use crate::error::{is_unit_fraction, SizingError};
use crate::module::{RiskModule, SizingInputs};

pub const DEFAULT_KELLY_CAP: f64 = 0.2;
/// Per-trade risk budget of the basic position sizer.
pub const BASIC_KELLY_CAP: f64 = 0.03;

const MIN_P_WINS: f64 = 0.01;
const MAX_P_WINS: f64 = 0.99;
const MIN_PAYOFF_RATIO: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct KellyEstimate {
    pub fraction: f64,
    pub note: String,
}

impl KellyEstimate {
    fn new(fraction: f64) -> Self {
        Self {
            fraction,
            note: format!("Kelly: {:.2}%", fraction * 100.0),
        }
    }
}

/// Capped Kelly stake `p - (1 - p) / R`, clamped to `[0, f_cap]`.
///
/// `p_wins` is pinned to `[0.01, 0.99]` first. A payoff ratio at or below
/// zero saturates at the cap; a NaN input stakes nothing.
pub fn kelly_fraction(p_wins: f64, payoff_ratio: f64, f_cap: f64) -> KellyEstimate {
    let cap = if f_cap.is_nan() {
        0.0
    } else {
        f_cap.clamp(0.0, 1.0)
    };
    if p_wins.is_nan() || payoff_ratio.is_nan() {
        return KellyEstimate::new(0.0);
    }

    let p = p_wins.clamp(MIN_P_WINS, MAX_P_WINS);
    let raw = if payoff_ratio <= MIN_PAYOFF_RATIO {
        cap
    } else {
        p - (1.0 - p) / payoff_ratio
    };

    KellyEstimate::new(raw.clamp(0.0, cap))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KellyModule {
    f_cap: f64,
}

impl KellyModule {
    pub fn new(f_cap: f64) -> Result<Self, SizingError> {
        if !is_unit_fraction(f_cap) {
            return Err(SizingError::InvalidKellyCap(f_cap));
        }

        Ok(Self { f_cap })
    }

    pub fn basic() -> Self {
        Self {
            f_cap: BASIC_KELLY_CAP,
        }
    }

    pub fn f_cap(&self) -> f64 {
        self.f_cap
    }

    pub fn estimate(&self, inputs: &SizingInputs) -> KellyEstimate {
        match (inputs.p_wins, inputs.payoff_ratio) {
            (Some(p_wins), Some(payoff_ratio)) => kelly_fraction(p_wins, payoff_ratio, self.f_cap),
            _ => KellyEstimate {
                fraction: 0.0,
                note: "Kelly: n/a (missing p_wins or R)".to_string(),
            },
        }
    }
}

impl Default for KellyModule {
    fn default() -> Self {
        Self {
            f_cap: DEFAULT_KELLY_CAP,
        }
    }
}

impl RiskModule for KellyModule {
    fn name(&self) -> &str {
        "kelly"
    }

    fn adjust(&self, inputs: &SizingInputs) -> f64 {
        self.estimate(inputs).fraction
    }
}
