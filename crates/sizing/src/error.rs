#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SizingError {
    #[error("kelly cap must be a finite fraction within [0, 1], got {0}")]
    InvalidKellyCap(f64),
    #[error("drawdown tier level must be a percentage within [0, 100], got {0}")]
    InvalidTierLevel(f64),
    #[error("drawdown tier reduction must be within [0, 1], got {0}")]
    InvalidTierReduction(f64),
    #[error("cppi floor ratio must be within (0, 1), got {0}")]
    InvalidFloorRatio(f64),
    #[error("cppi freeze threshold must be finite and non-negative, got {0}")]
    InvalidFreezeThreshold(f64),
    #[error("streak step-down must be within (0, 1], got {0}")]
    InvalidStepDown(f64),
    #[error("streak floor must be within [0, 1], got {0}")]
    InvalidStreakFloor(f64),
    #[error("volatility target must be finite and positive, got {0}")]
    InvalidTargetVol(f64),
    #[error("volatility cap multiplier must be finite and positive, got {0}")]
    InvalidCapMultiplier(f64),
}

pub(crate) fn is_unit_fraction(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}
