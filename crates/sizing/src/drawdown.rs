use serde::{Deserialize, Serialize};

use crate::error::{is_unit_fraction, SizingError};
use crate::module::{clamp_unit, RiskModule, SizingInputs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierAction {
    Reduce,
    Freeze,
}

/// Once drawdown reaches `level_pct` percent below the high-water mark,
/// either cut size by `reduction` or stop sizing altogether.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownTier {
    pub level_pct: f64,
    #[serde(default)]
    pub reduction: f64,
    pub action: TierAction,
}

impl DrawdownTier {
    pub fn reduce(level_pct: f64, reduction: f64) -> Self {
        Self {
            level_pct,
            reduction,
            action: TierAction::Reduce,
        }
    }

    pub fn freeze(level_pct: f64) -> Self {
        Self {
            level_pct,
            reduction: 1.0,
            action: TierAction::Freeze,
        }
    }
}

pub fn default_tiers() -> Vec<DrawdownTier> {
    vec![
        DrawdownTier::reduce(10.0, 0.25),
        DrawdownTier::reduce(20.0, 0.5),
        DrawdownTier::freeze(30.0),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownTiers {
    tiers: Vec<DrawdownTier>,
}

impl DrawdownTiers {
    pub fn new(mut tiers: Vec<DrawdownTier>) -> Result<Self, SizingError> {
        for tier in &tiers {
            if !tier.level_pct.is_finite() || !(0.0..=100.0).contains(&tier.level_pct) {
                return Err(SizingError::InvalidTierLevel(tier.level_pct));
            }
            if !is_unit_fraction(tier.reduction) {
                return Err(SizingError::InvalidTierReduction(tier.reduction));
            }
        }
        tiers.sort_by(|left, right| left.level_pct.total_cmp(&right.level_pct));

        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[DrawdownTier] {
        &self.tiers
    }

    pub fn breached(&self, drawdown_pct: f64) -> impl Iterator<Item = &DrawdownTier> {
        self.tiers
            .iter()
            .filter(move |tier| drawdown_pct >= tier.level_pct)
    }
}

impl Default for DrawdownTiers {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
        }
    }
}

pub fn drawdown_pct(capital: f64, high_water_mark: f64) -> Option<f64> {
    if !high_water_mark.is_finite() || high_water_mark <= 0.0 || !capital.is_finite() {
        return None;
    }
    Some((high_water_mark - capital) / high_water_mark * 100.0)
}

impl RiskModule for DrawdownTiers {
    fn name(&self) -> &str {
        "drawdown_tiers"
    }

    fn adjust(&self, inputs: &SizingInputs) -> f64 {
        let Some(drawdown) = drawdown_pct(inputs.capital, inputs.high_water_mark) else {
            return 1.0;
        };

        let mut reduction: f64 = 0.0;
        for tier in self.breached(drawdown) {
            match tier.action {
                TierAction::Freeze => return 0.0,
                TierAction::Reduce => reduction = reduction.max(tier.reduction),
            }
        }

        clamp_unit(1.0 - reduction)
    }
}
