use serde::Serialize;

use crate::trade::Trade;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

/// Per-instrument equity record, mutated once per timestep the asset trades.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AssetState {
    pub capital: f64,
    pub high_water_mark: f64,
    /// Consecutive wins; any non-win resets it.
    pub step: u32,
}

impl AssetState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            capital: initial_capital,
            high_water_mark: initial_capital,
            step: 0,
        }
    }

    /// Books the realized P&L of `applied_size` of capital on `trade` and
    /// returns it.
    pub fn apply(&mut self, applied_size: f64, trade: &Trade) -> f64 {
        let pnl = applied_size * self.capital * trade.realized_outcome();
        self.capital += pnl;
        self.high_water_mark = self.high_water_mark.max(self.capital);
        self.step = if trade.is_win() {
            self.step.saturating_add(1)
        } else {
            0
        };
        pnl
    }

    /// Distance below the high-water mark as a fraction of it.
    pub fn drawdown(&self) -> f64 {
        if self.high_water_mark <= 0.0 {
            return 0.0;
        }
        ((self.high_water_mark - self.capital) / self.high_water_mark).max(0.0)
    }
}

impl Default for AssetState {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_CAPITAL)
    }
}
