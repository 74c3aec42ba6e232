use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquitySummary {
    pub steps: usize,
    pub final_capital: f64,
    pub total_return: f64,
    pub peak: f64,
    /// Deepest fall below the running peak, as a fraction of that peak.
    pub max_drawdown: f64,
}

impl EquitySummary {
    /// The running peak starts at `initial_capital`, so a curve that only
    /// falls still reports its drawdown.
    pub fn from_curve(initial_capital: f64, curve: &[f64]) -> Self {
        let mut peak = initial_capital;
        let mut max_drawdown: f64 = 0.0;
        for &capital in curve {
            peak = peak.max(capital);
            if peak > 0.0 {
                max_drawdown = max_drawdown.max((peak - capital) / peak);
            }
        }

        let final_capital = curve.last().copied().unwrap_or(initial_capital);
        let total_return = if initial_capital > 0.0 {
            final_capital / initial_capital - 1.0
        } else {
            0.0
        };

        Self {
            steps: curve.len(),
            final_capital,
            total_return,
            peak,
            max_drawdown,
        }
    }
}
