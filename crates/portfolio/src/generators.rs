use crate::trade::{LastResult, Trade, TradeMatrix};

/// Fixed statistics a generated trade stream is drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeTemplate {
    pub p_wins: f64,
    pub payoff_ratio: f64,
    pub realized_vol: f64,
    pub cluster: String,
}

impl TradeTemplate {
    pub fn new(p_wins: f64, payoff_ratio: f64, cluster: impl Into<String>) -> Self {
        Self {
            p_wins,
            payoff_ratio,
            realized_vol: 0.1,
            cluster: cluster.into(),
        }
    }
}

/// Seeded outcome sequence: a win pays `+R`, a loss costs `-1`.
#[derive(Debug, Clone)]
pub struct TradeGenerator {
    state: u64,
    template: TradeTemplate,
}

impl TradeGenerator {
    pub fn new(seed: u64, template: TradeTemplate) -> Self {
        assert!(
            template.p_wins.is_finite() && (0.0..=1.0).contains(&template.p_wins),
            "p_wins must be finite and within [0, 1]"
        );
        assert!(
            template.payoff_ratio.is_finite() && template.payoff_ratio > 0.0,
            "payoff_ratio must be finite and positive"
        );

        Self {
            state: seed,
            template,
        }
    }

    pub fn next_trade(&mut self) -> Trade {
        let win = next_unit(&mut self.state) < self.template.p_wins;
        let (outcome, last_result) = if win {
            (self.template.payoff_ratio, LastResult::Win)
        } else {
            (-1.0, LastResult::Loss)
        };

        Trade::new(
            self.template.p_wins,
            self.template.payoff_ratio,
            self.template.cluster.clone(),
            outcome,
            last_result,
        )
        .with_realized_vol(self.template.realized_vol)
    }

    pub fn take_trades(&mut self, count: usize) -> Vec<Trade> {
        (0..count).map(|_| self.next_trade()).collect()
    }

    /// Builds a matrix with one independently seeded stream per asset.
    pub fn matrix(seed: u64, assets: &[(&str, TradeTemplate)], steps: usize) -> TradeMatrix {
        assets
            .iter()
            .enumerate()
            .map(|(index, (asset, template))| {
                let mut generator =
                    Self::new(seed.wrapping_add(index as u64), template.clone());
                (asset.to_string(), generator.take_trades(steps))
            })
            .collect()
    }
}

fn next_u64(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

fn next_unit(state: &mut u64) -> f64 {
    let value = next_u64(state);
    (value as f64) / (u64::MAX as f64)
}
