use std::collections::BTreeMap;

use portfolio::{
    enforce_portfolio_caps, AssetState, CappedExposure, ExposureRequest, PortfolioCaps, SimConfig,
    Trade, TradeMatrix,
};
use serde::Serialize;
use sizing::{ModuleFactor, PositionSizer, SizingInputs};

use crate::logging::{DecisionLogEntry, DecisionLogWriter, NoopDecisionLog};
use crate::metrics::EquitySummary;

/// Drives the per-timestep sizing, cap enforcement and capital update loop
/// over a trade matrix.
#[derive(Debug)]
pub struct MultiAssetSimulator {
    sizer: PositionSizer,
    config: SimConfig,
}

impl MultiAssetSimulator {
    pub fn new(sizer: PositionSizer, config: SimConfig) -> Self {
        Self { sizer, config }
    }

    pub fn sizer(&self) -> &PositionSizer {
        &self.sizer
    }

    pub fn caps(&self) -> &PortfolioCaps {
        &self.config.caps
    }

    pub fn initial_capital(&self) -> f64 {
        self.config.initial_capital
    }

    pub fn start<'a>(&'a self, trades: &'a TradeMatrix) -> SimulationRun<'a> {
        SimulationRun::new(self, trades)
    }

    pub fn run(&self, trades: &TradeMatrix) -> SimulationOutput {
        self.run_logged(trades, &mut NoopDecisionLog)
    }

    pub fn run_logged(
        &self,
        trades: &TradeMatrix,
        log: &mut dyn DecisionLogWriter,
    ) -> SimulationOutput {
        let mut run = self.start(trades);
        tracing::info!(
            assets = trades.len(),
            steps = run.max_len(),
            sizer = %self.sizer.metadata().id,
            "simulation started"
        );

        while run.step_once(log).is_some() {}

        let output = run.finish();
        tracing::info!(
            assets = output.equity.len(),
            steps = output.steps,
            "simulation finished"
        );
        output
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub exposures: Vec<CappedExposure>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationOutput {
    pub steps: usize,
    pub equity: BTreeMap<String, Vec<f64>>,
    pub final_states: BTreeMap<String, AssetState>,
}

impl SimulationOutput {
    pub fn curve(&self, asset: &str) -> Option<&[f64]> {
        self.equity.get(asset).map(Vec::as_slice)
    }

    pub fn summaries(&self, initial_capital: f64) -> BTreeMap<String, EquitySummary> {
        self.equity
            .iter()
            .map(|(asset, curve)| {
                (
                    asset.clone(),
                    EquitySummary::from_curve(initial_capital, curve),
                )
            })
            .collect()
    }
}

#[derive(Debug)]
struct AssetBook {
    state: AssetState,
    equity: Vec<f64>,
}

/// One simulation in progress. Each `step_once` completes a full timestep:
/// every asset's request is collected before caps are enforced and any
/// capital moves.
#[derive(Debug)]
pub struct SimulationRun<'a> {
    simulator: &'a MultiAssetSimulator,
    trades: &'a TradeMatrix,
    books: BTreeMap<&'a str, AssetBook>,
    step: usize,
    max_len: usize,
}

impl<'a> SimulationRun<'a> {
    fn new(simulator: &'a MultiAssetSimulator, trades: &'a TradeMatrix) -> Self {
        let books = trades
            .iter()
            .map(|(asset, sequence)| {
                (
                    asset.as_str(),
                    AssetBook {
                        state: AssetState::new(simulator.initial_capital()),
                        equity: Vec::with_capacity(sequence.len()),
                    },
                )
            })
            .collect();
        let max_len = trades.values().map(Vec::len).max().unwrap_or(0);

        Self {
            simulator,
            trades,
            books,
            step: 0,
            max_len,
        }
    }

    pub fn step_index(&self) -> usize {
        self.step
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.max_len
    }

    pub fn state(&self, asset: &str) -> Option<&AssetState> {
        self.books.get(asset).map(|book| &book.state)
    }

    pub fn step_once(&mut self, log: &mut dyn DecisionLogWriter) -> Option<StepReport> {
        if self.is_finished() {
            return None;
        }
        let t = self.step;
        let detailed = log.wants_entries();
        let sizer = self.simulator.sizer();

        let mut active: Vec<(&'a str, &'a Trade, Vec<ModuleFactor>)> = Vec::new();
        let mut requests = Vec::new();
        for (asset, sequence) in self.trades {
            let Some(trade) = sequence.get(t) else {
                continue;
            };
            let Some(book) = self.books.get(asset.as_str()) else {
                continue;
            };

            let inputs = SizingInputs::from_trade(&book.state, trade);
            let (requested_size, factors) = if !trade.has_statistics() {
                (0.0, Vec::new())
            } else if detailed {
                let decision = sizer.compute_traced(&inputs);
                (decision.size, decision.factors)
            } else {
                (sizer.compute(&inputs), Vec::new())
            };

            requests.push(ExposureRequest::new(
                asset.clone(),
                trade.cluster.clone(),
                requested_size,
            ));
            active.push((asset.as_str(), trade, factors));
        }

        let exposures = enforce_portfolio_caps(&requests, self.simulator.caps());

        for (exposure, (asset, trade, factors)) in exposures.iter().zip(active) {
            let Some(book) = self.books.get_mut(asset) else {
                continue;
            };
            book.state.apply(exposure.applied_size, trade);
            book.equity.push(book.state.capital);

            if exposure.was_scaled() {
                tracing::debug!(
                    step = t,
                    instrument = asset,
                    cluster = %exposure.cluster,
                    requested = exposure.requested_size,
                    applied = exposure.applied_size,
                    "portfolio caps scaled exposure"
                );
            }
            if detailed {
                log.write(DecisionLogEntry {
                    step: t,
                    instrument: exposure.instrument.clone(),
                    cluster: exposure.cluster.clone(),
                    proposed_size: exposure.requested_size,
                    applied_size: exposure.applied_size,
                    capital: book.state.capital,
                    modules: factors,
                });
            }
        }

        self.step += 1;
        Some(StepReport { step: t, exposures })
    }

    pub fn finish(self) -> SimulationOutput {
        let mut output = SimulationOutput {
            steps: self.step,
            ..SimulationOutput::default()
        };
        for (asset, book) in self.books {
            output.final_states.insert(asset.to_string(), book.state);
            output.equity.insert(asset.to_string(), book.equity);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use portfolio::{
        LastResult, PortfolioCaps, SimConfig, Trade, TradeGenerator, TradeMatrix, TradeTemplate,
    };
    use sizing::{
        ModuleEntry, ModuleSpec, PositionSizer, RiskModule, SizingInputs, SizingProfile,
    };

    use super::MultiAssetSimulator;
    use crate::logging::{InMemoryDecisionLog, NoopDecisionLog};

    #[derive(Debug)]
    struct FixedSize(f64);

    impl RiskModule for FixedSize {
        fn name(&self) -> &str {
            "fixed"
        }

        fn adjust(&self, _inputs: &SizingInputs) -> f64 {
            self.0
        }
    }

    fn config(caps: PortfolioCaps) -> SimConfig {
        SimConfig {
            initial_capital: 100_000.0,
            caps,
        }
    }

    fn open_caps() -> PortfolioCaps {
        PortfolioCaps {
            global_cap: 1.0,
            per_instrument_cap: 1.0,
            per_cluster_cap: 1.0,
        }
    }

    fn fx(outcome: f64, last_result: LastResult) -> Trade {
        Trade::new(0.55, 1.5, "FX", outcome, last_result)
    }

    #[test]
    fn single_step_applies_sized_pnl() {
        let simulator = MultiAssetSimulator::new(
            PositionSizer::new(vec![Box::new(FixedSize(0.02))]),
            config(open_caps()),
        );
        let trades = TradeMatrix::from([("EURUSD".to_string(), vec![fx(0.01, LastResult::Win)])]);

        let output = simulator.run(&trades);

        let state = output.final_states["EURUSD"];
        assert_relative_eq!(state.capital, 100_020.0, epsilon = 1e-9);
        assert_relative_eq!(state.high_water_mark, 100_020.0, epsilon = 1e-9);
        assert_eq!(state.step, 1);
        assert_eq!(output.curve("EURUSD").unwrap().len(), 1);
    }

    #[test]
    fn shorter_sequences_stop_contributing() {
        let simulator = MultiAssetSimulator::new(
            SizingProfile::basic().build().unwrap(),
            SimConfig::default(),
        );
        let trades = TradeMatrix::from([
            ("EURUSD".to_string(), vec![fx(1.5, LastResult::Win); 5]),
            ("GBPUSD".to_string(), vec![fx(-1.0, LastResult::Loss); 2]),
            ("USDJPY".to_string(), Vec::new()),
        ]);

        let output = simulator.run(&trades);

        assert_eq!(output.steps, 5);
        assert_eq!(output.curve("EURUSD").unwrap().len(), 5);
        assert_eq!(output.curve("GBPUSD").unwrap().len(), 2);
        assert_eq!(output.curve("USDJPY").unwrap().len(), 0);
        assert_eq!(output.final_states["USDJPY"].capital, 100_000.0);
    }

    #[test]
    fn cluster_cap_binds_across_assets_in_the_same_step() {
        let simulator = MultiAssetSimulator::new(
            PositionSizer::new(vec![Box::new(FixedSize(0.04))]),
            config(PortfolioCaps {
                global_cap: 1.0,
                per_instrument_cap: 1.0,
                per_cluster_cap: 0.05,
            }),
        );
        let trades = TradeMatrix::from([
            ("EURUSD".to_string(), vec![fx(1.0, LastResult::Win)]),
            ("GBPUSD".to_string(), vec![fx(1.0, LastResult::Win)]),
        ]);
        let mut run = simulator.start(&trades);

        let report = run.step_once(&mut NoopDecisionLog).unwrap();

        assert_eq!(report.exposures.len(), 2);
        for exposure in &report.exposures {
            assert_relative_eq!(exposure.applied_size, 0.025, epsilon = 1e-12);
        }
        assert_relative_eq!(
            run.state("EURUSD").unwrap().capital,
            102_500.0,
            epsilon = 1e-9
        );
        assert!(run.step_once(&mut NoopDecisionLog).is_none());
    }

    #[test]
    fn high_water_mark_never_decreases() {
        let trades = TradeGenerator::matrix(
            21,
            &[
                ("EURUSD", TradeTemplate::new(0.5, 1.5, "FX")),
                ("GBPUSD", TradeTemplate::new(0.45, 2.0, "FX")),
                ("BTC", TradeTemplate::new(0.4, 3.0, "crypto")),
            ],
            200,
        );
        let simulator = MultiAssetSimulator::new(
            SizingProfile::default().build().unwrap(),
            SimConfig::default(),
        );
        let mut run = simulator.start(&trades);
        let mut previous: Vec<f64> = vec![100_000.0; 3];

        while run.step_once(&mut NoopDecisionLog).is_some() {
            for (index, asset) in ["BTC", "EURUSD", "GBPUSD"].iter().enumerate() {
                let state = run.state(asset).unwrap();
                assert!(state.high_water_mark >= previous[index]);
                assert!(state.high_water_mark >= state.capital);
                previous[index] = state.high_water_mark;
            }
        }
        assert!(run.is_finished());
    }

    #[test]
    fn applied_sizes_stay_within_requested_and_unit_bounds() {
        let trades = TradeGenerator::matrix(
            5,
            &[
                ("EURUSD", TradeTemplate::new(0.6, 2.0, "FX")),
                ("GBPUSD", TradeTemplate::new(0.6, 2.0, "FX")),
                ("BTC", TradeTemplate::new(0.7, 3.0, "crypto")),
            ],
            50,
        );
        let simulator = MultiAssetSimulator::new(
            SizingProfile::kelly(1.0).build().unwrap(),
            config(PortfolioCaps {
                global_cap: 0.5,
                per_instrument_cap: 0.3,
                per_cluster_cap: 0.4,
            }),
        );
        let mut run = simulator.start(&trades);

        while let Some(report) = run.step_once(&mut NoopDecisionLog) {
            for exposure in report.exposures {
                assert!(exposure.applied_size >= 0.0);
                assert!(exposure.applied_size <= exposure.requested_size);
                assert!(exposure.requested_size <= 1.0);
            }
        }
    }

    #[test]
    fn malformed_trade_requests_nothing_and_keeps_capital() {
        let simulator = MultiAssetSimulator::new(
            SizingProfile::default().build().unwrap(),
            SimConfig::default(),
        );
        let mut malformed = fx(-1.0, LastResult::Loss);
        malformed.p_wins = None;
        let trades = TradeMatrix::from([("EURUSD".to_string(), vec![malformed])]);

        let output = simulator.run(&trades);

        assert_eq!(output.curve("EURUSD").unwrap(), &[100_000.0]);
        assert_eq!(output.final_states["EURUSD"].step, 0);
    }

    #[test]
    fn malformed_trade_stakes_nothing_without_a_kelly_module() {
        let profiles = [
            SizingProfile {
                modules: vec![ModuleEntry::new(
                    0,
                    ModuleSpec::VolatilityTarget {
                        target_vol: 0.1,
                        cap_multiplier: 2.0,
                    },
                )],
                ..SizingProfile::default()
            },
            SizingProfile {
                modules: Vec::new(),
                ..SizingProfile::default()
            },
        ];
        let mut malformed = fx(-1.0, LastResult::Loss);
        malformed.p_wins = None;
        malformed.payoff_ratio = None;
        let mut non_finite = fx(-1.0, LastResult::Loss);
        non_finite.payoff_ratio = Some(f64::NAN);
        let trades = TradeMatrix::from([
            ("EURUSD".to_string(), vec![malformed]),
            ("GBPUSD".to_string(), vec![non_finite]),
        ]);

        for profile in profiles {
            let simulator = MultiAssetSimulator::new(profile.build().unwrap(), SimConfig::default());
            let mut log = InMemoryDecisionLog::new();

            let output = simulator.run_logged(&trades, &mut log);

            assert_eq!(output.curve("EURUSD").unwrap(), &[100_000.0]);
            assert_eq!(output.curve("GBPUSD").unwrap(), &[100_000.0]);
            assert!(log.entries().iter().all(|entry| entry.proposed_size == 0.0));
        }
    }

    #[test]
    fn decision_log_records_every_sized_trade() {
        let simulator = MultiAssetSimulator::new(
            SizingProfile::basic().build().unwrap(),
            SimConfig::default(),
        );
        let trades = TradeMatrix::from([
            ("EURUSD".to_string(), vec![fx(1.5, LastResult::Win); 3]),
            ("BTC".to_string(), vec![fx(-1.0, LastResult::Loss); 1]),
        ]);
        let mut log = InMemoryDecisionLog::new();

        let output = simulator.run_logged(&trades, &mut log);

        assert_eq!(log.entries().len(), 4);
        let first = &log.entries()[0];
        assert_eq!(first.step, 0);
        assert_eq!(first.instrument, "BTC");
        assert_eq!(first.modules.len(), 1);
        assert_eq!(first.modules[0].module, "kelly");
        assert_eq!(output, simulator.run(&trades));
    }

    #[test]
    fn empty_matrix_completes_immediately() {
        let simulator = MultiAssetSimulator::new(
            SizingProfile::default().build().unwrap(),
            SimConfig::default(),
        );

        let output = simulator.run(&TradeMatrix::new());

        assert_eq!(output.steps, 0);
        assert!(output.equity.is_empty());
    }
}
