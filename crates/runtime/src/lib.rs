pub mod engine;
pub mod logging;
pub mod metrics;
pub mod replay;

pub use engine::{MultiAssetSimulator, SimulationOutput, SimulationRun, StepReport};
pub use logging::{
    DecisionLogEntry, DecisionLogSummary, DecisionLogWriter, InMemoryDecisionLog,
    NoopDecisionLog, TracingDecisionLog,
};
pub use metrics::EquitySummary;
pub use replay::{decisions_to_csv, ReplayCsvWriter, REPLAY_CSV_HEADER};
