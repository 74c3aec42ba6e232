use serde::Serialize;
use sizing::ModuleFactor;

/// One sizing decision: what the sizer proposed for an instrument at a
/// timestep, what survived the portfolio caps, and the capital after P&L.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionLogEntry {
    pub step: usize,
    pub instrument: String,
    pub cluster: String,
    pub proposed_size: f64,
    pub applied_size: f64,
    pub capital: f64,
    pub modules: Vec<ModuleFactor>,
}

pub trait DecisionLogWriter {
    fn write(&mut self, entry: DecisionLogEntry);

    /// Writers returning false are never handed entries, and the simulator
    /// skips collecting per-module factors for them.
    fn wants_entries(&self) -> bool {
        true
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDecisionLog;

impl DecisionLogWriter for NoopDecisionLog {
    fn write(&mut self, _entry: DecisionLogEntry) {}

    fn wants_entries(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDecisionLog {
    entries: Vec<DecisionLogEntry>,
}

impl InMemoryDecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[DecisionLogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<DecisionLogEntry> {
        self.entries
    }

    pub fn summary(&self) -> DecisionLogSummary {
        DecisionLogSummary::from_entries(&self.entries)
    }
}

impl DecisionLogWriter for InMemoryDecisionLog {
    fn write(&mut self, entry: DecisionLogEntry) {
        self.entries.push(entry);
    }
}

/// Emits each decision as a `debug` event on the `sizing::decision` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDecisionLog;

impl DecisionLogWriter for TracingDecisionLog {
    fn write(&mut self, entry: DecisionLogEntry) {
        tracing::debug!(
            target: "sizing::decision",
            step = entry.step,
            instrument = %entry.instrument,
            cluster = %entry.cluster,
            proposed = entry.proposed_size,
            applied = entry.applied_size,
            capital = entry.capital,
            modules = entry.modules.len(),
            "sizing decision"
        );
    }

    fn wants_entries(&self) -> bool {
        tracing::enabled!(target: "sizing::decision", tracing::Level::DEBUG)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DecisionLogSummary {
    pub entries: usize,
    pub average_applied: f64,
    pub max_applied: f64,
    pub min_applied: f64,
}

impl DecisionLogSummary {
    /// All statistics are zero for an empty log.
    pub fn from_entries(entries: &[DecisionLogEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }

        let mut total = 0.0;
        let mut max_applied = f64::NEG_INFINITY;
        let mut min_applied = f64::INFINITY;
        for entry in entries {
            total += entry.applied_size;
            max_applied = max_applied.max(entry.applied_size);
            min_applied = min_applied.min(entry.applied_size);
        }

        Self {
            entries: entries.len(),
            average_applied: total / entries.len() as f64,
            max_applied,
            min_applied,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{
        DecisionLogEntry, DecisionLogSummary, DecisionLogWriter, InMemoryDecisionLog,
        NoopDecisionLog,
    };

    fn entry(step: usize, applied_size: f64) -> DecisionLogEntry {
        DecisionLogEntry {
            step,
            instrument: "EURUSD".to_string(),
            cluster: "FX".to_string(),
            proposed_size: 0.2,
            applied_size,
            capital: 100_000.0,
            modules: Vec::new(),
        }
    }

    #[test]
    fn in_memory_log_keeps_write_order() {
        let mut log = InMemoryDecisionLog::new();
        log.write(entry(0, 0.1));
        log.write(entry(1, 0.3));

        assert!(log.wants_entries());
        assert_eq!(log.entries().len(), 2);
        assert_eq!(log.entries()[1].step, 1);
        assert_eq!(log.into_entries()[0].applied_size, 0.1);
    }

    #[test]
    fn summary_reports_average_and_extremes() {
        let mut log = InMemoryDecisionLog::new();
        for (step, size) in [0.1, 0.3, 0.2].into_iter().enumerate() {
            log.write(entry(step, size));
        }

        let summary = log.summary();

        assert_eq!(summary.entries, 3);
        assert_relative_eq!(summary.average_applied, 0.2, epsilon = 1e-12);
        assert_eq!(summary.max_applied, 0.3);
        assert_eq!(summary.min_applied, 0.1);
    }

    #[test]
    fn empty_summary_is_zeroed() {
        assert_eq!(
            DecisionLogSummary::from_entries(&[]),
            DecisionLogSummary::default()
        );
    }

    #[test]
    fn noop_log_declines_entries() {
        assert!(!NoopDecisionLog.wants_entries());
    }
}
