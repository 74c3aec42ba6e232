use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use portfolio::SimConfig;
use sizing::{SizingProfile, DEFAULT_KELLY_CAP};
use tokio::sync::broadcast;

use crate::error::ApiError;

/// Values a run request falls back to when it leaves them out.
#[derive(Clone, Debug, PartialEq)]
pub struct RunDefaults {
    pub config: SimConfig,
    pub profile: SizingProfile,
}

impl RunDefaults {
    pub fn new(config: SimConfig, kelly_cap: f64) -> Self {
        Self {
            config,
            profile: SizingProfile::kelly(kelly_cap),
        }
    }
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self::new(SimConfig::default(), DEFAULT_KELLY_CAP)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum RunEvent {
    Connected {
        run_id: Option<u64>,
    },
    RunStarted {
        run_id: u64,
        assets: usize,
        steps: usize,
    },
    RunCompleted {
        run_id: u64,
        steps: usize,
        decisions: usize,
    },
}

impl RunEvent {
    pub fn connected() -> Self {
        Self::Connected { run_id: None }
    }

    pub fn run_started(run_id: u64, assets: usize, steps: usize) -> Self {
        Self::RunStarted {
            run_id,
            assets,
            steps,
        }
    }

    pub fn run_completed(run_id: u64, steps: usize, decisions: usize) -> Self {
        Self::RunCompleted {
            run_id,
            steps,
            decisions,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppState {
    next_run_id: Arc<AtomicU64>,
    events_tx: broadcast::Sender<RunEvent>,
    defaults: Arc<RunDefaults>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_defaults(RunDefaults::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: RunDefaults) -> Self {
        let (events_tx, _) = broadcast::channel(256);
        Self {
            next_run_id: Arc::new(AtomicU64::new(0)),
            events_tx,
            defaults: Arc::new(defaults),
        }
    }

    pub fn defaults(&self) -> &RunDefaults {
        &self.defaults
    }

    pub fn start_run(&self) -> Result<u64, ApiError> {
        let previous = self
            .next_run_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_add(1)
            })
            .map_err(|_| ApiError::RunIdOverflow)?;

        Ok(previous + 1)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<RunEvent> {
        self.events_tx.subscribe()
    }

    pub fn publish_event(
        &self,
        event: RunEvent,
    ) -> Result<usize, broadcast::error::SendError<RunEvent>> {
        self.events_tx.send(event)
    }
}
