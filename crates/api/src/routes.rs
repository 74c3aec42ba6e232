use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use portfolio::{AssetState, PortfolioCaps, SimConfig, TradeMatrix};
use runtime::{
    decisions_to_csv, DecisionLogEntry, DecisionLogSummary, EquitySummary, InMemoryDecisionLog,
    MultiAssetSimulator, SimulationOutput,
};
use serde::{Deserialize, Serialize};
use sizing::SizingProfile;

use crate::{
    error::ApiError,
    state::{AppState, RunEvent},
    ws,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/runs", post(start_run))
        .route("/runs/decisions.csv", post(export_decisions))
        .route("/ws/events", get(ws::events_socket))
        .with_state(state)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunRequest {
    pub trades: TradeMatrix,
    #[serde(default)]
    pub caps: Option<PortfolioCaps>,
    #[serde(default)]
    pub profile: Option<SizingProfile>,
    #[serde(default, alias = "initialCapital")]
    pub initial_capital: Option<f64>,
    #[serde(default, alias = "includeDecisions")]
    pub include_decisions: bool,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub run_id: u64,
    pub steps: usize,
    pub equity: BTreeMap<String, Vec<f64>>,
    pub final_states: BTreeMap<String, AssetState>,
    pub summaries: BTreeMap<String, EquitySummary>,
    pub decision_summary: DecisionLogSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decisions: Option<Vec<DecisionLogEntry>>,
}

struct CompletedRun {
    run_id: u64,
    initial_capital: f64,
    output: SimulationOutput,
    log: InMemoryDecisionLog,
}

fn execute(state: &AppState, request: &RunRequest) -> Result<CompletedRun, ApiError> {
    let defaults = state.defaults();
    let initial_capital = request
        .initial_capital
        .unwrap_or(defaults.config.initial_capital);
    if !initial_capital.is_finite() || initial_capital <= 0.0 {
        return Err(ApiError::InvalidInitialCapital(initial_capital));
    }
    let config = SimConfig {
        initial_capital,
        caps: request.caps.unwrap_or(defaults.config.caps),
    };
    let sizer = request
        .profile
        .as_ref()
        .unwrap_or(&defaults.profile)
        .build()?;

    let run_id = state.start_run()?;
    let simulator = MultiAssetSimulator::new(sizer, config);
    let steps = request.trades.values().map(Vec::len).max().unwrap_or(0);
    // No subscribers is not an error for a run.
    let _ = state.publish_event(RunEvent::run_started(
        run_id,
        request.trades.len(),
        steps,
    ));

    let mut log = InMemoryDecisionLog::new();
    let output = simulator.run_logged(&request.trades, &mut log);
    let _ = state.publish_event(RunEvent::run_completed(
        run_id,
        output.steps,
        log.entries().len(),
    ));

    Ok(CompletedRun {
        run_id,
        initial_capital,
        output,
        log,
    })
}

async fn start_run(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let run = execute(&state, &request)?;
    let location = format!("/runs/{}", run.run_id);

    let summaries = run.output.summaries(run.initial_capital);
    let decision_summary = run.log.summary();
    let response = RunResponse {
        run_id: run.run_id,
        steps: run.output.steps,
        equity: run.output.equity,
        final_states: run.output.final_states,
        summaries,
        decision_summary,
        decisions: request
            .include_decisions
            .then(|| run.log.into_entries()),
    };

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(response),
    ))
}

async fn export_decisions(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let run = execute(&state, &request)?;
    let csv = decisions_to_csv(run.log.entries())?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        csv,
    ))
}
