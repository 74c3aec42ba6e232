use api::AppState;
use axum::{routing::get, Router};

use crate::config::Config;

pub fn build_app(config: &Config) -> Router {
    api::app_with_state(AppState::with_defaults(config.run_defaults()))
        .route("/health", get(healthcheck))
}

async fn healthcheck() -> &'static str {
    "ok"
}
