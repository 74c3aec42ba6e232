pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

use axum::Router;

pub use error::ApiError;
pub use state::{AppState, RunDefaults, RunEvent};

pub fn app() -> Router {
    app_with_state(AppState::new())
}

pub fn app_with_state(state: AppState) -> Router {
    routes::router(state)
}
