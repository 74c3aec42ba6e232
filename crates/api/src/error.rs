use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sizing::SizingError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("run id counter exhausted")]
    RunIdOverflow,
    #[error("invalid sizing profile: {0}")]
    InvalidProfile(#[from] SizingError),
    #[error("initial capital must be finite and positive, got {0}")]
    InvalidInitialCapital(f64),
    #[error("failed to render decision log: {0}")]
    Csv(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidProfile(_) | Self::InvalidInitialCapital(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::RunIdOverflow | Self::Csv(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "run request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
