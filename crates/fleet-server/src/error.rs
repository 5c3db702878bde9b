use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fleet_core::FleetError;
use serde::Serialize;

/// Error type shared by all route handlers; renders `{"detail": ...}`.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<FleetError> for ApiError {
    fn from(e: FleetError) -> Self {
        match e {
            FleetError::ConfigError(msg) => ApiError::Internal(msg),
            FleetError::RelayError(msg) => {
                ApiError::Internal(format!("Failed to communicate with Genie: {msg}"))
            }
            other => ApiError::Internal(format!("Failed to communicate with Genie: {other}")),
        }
    }
}
