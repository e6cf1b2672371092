use axum::{http::StatusCode, Json};
use coinwatch::domain::WatchlistItem;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct WatchlistResponse {
    pub message: String,
    pub watchlist: Vec<WatchlistItem>,
}

impl WatchlistResponse {
    pub fn new(message: impl Into<String>, watchlist: Vec<WatchlistItem>) -> Self {
        Self {
            message: message.into(),
            watchlist,
        }
    }
}

// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

/// Translate a core error into its client-facing shape. Server faults get
/// `fallback`, a fixed message; the detail stays in the logs.
pub fn from_core_error(err: &shared::Error, fallback: &str) -> ApiError {
    match err {
        shared::Error::DuplicateWatchlistEntry(_) => {
            api_error(StatusCode::BAD_REQUEST, "Coin already in watchlist")
        }
        shared::Error::InvalidInput(message) => api_error(StatusCode::BAD_REQUEST, message.clone()),
        other => {
            tracing::error!("{}: {}", fallback, other);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, fallback)
        }
    }
}
