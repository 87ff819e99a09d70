//! Error types shared across the crate

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while constructing a countdown
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimerError {
    #[error("Invalid time limit: {0} minutes (must be a positive, finite number)")]
    InvalidTimeLimit(f64),
}

/// Failures of the fallback auto-submission call
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Submission request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Submission rejected with status {status}")]
    Rejected { status: u16 },
}

/// Errors returned by the HTTP API
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Countdown for submission {0} has already expired")]
    AlreadyExpired(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Timer(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyExpired(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = json!({
            "error": self.to_string(),
            "timestamp": Utc::now(),
        });

        (status, Json(body)).into_response()
    }
}
