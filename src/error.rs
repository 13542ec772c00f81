use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::foods::repo::FoodRecord;

/// Failure taxonomy for the resolution and logging core. Every variant is
/// surfaced to the caller with enough context to decide the next step;
/// nothing is silently recovered here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("nutrient catalog unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("invalid catalog payload for {external_id}: {reason}")]
    InvalidUpstreamData { external_id: i64, reason: String },

    #[error("record already exists: {}", existing.description)]
    DuplicateRecord { existing: Box<FoodRecord> },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidUpstreamData { .. } => StatusCode::BAD_GATEWAY,
            AppError::DuplicateRecord { .. } => StatusCode::CONFLICT,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(e) => {
                error!(error = %e, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // A duplicate must hand back the existing record so the caller can
        // reuse it instead of losing the user's entry.
        let body = match self {
            AppError::DuplicateRecord { existing } => {
                json!({ "error": "record already exists", "existing": *existing })
            }
            AppError::Internal(_) => json!({ "error": "internal error" }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
