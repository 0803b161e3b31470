//! Unified error handling for the server.

use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Reasons a reconciliation pass stops before mutating the store.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("record {index} failed to map: {source}")]
    Mapping {
        index: usize,
        code: Option<String>,
        #[source]
        source: bondsync_engine::Error,
    },

    #[error("authentication failed: {0}")]
    Auth(#[source] StoreError),

    #[error("remote snapshot incomplete after {pages_fetched} page(s): {source}")]
    IncompleteSnapshot {
        pages_fetched: usize,
        #[source]
        source: StoreError,
    },
}

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            AppError::Sync(SyncError::Mapping { code, .. }) => {
                tracing::warn!("Mapping error: {}", self);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    self.to_string(),
                    code.clone(),
                )
            }
            AppError::Sync(e) => {
                tracing::error!("Upstream error: {:?}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Remote store unavailable".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;
