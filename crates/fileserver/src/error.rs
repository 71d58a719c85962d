//! HTTP error mapping

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use progress::StoreError;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No node at the requested path, or its file vanished from disk
    #[error("{0}")]
    NotFound(String),
    /// The node exists but has the wrong kind for the operation
    #[error("{0}")]
    InvalidPath(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Range not satisfiable. File size: {0}")]
    RangeNotSatisfiable(u64),
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidPosition(_) => AppError::BadRequest(err.to_string()),
            _ => AppError::Internal(format!("Failed to save progress: {}", err)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidPath(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RangeNotSatisfiable(_) => StatusCode::RANGE_NOT_SATISFIABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));

        match self {
            AppError::RangeNotSatisfiable(size) => (
                status,
                [(header::CONTENT_RANGE, format!("bytes */{}", size))],
                body,
            )
                .into_response(),
            _ => (status, body).into_response(),
        }
    }
}
