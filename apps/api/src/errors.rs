use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::analyzer::AnalysisError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Primary analysis call failed (transport, bad status, or unusable payload).
    /// Carries the user-facing message; detail is logged where the failure occurred.
    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Unreadable file: {0}")]
    UnreadableFile(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError::Analysis(err.message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Analysis(msg) => {
                tracing::error!("Analysis error: {msg}");
                (StatusCode::BAD_GATEWAY, "ANALYSIS_ERROR", msg.clone())
            }
            AppError::UnsupportedFileType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_FILE_TYPE",
                msg.clone(),
            ),
            AppError::UnreadableFile(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNREADABLE_FILE",
                msg.clone(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
