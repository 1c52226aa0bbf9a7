use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate id: {0}")]
    DuplicateId(String),

    #[error("invalid fields: {0}")]
    InvalidFields(String),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("stale report superseded by a newer location")]
    StaleReport,

    #[error("invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("registry busy")]
    Busy,

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::DuplicateId(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::InvalidFields(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::OutOfRange(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::StaleReport => {
                // A superseded report is a no-op for the caller, not a failure.
                let body = Json(json!({ "accepted": false, "reason": "stale_report" }));
                return (StatusCode::OK, body).into_response();
            }
            AppError::InvalidTransition(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Busy => (
                StatusCode::SERVICE_UNAVAILABLE,
                "registry busy, retry".to_string(),
            ),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
