use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::guard::CheckKind;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Rejected { check: CheckKind, message: String },
    RateLimited(String),
    BadGateway(String),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Rejected { check, message } => write!(f, "Rejected ({check}): {message}"),
            AppError::RateLimited(msg) => write!(f, "Rate Limited: {msg}"),
            AppError::BadGateway(msg) => write!(f, "Bad Gateway: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Rejected { check, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "check": check }),
            ),
            AppError::RateLimited(msg) => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": msg, "check": CheckKind::RateLimit }),
            ),
            AppError::BadGateway(msg) => {
                tracing::error!("Relay failed: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "Submission could not be delivered, please try again later" }),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Fault raised by a key-value store. The guard treats every variant as advisory.
#[derive(Debug)]
pub enum StoreError {
    Unavailable(String),
    Corrupt(String),
    Io(std::io::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {msg}"),
            StoreError::Corrupt(msg) => write!(f, "Store corrupt: {msg}"),
            StoreError::Io(err) => write!(f, "Store I/O error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}
