//! Error-to-response mapping for HTTP handlers.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;
use transfer_core::ledger::LedgerError;
use transfer_shared::AppError;

/// Errors returned by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// A ledger operation failed.
    Ledger(LedgerError),
    /// The request was rejected before reaching the ledger.
    App(AppError),
}

impl ApiError {
    /// Shorthand for a 400 validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::App(AppError::Validation(message.into()))
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Ledger(err) => {
                let status = err.http_status_code();
                if status >= 500 && !matches!(err, LedgerError::Timeout { .. }) {
                    error!(error = %err, "Ledger operation failed");
                    let hidden = AppError::Internal(err.to_string());
                    (hidden.status_code(), hidden.error_code(), hidden.public_message())
                } else {
                    (status, err.error_code(), err.to_string())
                }
            }
            Self::App(err) => {
                if err.status_code() >= 500 {
                    error!(error = %err, "Request failed");
                }
                (err.status_code(), err.error_code(), err.public_message())
            }
        };

        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(json!({
                "error": code,
                "message": message
            })),
        )
            .into_response()
    }
}
