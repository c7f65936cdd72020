//! API route definitions.

use axum::Router;
use axum::extract::Path;
use axum::extract::rejection::PathRejection;
use axum::http::Uri;
use rust_decimal::Decimal;
use transfer_core::ledger::{AccountId, TransactionalStore};
use transfer_shared::{AppError, AppResult, parse_amount};

use crate::{ApiError, AppState};

pub mod accounts;
pub mod health;
pub mod transactions;

/// Creates the API router with all routes.
pub fn api_routes<S: TransactionalStore>() -> Router<AppState<S>> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(transactions::routes())
}

/// Handler for unknown routes.
pub async fn fallback(uri: Uri) -> ApiError {
    ApiError::App(AppError::NotFound(format!("No route for {uri}")))
}

/// Checks that a body field holds a positive account ID.
fn require_account_id(value: Option<AccountId>, field: &str) -> AppResult<AccountId> {
    match value {
        Some(id) if id >= 1 => Ok(id),
        Some(_) => Err(AppError::Validation(format!("{field} must be at least 1"))),
        None => Err(AppError::Validation(format!("{field} is required"))),
    }
}

/// Parses a body field holding a decimal string. The sign is checked by the ledger.
fn require_amount(value: Option<&str>, field: &str) -> AppResult<Decimal> {
    let raw = value.ok_or_else(|| AppError::Validation(format!("{field} is required")))?;
    parse_amount(raw).map_err(|e| AppError::Validation(format!("{field}: {e}")))
}

/// Extracts a positive account ID from the path.
fn path_account_id(path: Result<Path<AccountId>, PathRejection>) -> AppResult<AccountId> {
    let invalid = || AppError::Validation("invalid account id".to_string());
    let Path(account_id) = path.map_err(|_| invalid())?;
    if account_id < 1 {
        return Err(invalid());
    }
    Ok(account_id)
}
