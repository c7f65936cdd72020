//! Account routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use transfer_core::ledger::{AccountId, LedgerEntry, NewAccount, TransactionalStore};

use super::{path_account_id, require_account_id, require_amount};
use crate::{ApiError, AppState};

/// Creates the account routes.
pub fn routes<S: TransactionalStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/accounts", post(create_account::<S>))
        .route("/accounts/{account_id}", get(get_balance::<S>))
        .route("/accounts/{account_id}/entries", get(list_entries::<S>))
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct AccountCreationRequest {
    /// Requested account ID, at least 1.
    pub account_id: Option<AccountId>,
    /// Opening balance as a decimal string.
    pub initial_balance: Option<String>,
}

impl AccountCreationRequest {
    fn into_new_account(self) -> Result<NewAccount, ApiError> {
        Ok(NewAccount {
            account_id: require_account_id(self.account_id, "account_id")?,
            initial_balance: require_amount(self.initial_balance.as_deref(), "initial_balance")?,
        })
    }
}

/// Response for an account balance.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// Account ID.
    pub account_id: String,
    /// Current balance.
    pub balance: String,
}

/// Response for one ledger entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct EntryResponse {
    /// Entry ID.
    pub entry_id: i64,
    /// Signed amount.
    pub amount: String,
    /// Entry timestamp (RFC 3339).
    pub created_at: String,
}

impl From<LedgerEntry> for EntryResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            entry_id: entry.entry_id,
            amount: entry.amount.normalize().to_string(),
            created_at: entry.created_date.to_rfc3339(),
        }
    }
}

/// Response for an account's ledger history.
#[derive(Debug, Serialize, Deserialize)]
pub struct EntriesResponse {
    /// Account ID.
    pub account_id: String,
    /// Entries, oldest first.
    pub entries: Vec<EntryResponse>,
}

/// POST `/accounts` - Open an account.
async fn create_account<S: TransactionalStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<AccountCreationRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = payload?;
    let input = request.into_new_account()?;

    let account = state.ledger.create_account(input).await?;

    info!(
        account_id = account.account_id,
        balance = %account.balance,
        "Account created"
    );
    Ok(StatusCode::CREATED)
}

/// GET `/accounts/{account_id}` - Current balance.
async fn get_balance<S: TransactionalStore>(
    State(state): State<AppState<S>>,
    path: Result<Path<AccountId>, PathRejection>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account_id = path_account_id(path)?;
    let account = state.ledger.get_balance(account_id).await?;

    Ok(Json(BalanceResponse {
        account_id: account.account_id.to_string(),
        balance: account.balance.normalize().to_string(),
    }))
}

/// GET `/accounts/{account_id}/entries` - Ledger history.
async fn list_entries<S: TransactionalStore>(
    State(state): State<AppState<S>>,
    path: Result<Path<AccountId>, PathRejection>,
) -> Result<Json<EntriesResponse>, ApiError> {
    let account_id = path_account_id(path)?;
    let entries = state.ledger.list_entries(account_id).await?;

    Ok(Json(EntriesResponse {
        account_id: account_id.to_string(),
        entries: entries.into_iter().map(EntryResponse::from).collect(),
    }))
}
