//! Transfer routes.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use serde::Deserialize;
use tracing::info;
use transfer_core::ledger::{AccountId, TransactionalStore, Transfer};

use super::{require_account_id, require_amount};
use crate::{ApiError, AppState};

/// Creates the transfer routes.
pub fn routes<S: TransactionalStore>() -> Router<AppState<S>> {
    Router::new().route("/transactions", post(create_transaction::<S>))
}

/// Request body for a transfer.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    /// Account to debit.
    pub source_account_id: Option<AccountId>,
    /// Account to credit.
    pub destination_account_id: Option<AccountId>,
    /// Amount as a decimal string.
    pub amount: Option<String>,
}

impl TransactionRequest {
    fn into_transfer(self) -> Result<Transfer, ApiError> {
        Ok(Transfer {
            source_account_id: require_account_id(self.source_account_id, "source_account_id")?,
            destination_account_id: require_account_id(
                self.destination_account_id,
                "destination_account_id",
            )?,
            amount: require_amount(self.amount.as_deref(), "amount")?,
        })
    }
}

/// POST `/transactions` - Transfer between two accounts.
async fn create_transaction<S: TransactionalStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = payload?;
    let transfer = request.into_transfer()?;

    state.ledger.create_transfer(transfer).await?;

    info!(
        source_account_id = transfer.source_account_id,
        destination_account_id = transfer.destination_account_id,
        amount = %transfer.amount,
        "Transfer created"
    );
    Ok(StatusCode::CREATED)
}
