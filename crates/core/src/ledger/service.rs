//! Account ledger service.
//!
//! `AccountLedger` validates inputs, runs each mutating operation as one unit
//! of work against a [`TransactionalStore`], and classifies store outcomes into
//! [`LedgerError`]. It holds no mutable state of its own: concurrent transfers
//! on the same account are kept consistent by the store's conditional debit.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, error, warn};
use transfer_shared::{LedgerConfig, round_amount};

use super::error::LedgerError;
use super::store::{StoreError, TransactionalStore, UnitOfWork};
use super::types::{
    Account, AccountId, LedgerEntry, NewAccount, NewAccountRecord, NewLedgerEntry, Transfer,
};

/// Business-rule layer over a transactional store.
#[derive(Debug, Clone)]
pub struct AccountLedger<S> {
    store: S,
    operation_timeout: Option<Duration>,
}

impl<S: TransactionalStore> AccountLedger<S> {
    /// Creates a ledger with no operation deadline.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            operation_timeout: None,
        }
    }

    /// Creates a ledger using the configured operation deadline.
    #[must_use]
    pub fn with_config(store: S, config: &LedgerConfig) -> Self {
        Self {
            store,
            operation_timeout: config.operation_timeout(),
        }
    }

    /// Sets the deadline applied to each mutating operation.
    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Opens an account with a rounded opening balance and one matching
    /// ledger entry.
    ///
    /// Account IDs below 1 are rejected by the HTTP layer before reaching
    /// here; a direct call with one fails in the store's positive-ID check.
    ///
    /// # Errors
    ///
    /// - `NegativeBalance` if `initial_balance < 0` (no I/O is performed)
    /// - `AlreadyExists` if the account ID is taken
    /// - `Timeout` if the operation deadline expires
    /// - `Internal` for any other store failure, including an ID below 1 or
    ///   a balance at or above
    ///   [`AMOUNT_LIMIT`](transfer_shared::AMOUNT_LIMIT)
    pub async fn create_account(&self, input: NewAccount) -> Result<Account, LedgerError> {
        if input.initial_balance < Decimal::ZERO {
            return Err(LedgerError::NegativeBalance);
        }

        let account_id = input.account_id;
        let balance = round_amount(input.initial_balance);
        let context = format!("create account {account_id}");

        let account = self
            .bounded("create account", async {
                let mut tx = self.begin(&context).await?;
                let result = insert_account(&mut tx, account_id, balance, &context).await;
                settle(tx, result, &context).await
            })
            .await?;

        debug!(account_id, balance = %account.balance, "Account created");
        Ok(account)
    }

    /// Returns the account with its current balance.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account does not exist
    /// - `Internal` if the store lookup fails
    pub async fn get_balance(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.store
            .get_account(account_id)
            .await
            .map_err(|e| LedgerError::internal(format!("get account {account_id}"), e))?
            .ok_or(LedgerError::NotFound(account_id))
    }

    /// Moves `amount` from the source account to the destination account.
    ///
    /// The debit is a single conditional store update, so a concurrent
    /// transfer can never drive the source below zero.
    ///
    /// # Errors
    ///
    /// - `NegativeAmount` if `amount < 0`, `SameAccount` if both IDs match
    ///   (both checked before any I/O)
    /// - `AccountNotFound` if either account is missing
    /// - `InsufficientFunds` if the source balance is below `amount`
    /// - `Timeout` if the operation deadline expires
    /// - `Internal` for any other store failure, including a credit that
    ///   would take the destination to
    ///   [`AMOUNT_LIMIT`](transfer_shared::AMOUNT_LIMIT) or beyond
    pub async fn create_transfer(&self, transfer: Transfer) -> Result<(), LedgerError> {
        if transfer.amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
        if transfer.source_account_id == transfer.destination_account_id {
            return Err(LedgerError::SameAccount);
        }

        let transfer = Transfer {
            amount: round_amount(transfer.amount),
            ..transfer
        };
        let context = format!(
            "create transfer {} -> {}",
            transfer.source_account_id, transfer.destination_account_id
        );

        self.bounded("create transfer", async {
            let mut tx = self.begin(&context).await?;
            let result = move_funds(&mut tx, &transfer, &context).await;
            settle(tx, result, &context).await
        })
        .await?;

        debug!(
            source_account_id = transfer.source_account_id,
            destination_account_id = transfer.destination_account_id,
            amount = %transfer.amount,
            "Transfer committed"
        );
        Ok(())
    }

    /// Returns the ledger entries of an account, oldest first.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account does not exist
    /// - `Internal` if the store lookup fails
    pub async fn list_entries(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.get_balance(account_id).await?;
        self.store
            .list_ledger_entries(account_id)
            .await
            .map_err(|e| LedgerError::internal(format!("list entries {account_id}"), e))
    }

    async fn begin(&self, context: &str) -> Result<S::Tx, LedgerError> {
        self.store
            .begin()
            .await
            .map_err(|e| LedgerError::internal(format!("{context}: begin transaction"), e))
    }

    /// Runs `work` under the operation deadline. On expiry the future is
    /// dropped, which rolls back any open unit of work.
    async fn bounded<T, F>(&self, operation: &'static str, work: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, LedgerError>>,
    {
        let Some(limit) = self.operation_timeout else {
            return work.await;
        };

        match tokio::time::timeout(limit, work).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout = ?limit, "Ledger operation timed out");
                Err(LedgerError::Timeout { operation })
            }
        }
    }
}

async fn insert_account<U: UnitOfWork>(
    tx: &mut U,
    account_id: AccountId,
    balance: Decimal,
    context: &str,
) -> Result<Account, LedgerError> {
    let now = Utc::now();
    let account = tx
        .create_account(NewAccountRecord {
            account_id,
            balance,
            created_date: now,
            last_modified_date: now,
        })
        .await
        .map_err(|e| match e {
            StoreError::DuplicateKey(_) => LedgerError::AlreadyExists(account_id),
            other => LedgerError::internal(format!("{context}: insert account"), other),
        })?;

    tx.append_ledger_entry(NewLedgerEntry {
        account_id,
        amount: balance,
        created_date: now,
    })
    .await
    .map_err(|e| LedgerError::internal(format!("{context}: append ledger entry"), e))?;

    Ok(account)
}

async fn move_funds<U: UnitOfWork>(
    tx: &mut U,
    transfer: &Transfer,
    context: &str,
) -> Result<(), LedgerError> {
    let source = transfer.source_account_id;
    let destination = transfer.destination_account_id;
    let amount = transfer.amount;

    let found = tx
        .get_accounts(&[source, destination])
        .await
        .map_err(|e| LedgerError::internal(format!("{context}: check accounts"), e))?;
    if found.len() < 2 {
        return Err(LedgerError::AccountNotFound {
            source_id: source,
            destination_id: destination,
        });
    }

    let now = Utc::now();
    let debited = tx
        .debit_account(source, amount, now)
        .await
        .map_err(|e| LedgerError::internal(format!("{context}: debit account"), e))?;
    if debited == 0 {
        debug!(account_id = source, amount = %amount, "Insufficient funds");
        return Err(LedgerError::InsufficientFunds(source));
    }

    let credited = tx
        .credit_account(destination, amount, now)
        .await
        .map_err(|e| LedgerError::internal(format!("{context}: credit account"), e))?;
    if credited == 0 {
        return Err(LedgerError::internal(
            format!("{context}: credit account"),
            StoreError::Backend(format!("account {destination} not updated")),
        ));
    }

    for (account_id, signed) in [(source, -amount), (destination, amount)] {
        tx.append_ledger_entry(NewLedgerEntry {
            account_id,
            amount: signed,
            created_date: now,
        })
        .await
        .map_err(|e| LedgerError::internal(format!("{context}: append ledger entry"), e))?;
    }

    Ok(())
}

/// Commits on success, rolls back on failure. A failed rollback is logged and
/// the original error is returned.
async fn settle<T, U: UnitOfWork>(
    tx: U,
    result: Result<T, LedgerError>,
    context: &str,
) -> Result<T, LedgerError> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| LedgerError::internal(format!("{context}: commit transaction"), e))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!(
                    error = %rollback_err,
                    cause = %err,
                    "{context}: rollback failed"
                );
            }
            Err(err)
        }
    }
}
