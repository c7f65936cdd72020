//! Transactional store contract consumed by the ledger.
//!
//! The store owns physical persistence and transaction boundaries. Reads that
//! need no isolation go through [`TransactionalStore`] directly; everything
//! that mutates state goes through a [`UnitOfWork`] obtained from
//! [`TransactionalStore::begin`]. The unit of work is the transaction-bound
//! view of the store: it exposes the same queries, scoped to one connection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{Account, AccountId, LedgerEntry, NewAccountRecord, NewLedgerEntry};

/// Failures reported by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An insert violated a uniqueness constraint.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Any other storage failure.
    #[error("{0}")]
    Backend(String),
}

/// Pool-level access to the ledger's relational store.
#[async_trait]
pub trait TransactionalStore: Send + Sync + 'static {
    /// Transaction-scoped handle returned by [`TransactionalStore::begin`].
    type Tx: UnitOfWork;

    /// Point lookup of a committed account.
    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Committed ledger entries of one account, oldest first.
    async fn list_ledger_entries(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Opens a unit of work on a pooled connection.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// One atomic unit of work.
///
/// Everything issued between `begin` and `commit`/`rollback` is one atomic
/// unit with no externally visible effect until commit. Dropping a handle
/// without committing must roll it back.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Batched lookup; returns only the accounts that exist.
    async fn get_accounts(
        &mut self,
        account_ids: &[AccountId],
    ) -> Result<Vec<Account>, StoreError>;

    /// Inserts an account. Fails with [`StoreError::DuplicateKey`] when the ID is taken.
    async fn create_account(&mut self, record: NewAccountRecord) -> Result<Account, StoreError>;

    /// Atomically decrements the balance by `amount` only where the balance is
    /// at least `amount`. Returns the number of rows changed (0 or 1).
    async fn debit_account(
        &mut self,
        account_id: AccountId,
        amount: Decimal,
        modified_at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Unconditionally increments the balance. Returns the number of rows changed.
    async fn credit_account(
        &mut self,
        account_id: AccountId,
        amount: Decimal,
        modified_at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Appends one ledger entry.
    async fn append_ledger_entry(
        &mut self,
        entry: NewLedgerEntry,
    ) -> Result<LedgerEntry, StoreError>;

    /// Makes the unit of work durable and visible.
    async fn commit(self) -> Result<(), StoreError>;

    /// Discards the unit of work.
    async fn rollback(self) -> Result<(), StoreError>;
}
