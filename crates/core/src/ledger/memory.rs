//! In-memory implementation of the transactional store.
//!
//! Units of work are serialised: `begin` takes an exclusive lock on the
//! committed state and works on a private copy, which `commit` publishes and
//! `rollback` (or drop) discards. Failures and latency can be injected per
//! step so callers can exercise their rollback and deadline paths.
//!
//! Writes are checked the way the Postgres schema checks them: account IDs
//! must be positive and stored amounts must stay below [`AMOUNT_LIMIT`].

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use transfer_shared::AMOUNT_LIMIT;

use super::store::{StoreError, TransactionalStore, UnitOfWork};
use super::types::{Account, AccountId, LedgerEntry, NewAccountRecord, NewLedgerEntry};

/// Store steps at which a failure can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// Opening a unit of work.
    Begin,
    /// Batched account lookup.
    GetAccounts,
    /// Account insert.
    CreateAccount,
    /// Conditional debit.
    DebitAccount,
    /// Unconditional credit.
    CreditAccount,
    /// Ledger entry append.
    AppendLedgerEntry,
    /// Commit.
    Commit,
    /// Rollback.
    Rollback,
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    accounts: BTreeMap<AccountId, Account>,
    entries: Vec<LedgerEntry>,
    last_entry_id: i64,
}

#[derive(Debug, Default)]
struct Controls {
    faults: HashSet<FailPoint>,
    latency: Option<Duration>,
}

impl Controls {
    fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        if self.faults.contains(&point) {
            return Err(StoreError::Backend(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

/// Shared in-memory ledger store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<AsyncMutex<LedgerState>>,
    controls: Arc<Mutex<Controls>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call at `point` fail with a backend error.
    pub fn fail_at(&self, point: FailPoint) {
        self.with_controls(|controls| {
            controls.faults.insert(point);
        });
    }

    /// Removes all injected failures.
    pub fn clear_faults(&self) {
        self.with_controls(|controls| controls.faults.clear());
    }

    /// Delays every store call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.with_controls(|controls| controls.latency = latency);
    }

    /// Total number of committed ledger entries across all accounts.
    pub async fn ledger_len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    fn with_controls<T>(&self, f: impl FnOnce(&mut Controls) -> T) -> T {
        let mut controls = self.controls.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut controls)
    }

    async fn enter(&self, point: Option<FailPoint>) -> Result<(), StoreError> {
        enter(&self.controls, point).await
    }
}

fn check_numeric(value: Decimal, column: &str) -> Result<Decimal, StoreError> {
    if value.abs() >= AMOUNT_LIMIT {
        return Err(StoreError::Backend(format!(
            "numeric field overflow: {column}={value}"
        )));
    }
    Ok(value)
}

async fn enter(controls: &Mutex<Controls>, point: Option<FailPoint>) -> Result<(), StoreError> {
    let latency = {
        let controls = controls.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(point) = point {
            controls.check(point)?;
        }
        controls.latency
    };

    if let Some(latency) = latency {
        tokio::time::sleep(latency).await;
    }
    Ok(())
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    type Tx = MemoryUnitOfWork;

    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        self.enter(None).await?;
        Ok(self.state.lock().await.accounts.get(&account_id).cloned())
    }

    async fn list_ledger_entries(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        self.enter(None).await?;
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .filter(|entry| entry.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        self.enter(Some(FailPoint::Begin)).await?;
        let committed = Arc::clone(&self.state).lock_owned().await;
        let working = committed.clone();
        Ok(MemoryUnitOfWork {
            committed,
            working,
            controls: Arc::clone(&self.controls),
        })
    }
}

/// Unit of work over [`InMemoryStore`].
///
/// Holds the store lock for its whole lifetime, so units of work never
/// interleave. Dropping it without `commit` discards every change.
#[derive(Debug)]
pub struct MemoryUnitOfWork {
    committed: OwnedMutexGuard<LedgerState>,
    working: LedgerState,
    controls: Arc<Mutex<Controls>>,
}

impl MemoryUnitOfWork {
    async fn enter(&self, point: FailPoint) -> Result<(), StoreError> {
        enter(&self.controls, Some(point)).await
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn get_accounts(
        &mut self,
        account_ids: &[AccountId],
    ) -> Result<Vec<Account>, StoreError> {
        self.enter(FailPoint::GetAccounts).await?;
        let wanted: HashSet<AccountId> = account_ids.iter().copied().collect();
        Ok(self
            .working
            .accounts
            .values()
            .filter(|account| wanted.contains(&account.account_id))
            .cloned()
            .collect())
    }

    async fn create_account(&mut self, record: NewAccountRecord) -> Result<Account, StoreError> {
        self.enter(FailPoint::CreateAccount).await?;
        if record.account_id < 1 {
            return Err(StoreError::Backend(format!(
                "check constraint chk_account_id_positive violated: account_id={}",
                record.account_id
            )));
        }
        check_numeric(record.balance, "balance")?;
        if self.working.accounts.contains_key(&record.account_id) {
            return Err(StoreError::DuplicateKey(format!(
                "accounts_pkey: account_id={}",
                record.account_id
            )));
        }

        let account = Account {
            account_id: record.account_id,
            balance: record.balance,
            created_date: record.created_date,
            last_modified_date: record.last_modified_date,
        };
        self.working
            .accounts
            .insert(record.account_id, account.clone());
        Ok(account)
    }

    async fn debit_account(
        &mut self,
        account_id: AccountId,
        amount: Decimal,
        modified_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.enter(FailPoint::DebitAccount).await?;
        match self.working.accounts.get_mut(&account_id) {
            Some(account) if account.balance >= amount => {
                account.balance -= amount;
                account.last_modified_date = modified_at;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn credit_account(
        &mut self,
        account_id: AccountId,
        amount: Decimal,
        modified_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.enter(FailPoint::CreditAccount).await?;
        let Some(account) = self.working.accounts.get_mut(&account_id) else {
            return Ok(0);
        };

        let balance = account.balance.checked_add(amount).ok_or_else(|| {
            StoreError::Backend(format!("numeric overflow crediting account {account_id}"))
        })?;
        account.balance = check_numeric(balance, "balance")?;
        account.last_modified_date = modified_at;
        Ok(1)
    }

    async fn append_ledger_entry(
        &mut self,
        entry: NewLedgerEntry,
    ) -> Result<LedgerEntry, StoreError> {
        self.enter(FailPoint::AppendLedgerEntry).await?;
        check_numeric(entry.amount, "amount")?;
        self.working.last_entry_id += 1;
        let entry = LedgerEntry {
            entry_id: self.working.last_entry_id,
            account_id: entry.account_id,
            amount: entry.amount,
            created_date: entry.created_date,
        };
        self.working.entries.push(entry.clone());
        Ok(entry)
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.enter(FailPoint::Commit).await?;
        let Self {
            mut committed,
            working,
            ..
        } = self;
        *committed = working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.enter(FailPoint::Rollback).await
    }
}
