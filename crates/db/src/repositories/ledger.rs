//! Postgres implementation of the ledger's transactional store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    NotSet, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use transfer_core::ledger::{
    Account, AccountId, LedgerEntry, NewAccountRecord, NewLedgerEntry, StoreError,
    TransactionalStore, UnitOfWork,
};

use crate::entities::{accounts, ledger_entries};

/// Classifies a database error for the ledger.
fn store_error(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::DuplicateKey(detail),
        _ => StoreError::Backend(err.to_string()),
    }
}

/// Ledger store backed by a `SeaORM` connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    /// Creates a new store over the given pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl TransactionalStore for PgStore {
    type Tx = PgUnitOfWork;

    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        let account = accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await
            .map_err(store_error)?;
        Ok(account.map(Account::from))
    }

    async fn list_ledger_entries(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let entries = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::AccountId.eq(account_id))
            .order_by_asc(ledger_entries::Column::EntryId)
            .all(&self.db)
            .await
            .map_err(store_error)?;
        Ok(entries.into_iter().map(LedgerEntry::from).collect())
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let txn = self.db.begin().await.map_err(store_error)?;
        Ok(PgUnitOfWork { txn })
    }
}

/// A Postgres transaction bound to one pooled connection.
///
/// Dropping it without `commit` rolls the transaction back.
#[derive(Debug)]
pub struct PgUnitOfWork {
    txn: DatabaseTransaction,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn get_accounts(
        &mut self,
        account_ids: &[AccountId],
    ) -> Result<Vec<Account>, StoreError> {
        let accounts = accounts::Entity::find()
            .filter(accounts::Column::AccountId.is_in(account_ids.iter().copied()))
            .all(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(accounts.into_iter().map(Account::from).collect())
    }

    async fn create_account(&mut self, record: NewAccountRecord) -> Result<Account, StoreError> {
        let account = accounts::ActiveModel {
            account_id: Set(record.account_id),
            balance: Set(record.balance),
            created_date: Set(record.created_date.into()),
            last_modified_date: Set(record.last_modified_date.into()),
        }
        .insert(&self.txn)
        .await
        .map_err(store_error)?;
        Ok(account.into())
    }

    async fn debit_account(
        &mut self,
        account_id: AccountId,
        amount: Decimal,
        modified_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        // Single conditional UPDATE; the row lock serialises concurrent debits.
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).sub(amount),
            )
            .col_expr(accounts::Column::LastModifiedDate, Expr::value(modified_at))
            .filter(accounts::Column::AccountId.eq(account_id))
            .filter(accounts::Column::Balance.gte(amount))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected)
    }

    async fn credit_account(
        &mut self,
        account_id: AccountId,
        amount: Decimal,
        modified_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(amount),
            )
            .col_expr(accounts::Column::LastModifiedDate, Expr::value(modified_at))
            .filter(accounts::Column::AccountId.eq(account_id))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected)
    }

    async fn append_ledger_entry(
        &mut self,
        entry: NewLedgerEntry,
    ) -> Result<LedgerEntry, StoreError> {
        let entry = ledger_entries::ActiveModel {
            entry_id: NotSet,
            account_id: Set(entry.account_id),
            amount: Set(entry.amount),
            created_date: Set(entry.created_date.into()),
        }
        .insert(&self.txn)
        .await
        .map_err(store_error)?;
        Ok(entry.into())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(store_error)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.txn.rollback().await.map_err(store_error)
    }
}
