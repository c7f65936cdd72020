//! Domain types for accounts, ledger entries and transfers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account identifier. Positive and unique.
pub type AccountId = i64;

/// An account and its authoritative balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The account ID.
    pub account_id: AccountId,
    /// Current balance, never negative.
    pub balance: Decimal,
    /// When the account was created.
    pub created_date: DateTime<Utc>,
    /// When the balance last changed.
    pub last_modified_date: DateTime<Utc>,
}

/// An append-only record of a signed balance movement.
///
/// Positive amounts are credits, negative amounts are debits. The entries of
/// an account always sum to its balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Store-assigned, increasing entry ID.
    pub entry_id: i64,
    /// The account this entry belongs to.
    pub account_id: AccountId,
    /// Signed amount.
    pub amount: Decimal,
    /// When the entry was recorded.
    pub created_date: DateTime<Utc>,
}

/// Input for opening an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAccount {
    /// Requested account ID.
    pub account_id: AccountId,
    /// Opening balance, rounded by the ledger before storage.
    pub initial_balance: Decimal,
}

/// Input for a point-to-point transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Account to debit.
    pub source_account_id: AccountId,
    /// Account to credit.
    pub destination_account_id: AccountId,
    /// Amount to move.
    pub amount: Decimal,
}

/// Account row handed to the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAccountRecord {
    /// Account ID.
    pub account_id: AccountId,
    /// Rounded opening balance.
    pub balance: Decimal,
    /// Creation timestamp.
    pub created_date: DateTime<Utc>,
    /// Last modification timestamp.
    pub last_modified_date: DateTime<Utc>,
}

/// Ledger entry handed to the store on append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewLedgerEntry {
    /// Owning account.
    pub account_id: AccountId,
    /// Signed amount.
    pub amount: Decimal,
    /// Entry timestamp.
    pub created_date: DateTime<Utc>,
}
