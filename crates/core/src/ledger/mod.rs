//! Double-entry transfer ledger.
//!
//! This module implements the core ledger functionality:
//! - Domain types for accounts, ledger entries and transfers
//! - Error types for ledger operations
//! - The transactional store contract consumed by the ledger
//! - `AccountLedger`, the business-rule layer
//! - An in-memory store for tests and local runs

pub mod error;
pub mod memory;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::LedgerError;
pub use memory::{FailPoint, InMemoryStore, MemoryUnitOfWork};
pub use service::AccountLedger;
pub use store::{StoreError, TransactionalStore, UnitOfWork};
pub use types::{
    Account, AccountId, LedgerEntry, NewAccount, NewAccountRecord, NewLedgerEntry, Transfer,
};
