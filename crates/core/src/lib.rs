//! Core business logic for the transfer service.
//!
//! This crate contains the ledger transfer engine with ZERO web or database
//! dependencies. Persistence is reached only through the
//! [`ledger::TransactionalStore`] contract.
//!
//! # Modules
//!
//! - `ledger` - Accounts, transfers and double-entry bookkeeping

pub mod ledger;
