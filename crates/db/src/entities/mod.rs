//! `SeaORM` entities.

pub mod accounts;
pub mod ledger_entries;
