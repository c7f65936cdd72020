//! Shared types, errors, and configuration for the transfer service.
//!
//! This crate provides common types used across all other crates:
//! - Amount rounding and parsing at the ledger's fixed scale
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, LedgerConfig, LogConfig, ServerConfig};
pub use error::{AppError, AppResult};
pub use types::amount::{AMOUNT_LIMIT, AmountError, BALANCE_SCALE, parse_amount, round_amount};
