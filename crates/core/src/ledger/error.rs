//! Ledger error types.
//!
//! Every failed ledger call yields exactly one of these. Validation errors
//! are raised before any I/O; the remaining kinds are classified from store
//! outcomes at the boundary between the ledger and the store.

use thiserror::Error;

use super::store::StoreError;
use super::types::AccountId;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Opening balance is negative.
    #[error("Initial balance cannot be negative")]
    NegativeBalance,

    /// Transfer amount is negative.
    #[error("Transfer amount cannot be negative")]
    NegativeAmount,

    /// Source and destination are the same account.
    #[error("Source and destination account cannot be the same")]
    SameAccount,

    // ========== Existence Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// One or both transfer parties do not exist.
    #[error("Account not found for transfer from {source_id} to {destination_id}")]
    AccountNotFound {
        /// Requested source account.
        source_id: AccountId,
        /// Requested destination account.
        destination_id: AccountId,
    },

    // ========== Conflict Errors ==========
    /// Account ID is already taken.
    #[error("Account already exists: {0}")]
    AlreadyExists(AccountId),

    // ========== Business Outcomes ==========
    /// Source balance is lower than the transfer amount.
    #[error("Insufficient funds in account {0}")]
    InsufficientFunds(AccountId),

    // ========== Store Errors ==========
    /// The operation did not finish before its deadline.
    #[error("Operation timed out: {operation}")]
    Timeout {
        /// The ledger operation that expired.
        operation: &'static str,
    },

    /// Unexpected store failure.
    #[error("Internal error: {context}: {source}")]
    Internal {
        /// Failing step and the identifiers involved.
        context: String,
        /// The underlying store error.
        #[source]
        source: StoreError,
    },
}

impl LedgerError {
    /// Wraps a store failure with the step that produced it.
    pub(crate) fn internal(context: impl Into<String>, source: StoreError) -> Self {
        Self::Internal {
            context: context.into(),
            source,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeBalance => "NEGATIVE_BALANCE",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::SameAccount => "SAME_ACCOUNT",
            Self::NotFound(_) | Self::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            Self::AlreadyExists(_) => "ACCOUNT_ALREADY_EXISTS",
            Self::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::NegativeBalance | Self::NegativeAmount | Self::SameAccount => 400,

            // 404 Not Found
            Self::NotFound(_) | Self::AccountNotFound { .. } => 404,

            // 409 Conflict - clashes with current state
            Self::AlreadyExists(_) | Self::InsufficientFunds(_) => 409,

            // 504 Gateway Timeout
            Self::Timeout { .. } => 504,

            // 500 Internal Server Error
            Self::Internal { .. } => 500,
        }
    }

    /// Returns true if repeating the call unchanged may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::NegativeBalance.error_code(), "NEGATIVE_BALANCE");
        assert_eq!(LedgerError::NegativeAmount.error_code(), "NEGATIVE_AMOUNT");
        assert_eq!(LedgerError::SameAccount.error_code(), "SAME_ACCOUNT");
        assert_eq!(LedgerError::NotFound(1).error_code(), "ACCOUNT_NOT_FOUND");
        assert_eq!(
            LedgerError::AccountNotFound {
                source_id: 1,
                destination_id: 2,
            }
            .error_code(),
            "ACCOUNT_NOT_FOUND"
        );
        assert_eq!(
            LedgerError::AlreadyExists(1).error_code(),
            "ACCOUNT_ALREADY_EXISTS"
        );
        assert_eq!(
            LedgerError::InsufficientFunds(1).error_code(),
            "INSUFFICIENT_FUNDS"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::NegativeBalance.http_status_code(), 400);
        assert_eq!(LedgerError::SameAccount.http_status_code(), 400);
        assert_eq!(LedgerError::NotFound(7).http_status_code(), 404);
        assert_eq!(LedgerError::AlreadyExists(7).http_status_code(), 409);
        assert_eq!(LedgerError::InsufficientFunds(7).http_status_code(), 409);
        assert_eq!(
            LedgerError::Timeout {
                operation: "create transfer"
            }
            .http_status_code(),
            504
        );
        assert_eq!(
            LedgerError::internal("commit", StoreError::Backend("gone".into()))
                .http_status_code(),
            500
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(
            LedgerError::Timeout {
                operation: "create account"
            }
            .is_retryable()
        );
        assert!(!LedgerError::InsufficientFunds(1).is_retryable());
        assert!(!LedgerError::AlreadyExists(1).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::AccountNotFound {
            source_id: 3,
            destination_id: 9,
        };
        assert_eq!(
            err.to_string(),
            "Account not found for transfer from 3 to 9"
        );

        let err = LedgerError::internal(
            "create transfer 3 -> 9: credit account",
            StoreError::Backend("connection reset".into()),
        );
        assert_eq!(
            err.to_string(),
            "Internal error: create transfer 3 -> 9: credit account: connection reset"
        );
    }
}
