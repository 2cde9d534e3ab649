//! Ledger Error Types
//!
//! Validation, business-rule, transient and invariant failures of the
//! credits ledger. Business-rule variants carry the data the caller needs to
//! present a precise message.

use thiserror::Error;

use crate::core_types::{Credits, UserId};

/// Ledger error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // === Validation Errors ===
    #[error("Amount must be a positive integer")]
    InvalidAmount,

    #[error("Reason must not be empty")]
    EmptyReason,

    #[error("External transaction id must not be empty")]
    EmptyTransactionId,

    #[error("External transaction id must be at most {0} characters")]
    TransactionIdTooLong(usize),

    #[error("Source must be at most {0} characters")]
    SourceTooLong(usize),

    #[error("Balance would overflow")]
    Overflow,

    #[error("page must be >= 1 and limit between 1 and 100")]
    InvalidPagination,

    // === Business Rule Errors ===
    #[error("No credits account for user {0}")]
    AccountNotFound(UserId),

    #[error(
        "Insufficient credits: current balance {current_balance}, required {required_amount}"
    )]
    InsufficientFunds {
        current_balance: Credits,
        required_amount: Credits,
    },

    #[error("Transaction id already used: {0}")]
    DuplicateTransaction(String),

    #[error("Payment verification failed: {0}")]
    PaymentVerificationFailed(String),

    // === Store Errors ===
    #[error("Transaction log write failed: {0}")]
    TransactionLogWriteFailed(String),

    #[error("Ledger operation timed out after {0} ms")]
    Timeout(u64),

    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    // === Invariant Violations ===
    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),
}

impl LedgerError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount => "INVALID_AMOUNT",
            LedgerError::EmptyReason => "EMPTY_REASON",
            LedgerError::EmptyTransactionId => "EMPTY_TRANSACTION_ID",
            LedgerError::TransactionIdTooLong(_) => "TRANSACTION_ID_TOO_LONG",
            LedgerError::SourceTooLong(_) => "SOURCE_TOO_LONG",
            LedgerError::Overflow => "OVERFLOW",
            LedgerError::InvalidPagination => "INVALID_PAGINATION",
            LedgerError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::DuplicateTransaction(_) => "DUPLICATE_TRANSACTION",
            LedgerError::PaymentVerificationFailed(_) => "PAYMENT_VERIFICATION_FAILED",
            LedgerError::TransactionLogWriteFailed(_) => "TRANSACTION_LOG_WRITE_FAILED",
            LedgerError::Timeout(_) => "TIMEOUT",
            LedgerError::Conflict(_) => "CONFLICT",
            LedgerError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            LedgerError::DatabaseError(_) => "DATABASE_ERROR",
            LedgerError::InvariantViolation(_) => "INVARIANT_VIOLATION",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::InvalidAmount
            | LedgerError::EmptyReason
            | LedgerError::EmptyTransactionId
            | LedgerError::TransactionIdTooLong(_)
            | LedgerError::SourceTooLong(_)
            | LedgerError::Overflow
            | LedgerError::InvalidPagination
            | LedgerError::InsufficientFunds { .. }
            | LedgerError::DuplicateTransaction(_)
            | LedgerError::PaymentVerificationFailed(_) => 400,
            LedgerError::AccountNotFound(_) => 404,
            LedgerError::Timeout(_)
            | LedgerError::Conflict(_)
            | LedgerError::StoreUnavailable(_) => 503,
            LedgerError::TransactionLogWriteFailed(_)
            | LedgerError::DatabaseError(_)
            | LedgerError::InvariantViolation(_) => 500,
        }
    }

    /// Rejected before any store access
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount
                | LedgerError::EmptyReason
                | LedgerError::EmptyTransactionId
                | LedgerError::TransactionIdTooLong(_)
                | LedgerError::SourceTooLong(_)
                | LedgerError::Overflow
                | LedgerError::InvalidPagination
        )
    }

    /// Recoverable business-rule outcome, reported to the caller with data
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            LedgerError::AccountNotFound(_)
                | LedgerError::InsufficientFunds { .. }
                | LedgerError::DuplicateTransaction(_)
                | LedgerError::PaymentVerificationFailed(_)
        )
    }

    /// Infrastructure failure the caller may retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LedgerError::Timeout(_) | LedgerError::Conflict(_) | LedgerError::StoreUnavailable(_)
        )
    }
}

/// SQLSTATE codes PostgreSQL uses when a transaction lost a concurrency race
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                    LedgerError::Conflict(db_err.message().to_string())
                }
                _ => LedgerError::DatabaseError(e.to_string()),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                LedgerError::StoreUnavailable(e.to_string())
            }
            _ => LedgerError::DatabaseError(e.to_string()),
        }
    }
}
