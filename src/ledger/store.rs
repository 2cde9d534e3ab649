//! Ledger Store Contract
//!
//! The engine reaches persistence only through these traits. A store hands
//! out transactional scopes ([`LedgerTx`]); everything done through one scope
//! becomes visible atomically on `commit` and disappears on `rollback` or when
//! the scope is dropped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::LedgerError;
use super::types::{BalanceRecord, TransactionRecord};
use crate::core_types::{Credits, UserId};

/// Result of appending to the transaction log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// A recharge row with the same external id already exists
    DuplicateExternalId,
}

/// Persistence backend for balances and the transaction log
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Open a transactional scope
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError>;

    /// Plain read, no lock
    async fn find_balance(&self, user_id: UserId) -> Result<Option<BalanceRecord>, LedgerError>;

    /// Insert a zero balance unless one exists.
    ///
    /// Returns `true` if this call created the row. Safe under races: at most
    /// one concurrent caller observes `true`.
    async fn insert_balance_if_absent(&self, record: &BalanceRecord)
    -> Result<bool, LedgerError>;

    /// Look up a recharge by its external idempotence key
    async fn find_recharge(
        &self,
        external_tx_id: &str,
    ) -> Result<Option<TransactionRecord>, LedgerError>;

    /// Newest-first page of a user's history plus the total row count
    async fn list_transactions(
        &self,
        user_id: UserId,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<TransactionRecord>, i64), LedgerError>;
}

/// One open unit of work
#[async_trait]
pub trait LedgerTx: Send {
    /// Read the balance row and hold it exclusively until the scope ends
    async fn lock_balance(&mut self, user_id: UserId)
    -> Result<Option<BalanceRecord>, LedgerError>;

    /// Create the zero balance row if missing, then lock and return it
    async fn ensure_balance(
        &mut self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<BalanceRecord, LedgerError>;

    /// Overwrite the balance and bump its timestamps
    async fn update_balance(
        &mut self,
        user_id: UserId,
        new_balance: Credits,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError>;

    /// Append one immutable log entry
    async fn append_transaction(
        &mut self,
        record: &TransactionRecord,
    ) -> Result<AppendOutcome, LedgerError>;

    async fn commit(self: Box<Self>) -> Result<(), LedgerError>;

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError>;
}
