//! Balance Query Service
//!
//! Read path over the ledger. The only write it may perform is the lazy
//! zero-balance initialization on first access.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::engine::{DEFAULT_OP_TIMEOUT_MS, bounded};
use super::error::LedgerError;
use super::store::LedgerStore;
use super::types::{BalanceRecord, BalanceResponse, TransactionPage, TransactionView};
use crate::core_types::UserId;

pub const DEFAULT_HISTORY_LIMIT: i64 = 20;
pub const MAX_HISTORY_LIMIT: i64 = 100;

pub struct BalanceQueryService {
    store: Arc<dyn LedgerStore>,
    op_timeout: Duration,
}

impl BalanceQueryService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            op_timeout: Duration::from_millis(DEFAULT_OP_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    /// Current balance, creating a zero balance on first access.
    ///
    /// Concurrent first calls race on the insert; the loser simply re-reads
    /// the winner's row, so exactly one record is created.
    pub async fn get_balance(&self, user_id: UserId) -> Result<BalanceResponse, LedgerError> {
        let record = bounded(self.op_timeout, self.load_or_init(user_id)).await?;
        if record.balance < 0 {
            return Err(LedgerError::InvariantViolation(format!(
                "negative balance {} for user {}",
                record.balance, user_id
            )));
        }
        Ok(BalanceResponse::from(&record))
    }

    async fn load_or_init(&self, user_id: UserId) -> Result<BalanceRecord, LedgerError> {
        if let Some(record) = self.store.find_balance(user_id).await? {
            return Ok(record);
        }

        if self
            .store
            .insert_balance_if_absent(&BalanceRecord::zero(user_id, Utc::now()))
            .await?
        {
            tracing::info!(user_id, store = self.store.name(), "credits account initialized");
        }

        self.store.find_balance(user_id).await?.ok_or_else(|| {
            LedgerError::InvariantViolation(format!(
                "balance row for user {} missing after initialization",
                user_id
            ))
        })
    }

    /// Newest-first page of the user's ledger history
    pub async fn list_transactions(
        &self,
        user_id: UserId,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<TransactionPage, LedgerError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if page < 1 || !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
            return Err(LedgerError::InvalidPagination);
        }

        let offset = (page - 1).saturating_mul(limit);
        let (records, total) = bounded(
            self.op_timeout,
            self.store.list_transactions(user_id, offset, limit),
        )
        .await?;

        Ok(TransactionPage {
            list: records.into_iter().map(TransactionView::from).collect(),
            total,
            page,
            limit,
        })
    }
}
