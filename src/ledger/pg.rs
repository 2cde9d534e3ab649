//! PostgreSQL-backed ledger store
//!
//! One ledger unit = one PostgreSQL transaction. The balance row is taken with
//! `FOR UPDATE`, so per-user units serialize at the database and the service
//! itself stays stateless.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::error::LedgerError;
use super::store::{AppendOutcome, LedgerStore, LedgerTx};
use super::types::{BalanceRecord, TransactionRecord};
use super::{balances, transactions};
use crate::core_types::{Credits, UserId};

pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTx { tx }))
    }

    async fn find_balance(&self, user_id: UserId) -> Result<Option<BalanceRecord>, LedgerError> {
        Ok(balances::find(&self.pool, user_id).await?)
    }

    async fn insert_balance_if_absent(
        &self,
        record: &BalanceRecord,
    ) -> Result<bool, LedgerError> {
        Ok(balances::insert_if_absent(&self.pool, record).await?)
    }

    async fn find_recharge(
        &self,
        external_tx_id: &str,
    ) -> Result<Option<TransactionRecord>, LedgerError> {
        transactions::find_recharge(&self.pool, external_tx_id).await
    }

    async fn list_transactions(
        &self,
        user_id: UserId,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<TransactionRecord>, i64), LedgerError> {
        let total = transactions::count_by_user(&self.pool, user_id).await?;
        let list = transactions::list_by_user(&self.pool, user_id, offset, limit).await?;
        Ok((list, total))
    }
}

/// Open PostgreSQL transaction. Dropping it without `commit` rolls back.
struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_balance(
        &mut self,
        user_id: UserId,
    ) -> Result<Option<BalanceRecord>, LedgerError> {
        Ok(balances::find_for_update(&mut self.tx, user_id).await?)
    }

    async fn ensure_balance(
        &mut self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<BalanceRecord, LedgerError> {
        let created =
            balances::insert_if_absent(&mut *self.tx, &BalanceRecord::zero(user_id, now)).await?;
        if created {
            tracing::info!(user_id, "credits account initialized");
        }
        balances::find_for_update(&mut self.tx, user_id)
            .await?
            .ok_or_else(|| {
                LedgerError::InvariantViolation(format!(
                    "balance row for user {} vanished after insert",
                    user_id
                ))
            })
    }

    async fn update_balance(
        &mut self,
        user_id: UserId,
        new_balance: Credits,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let affected = balances::set_balance(&mut self.tx, user_id, new_balance, now).await?;
        if affected != 1 {
            return Err(LedgerError::InvariantViolation(format!(
                "balance update for user {} touched {} rows",
                user_id, affected
            )));
        }
        Ok(())
    }

    async fn append_transaction(
        &mut self,
        record: &TransactionRecord,
    ) -> Result<AppendOutcome, LedgerError> {
        transactions::insert(&mut self.tx, record)
            .await
            .map_err(|e| match LedgerError::from(e) {
                LedgerError::DatabaseError(msg) => LedgerError::TransactionLogWriteFailed(msg),
                other => other,
            })
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
