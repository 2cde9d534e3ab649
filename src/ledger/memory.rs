//! In-memory ledger store
//!
//! Used when no PostgreSQL URL is configured and by the test suite. A unit of
//! work holds the store's single async lock from `begin` until it ends, so
//! units are serializable. Writes are staged in the scope and only applied on
//! `commit`; dropping the scope discards them.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::LedgerError;
use super::store::{AppendOutcome, LedgerStore, LedgerTx};
use super::types::{BalanceRecord, TransactionKind, TransactionRecord};
use crate::core_types::{Credits, UserId};

#[derive(Debug, Default)]
struct MemoryState {
    balances: HashMap<UserId, BalanceRecord>,
    /// Append order == commit order
    transactions: Vec<TransactionRecord>,
    /// Unique index over recharge external ids
    recharge_ids: HashSet<String>,
}

#[derive(Default)]
struct Faults {
    fail_log_writes: AtomicBool,
}

pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
    /// Committed row writes (balance inserts/updates + log appends)
    writes: Arc<AtomicUsize>,
    faults: Arc<Faults>,
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            writes: Arc::new(AtomicUsize::new(0)),
            faults: Arc::new(Faults::default()),
        }
    }

    /// Number of committed row writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent transaction-log append fail
    pub fn set_fail_log_writes(&self, fail: bool) {
        self.faults.fail_log_writes.store(fail, Ordering::SeqCst);
    }

    /// Force a balance value, bypassing the engine. Test fixture only.
    pub async fn seed_balance(&self, user_id: UserId, balance: Credits) {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let record = state
            .balances
            .entry(user_id)
            .or_insert_with(|| BalanceRecord::zero(user_id, now));
        record.balance = balance;
        record.last_update_time = now;
        record.updated_at = now;
    }

    /// Full history of one user in append order
    pub async fn history(&self, user_id: UserId) -> Vec<TransactionRecord> {
        let state = self.state.lock().await;
        state
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryTx {
            guard,
            staged_balances: HashMap::new(),
            staged_log: Vec::new(),
            writes: self.writes.clone(),
            faults: self.faults.clone(),
        }))
    }

    async fn find_balance(&self, user_id: UserId) -> Result<Option<BalanceRecord>, LedgerError> {
        Ok(self.state.lock().await.balances.get(&user_id).cloned())
    }

    async fn insert_balance_if_absent(
        &self,
        record: &BalanceRecord,
    ) -> Result<bool, LedgerError> {
        let mut state = self.state.lock().await;
        if state.balances.contains_key(&record.user_id) {
            return Ok(false);
        }
        state.balances.insert(record.user_id, record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn find_recharge(
        &self,
        external_tx_id: &str,
    ) -> Result<Option<TransactionRecord>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .iter()
            .find(|t| {
                t.kind == TransactionKind::Recharge
                    && t.external_tx_id.as_deref() == Some(external_tx_id)
            })
            .cloned())
    }

    async fn list_transactions(
        &self,
        user_id: UserId,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<TransactionRecord>, i64), LedgerError> {
        let state = self.state.lock().await;
        let mine: Vec<&TransactionRecord> = state
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .collect();
        let total = mine.len() as i64;
        let list = mine
            .into_iter()
            .rev()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((list, total))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged_balances: HashMap<UserId, BalanceRecord>,
    staged_log: Vec<TransactionRecord>,
    writes: Arc<AtomicUsize>,
    faults: Arc<Faults>,
}

impl MemoryTx {
    fn current(&self, user_id: UserId) -> Option<BalanceRecord> {
        self.staged_balances
            .get(&user_id)
            .or_else(|| self.guard.balances.get(&user_id))
            .cloned()
    }

    fn recharge_id_taken(&self, external_tx_id: &str) -> bool {
        self.guard.recharge_ids.contains(external_tx_id)
            || self.staged_log.iter().any(|t| {
                t.kind == TransactionKind::Recharge
                    && t.external_tx_id.as_deref() == Some(external_tx_id)
            })
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn lock_balance(
        &mut self,
        user_id: UserId,
    ) -> Result<Option<BalanceRecord>, LedgerError> {
        Ok(self.current(user_id))
    }

    async fn ensure_balance(
        &mut self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<BalanceRecord, LedgerError> {
        if let Some(existing) = self.current(user_id) {
            return Ok(existing);
        }
        let record = BalanceRecord::zero(user_id, now);
        self.staged_balances.insert(user_id, record.clone());
        Ok(record)
    }

    async fn update_balance(
        &mut self,
        user_id: UserId,
        new_balance: Credits,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut record = self.current(user_id).ok_or_else(|| {
            LedgerError::InvariantViolation(format!(
                "balance update for user {} without a row",
                user_id
            ))
        })?;
        record.balance = new_balance;
        record.last_update_time = now;
        record.updated_at = now;
        self.staged_balances.insert(user_id, record);
        Ok(())
    }

    async fn append_transaction(
        &mut self,
        record: &TransactionRecord,
    ) -> Result<AppendOutcome, LedgerError> {
        if self.faults.fail_log_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::TransactionLogWriteFailed(
                "injected log write failure".to_string(),
            ));
        }
        if record.kind == TransactionKind::Recharge {
            if let Some(ext) = record.external_tx_id.as_deref() {
                if self.recharge_id_taken(ext) {
                    return Ok(AppendOutcome::DuplicateExternalId);
                }
            }
        }
        self.staged_log.push(record.clone());
        Ok(AppendOutcome::Appended)
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        let MemoryTx {
            mut guard,
            staged_balances,
            staged_log,
            writes,
            ..
        } = *self;

        let count = staged_balances.len() + staged_log.len();
        guard.balances.extend(staged_balances);
        for record in staged_log {
            if record.kind == TransactionKind::Recharge {
                if let Some(ext) = &record.external_tx_id {
                    guard.recharge_ids.insert(ext.clone());
                }
            }
            guard.transactions.push(record);
        }
        writes.fetch_add(count, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let store = MemoryLedgerStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.ensure_balance(1, Utc::now()).await.unwrap();
            tx.update_balance(1, 50, Utc::now()).await.unwrap();
            // dropped without commit
        }
        assert!(store.find_balance(1).await.unwrap().is_none());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_commit_applies_staged_writes() {
        let store = MemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.ensure_balance(1, Utc::now()).await.unwrap();
        tx.update_balance(1, 50, Utc::now()).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.find_balance(1).await.unwrap().unwrap().balance, 50);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_recharge_id_within_and_across_scopes() {
        let store = MemoryLedgerStore::new();
        let now = Utc::now();
        let rec = TransactionRecord::recharge(1, 10, 10, "ext".into(), "purchase".into(), now);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(
            tx.append_transaction(&rec).await.unwrap(),
            AppendOutcome::Appended
        );
        let again = TransactionRecord::recharge(2, 10, 10, "ext".into(), "purchase".into(), now);
        assert_eq!(
            tx.append_transaction(&again).await.unwrap(),
            AppendOutcome::DuplicateExternalId
        );
        tx.commit().await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            assert_eq!(
                tx.append_transaction(&again).await.unwrap(),
                AppendOutcome::DuplicateExternalId
            );
        }

        let found = store.find_recharge("ext").await.unwrap().unwrap();
        assert_eq!(found.user_id, 1);
        assert_eq!(store.history(2).await.len(), 0);
    }

    #[tokio::test]
    async fn test_insert_balance_if_absent_only_once() {
        let store = MemoryLedgerStore::new();
        let rec = BalanceRecord::zero(9, Utc::now());
        assert!(store.insert_balance_if_absent(&rec).await.unwrap());
        assert!(!store.insert_balance_if_absent(&rec).await.unwrap());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_list_transactions_newest_first() {
        let store = MemoryLedgerStore::new();
        let now = Utc::now();
        let mut tx = store.begin().await.unwrap();
        for i in 1..=3 {
            let rec = TransactionRecord::deduct(1, i, 0, format!("r{}", i), None, now);
            tx.append_transaction(&rec).await.unwrap();
        }
        tx.commit().await.unwrap();

        let (page, total) = store.list_transactions(1, 0, 2).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].reason, "r3");
        assert_eq!(page[1].reason, "r2");

        let (page, _) = store.list_transactions(1, 2, 2).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].reason, "r1");
    }
}
