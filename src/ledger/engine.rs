//! Ledger Engine
//!
//! Owns the write path to balances and the transaction log. Every mutation
//! runs as one unit of work on the configured [`LedgerStore`]: balance change
//! and log append commit together or not at all. Mutual exclusion comes from
//! the store (row lock / serialized scope), never from an in-process mutex.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use super::error::LedgerError;
use super::state::{MutationState, MutationTracker};
use super::store::{AppendOutcome, LedgerStore, LedgerTx};
use super::types::{
    DeductResponse, MAX_EXTERNAL_TX_ID_LEN, MAX_SOURCE_LEN, RechargeResponse, TransactionRecord,
    normalize_source,
};
use super::verifier::{PaymentVerifier, TrustedVerifier};
use crate::core_types::{Credits, MemoId, UserId};

/// Default per-operation budget
pub const DEFAULT_OP_TIMEOUT_MS: u64 = 5000;

/// Run `fut` within `budget`, mapping expiry to [`LedgerError::Timeout`].
///
/// Dropping the inner future on expiry drops any open scope with it, which
/// rolls the scope back.
pub(crate) async fn bounded<T, Fut>(budget: Duration, fut: Fut) -> Result<T, LedgerError>
where
    Fut: Future<Output = Result<T, LedgerError>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Err(LedgerError::Timeout(budget.as_millis() as u64)),
    }
}

pub struct LedgerEngine {
    store: Arc<dyn LedgerStore>,
    verifier: Arc<dyn PaymentVerifier>,
    op_timeout: Duration,
}

impl LedgerEngine {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            verifier: Arc::new(TrustedVerifier),
            op_timeout: Duration::from_millis(DEFAULT_OP_TIMEOUT_MS),
        }
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn PaymentVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Execute `unit` as one atomic scope.
    ///
    /// Commits when `unit` returns `Ok`, rolls back when it returns `Err`.
    /// The whole scope, including `begin` and `commit`, is bounded by the
    /// engine timeout; on expiry nothing is written.
    pub async fn with_transaction<T, F>(&self, unit: F) -> Result<T, LedgerError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut dyn LedgerTx) -> BoxFuture<'t, Result<T, LedgerError>> + Send,
    {
        bounded(self.op_timeout, async {
            let mut tx = self.store.begin().await?;
            match unit(&mut *tx).await {
                Ok(value) => {
                    tx.commit().await?;
                    Ok(value)
                }
                Err(e) => {
                    if let Err(rb) = tx.rollback().await {
                        warn!(error = %rb, "rollback failed, scope dropped");
                    }
                    Err(e)
                }
            }
        })
        .await
    }

    /// Deduct `amount` credits from an existing account.
    ///
    /// The account must exist; deduct never creates one.
    pub async fn deduct(
        &self,
        user_id: UserId,
        amount: Credits,
        reason: &str,
        memo_id: Option<MemoId>,
    ) -> Result<DeductResponse, LedgerError> {
        let mut tracker = MutationTracker::start("deduct", user_id);

        let reason = reason.trim();
        if let Err(e) = validate_amount(amount).and_then(|_| {
            if reason.is_empty() {
                Err(LedgerError::EmptyReason)
            } else {
                Ok(())
            }
        }) {
            tracker.advance(MutationState::RejectedPrecheck, e.code());
            return Err(e);
        }
        tracker.advance(MutationState::Validated, "");

        let reason = reason.to_string();
        let result = self
            .with_transaction(move |tx| {
                Box::pin(async move {
                    let current = tx
                        .lock_balance(user_id)
                        .await?
                        .ok_or(LedgerError::AccountNotFound(user_id))?;

                    if current.balance < 0 {
                        return Err(LedgerError::InvariantViolation(format!(
                            "negative balance {} for user {}",
                            current.balance, user_id
                        )));
                    }
                    if current.balance < amount {
                        return Err(LedgerError::InsufficientFunds {
                            current_balance: current.balance,
                            required_amount: amount,
                        });
                    }

                    let now = Utc::now();
                    let remaining = current.balance - amount;
                    tx.update_balance(user_id, remaining, now).await?;

                    let record =
                        TransactionRecord::deduct(user_id, amount, remaining, reason, memo_id, now);
                    tx.append_transaction(&record).await?;

                    Ok(DeductResponse {
                        remaining_balance: remaining,
                        deducted_amount: amount,
                        transaction_id: record.transaction_id.to_string(),
                    })
                })
            })
            .await;

        finish(&mut tracker, &result, |r| &r.transaction_id);
        if let Ok(r) = &result {
            info!(
                user_id,
                amount,
                remaining = r.remaining_balance,
                transaction_id = %r.transaction_id,
                "credits deducted"
            );
        }
        result
    }

    /// Credit `amount` to the user, keyed by an external payment id.
    ///
    /// Creates the account on first recharge. A second recharge with the same
    /// external id fails with `DuplicateTransaction` and changes nothing, also
    /// when both race.
    pub async fn recharge(
        &self,
        user_id: UserId,
        amount: Credits,
        external_tx_id: &str,
        source: Option<&str>,
    ) -> Result<RechargeResponse, LedgerError> {
        let mut tracker = MutationTracker::start("recharge", user_id);

        let external_tx_id = external_tx_id.trim();
        let source = normalize_source(source);
        if let Err(e) = validate_amount(amount)
            .and_then(|_| validate_recharge_keys(external_tx_id, &source))
        {
            tracker.advance(MutationState::RejectedPrecheck, e.code());
            return Err(e);
        }

        if let Err(reason) = self
            .verifier
            .verify(user_id, external_tx_id, amount, &source)
            .await
        {
            tracker.advance(MutationState::RejectedPrecheck, "PAYMENT_VERIFICATION_FAILED");
            warn!(
                user_id,
                external_tx_id,
                verifier = self.verifier.name(),
                %reason,
                "payment verification rejected recharge"
            );
            return Err(LedgerError::PaymentVerificationFailed(reason));
        }
        tracker.advance(MutationState::Validated, "");

        // Cheap early exit; the unique index below is what actually decides
        let existing = bounded(self.op_timeout, self.store.find_recharge(external_tx_id)).await;
        match existing {
            Ok(Some(_)) => {
                tracker.advance(MutationState::RejectedPrecheck, "DUPLICATE_TRANSACTION");
                return Err(LedgerError::DuplicateTransaction(external_tx_id.to_string()));
            }
            Ok(None) => {}
            Err(e) => {
                tracker.advance(MutationState::Aborted, e.code());
                return Err(e);
            }
        }

        let ext = external_tx_id.to_string();
        let result = self
            .with_transaction(move |tx| {
                Box::pin(async move {
                    let now = Utc::now();
                    let current = tx.ensure_balance(user_id, now).await?;
                    if current.balance < 0 {
                        return Err(LedgerError::InvariantViolation(format!(
                            "negative balance {} for user {}",
                            current.balance, user_id
                        )));
                    }
                    let new_balance = current
                        .balance
                        .checked_add(amount)
                        .ok_or(LedgerError::Overflow)?;

                    tx.update_balance(user_id, new_balance, now).await?;

                    let record = TransactionRecord::recharge(
                        user_id,
                        amount,
                        new_balance,
                        ext.clone(),
                        source,
                        now,
                    );
                    match tx.append_transaction(&record).await? {
                        AppendOutcome::Appended => {}
                        AppendOutcome::DuplicateExternalId => {
                            debug!(user_id, external_tx_id = %ext, "recharge lost idempotence race");
                            return Err(LedgerError::DuplicateTransaction(ext));
                        }
                    }

                    Ok(RechargeResponse {
                        new_balance,
                        recharged_amount: amount,
                        transaction_id: record.transaction_id.to_string(),
                    })
                })
            })
            .await;

        finish(&mut tracker, &result, |r| &r.transaction_id);
        if let Ok(r) = &result {
            info!(
                user_id,
                amount,
                new_balance = r.new_balance,
                external_tx_id,
                transaction_id = %r.transaction_id,
                "credits recharged"
            );
        }
        result
    }
}

fn validate_amount(amount: Credits) -> Result<(), LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount);
    }
    Ok(())
}

/// Lengths are in characters, matching PostgreSQL VARCHAR(n)
fn validate_recharge_keys(external_tx_id: &str, source: &str) -> Result<(), LedgerError> {
    if external_tx_id.is_empty() {
        return Err(LedgerError::EmptyTransactionId);
    }
    if external_tx_id.chars().count() > MAX_EXTERNAL_TX_ID_LEN {
        return Err(LedgerError::TransactionIdTooLong(MAX_EXTERNAL_TX_ID_LEN));
    }
    if source.chars().count() > MAX_SOURCE_LEN {
        return Err(LedgerError::SourceTooLong(MAX_SOURCE_LEN));
    }
    Ok(())
}

/// Move the tracker to its terminal state for a unit-of-work result.
///
/// Funds and account checks fail before anything is written, so they count as
/// precheck rejections. Everything else that fails inside the scope aborts it.
fn finish<T>(
    tracker: &mut MutationTracker,
    result: &Result<T, LedgerError>,
    tx_id: impl Fn(&T) -> &String,
) {
    match result {
        Ok(value) => tracker.advance(MutationState::Committed, tx_id(value)),
        Err(e @ (LedgerError::AccountNotFound(_) | LedgerError::InsufficientFunds { .. })) => {
            tracker.advance(MutationState::RejectedPrecheck, e.code())
        }
        Err(e) => tracker.advance(MutationState::Aborted, e.code()),
    }
}
