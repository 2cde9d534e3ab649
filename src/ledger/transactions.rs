//! Transaction Log (PostgreSQL)
//!
//! `currency_transactions_tb` is append-only. Recharge rows are unique on
//! `(kind, external_tx_id)` through a partial index, which is what makes
//! concurrent duplicate recharges collapse to a single success.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgExecutor, Row};

use super::error::LedgerError;
use super::store::AppendOutcome;
use super::types::{TransactionId, TransactionKind, TransactionRecord};
use crate::core_types::UserId;

const SELECT_COLUMNS: &str = r#"SELECT transaction_id, user_id, kind, amount, balance_after,
       reason, memo_id, external_tx_id, source, created_at
  FROM currency_transactions_tb"#;

/// Append one entry.
///
/// A recharge whose external id is already taken is not an error at this
/// layer; it comes back as `DuplicateExternalId` and the caller aborts.
pub async fn insert(
    conn: &mut PgConnection,
    record: &TransactionRecord,
) -> Result<AppendOutcome, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO currency_transactions_tb
            (transaction_id, user_id, kind, amount, balance_after, reason,
             memo_id, external_tx_id, source, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (kind, external_tx_id) WHERE kind = 'recharge' DO NOTHING
        "#,
    )
    .bind(record.transaction_id.to_string())
    .bind(record.user_id)
    .bind(record.kind.as_str())
    .bind(record.amount)
    .bind(record.balance_after)
    .bind(&record.reason)
    .bind(record.memo_id)
    .bind(&record.external_tx_id)
    .bind(&record.source)
    .bind(record.created_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        Ok(AppendOutcome::DuplicateExternalId)
    } else {
        Ok(AppendOutcome::Appended)
    }
}

/// Find a recharge by external idempotence key
pub async fn find_recharge<'e, E: PgExecutor<'e>>(
    executor: E,
    external_tx_id: &str,
) -> Result<Option<TransactionRecord>, LedgerError> {
    let sql = format!(
        "{} WHERE kind = 'recharge' AND external_tx_id = $1",
        SELECT_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(external_tx_id)
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(row_to_record).transpose()
}

/// Newest-first page of one user's history
pub async fn list_by_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: UserId,
    offset: i64,
    limit: i64,
) -> Result<Vec<TransactionRecord>, LedgerError> {
    let sql = format!(
        "{} WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        SELECT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;

    rows.iter().map(row_to_record).collect()
}

pub async fn count_by_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: UserId,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM currency_transactions_tb WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}

/// Convert database row to TransactionRecord
fn row_to_record(row: &PgRow) -> Result<TransactionRecord, LedgerError> {
    let id_str: String = row.get("transaction_id");
    let transaction_id: TransactionId = id_str.parse().map_err(|_| {
        LedgerError::InvariantViolation(format!("Invalid transaction_id format: {}", id_str))
    })?;

    let kind_str: String = row.get("kind");
    let kind: TransactionKind = kind_str
        .parse()
        .map_err(LedgerError::InvariantViolation)?;

    let created_at: DateTime<Utc> = row.get("created_at");

    Ok(TransactionRecord {
        transaction_id,
        user_id: row.get("user_id"),
        kind,
        amount: row.get("amount"),
        balance_after: row.get("balance_after"),
        reason: row.get("reason"),
        memo_id: row.get("memo_id"),
        external_tx_id: row.get("external_tx_id"),
        source: row.get("source"),
        created_at,
    })
}
