//! Balance Store (PostgreSQL)
//!
//! `currency_balances_tb` holds exactly one row per user. Writes inside a
//! ledger unit go through `find_for_update` first so concurrent units on the
//! same user serialize on the row lock.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgExecutor};

use super::types::BalanceRecord;
use crate::core_types::{Credits, UserId};

#[derive(Debug, FromRow)]
struct BalanceRow {
    user_id: i64,
    balance: i64,
    last_update_time: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BalanceRow> for BalanceRecord {
    fn from(r: BalanceRow) -> Self {
        Self {
            user_id: r.user_id,
            balance: r.balance,
            last_update_time: r.last_update_time,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Read a balance without locking
pub async fn find<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: UserId,
) -> Result<Option<BalanceRecord>, sqlx::Error> {
    let row: Option<BalanceRow> = sqlx::query_as(
        r#"SELECT user_id, balance, last_update_time, created_at, updated_at
           FROM currency_balances_tb WHERE user_id = $1"#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(BalanceRecord::from))
}

/// Read and row-lock a balance for the rest of the transaction
pub async fn find_for_update(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Option<BalanceRecord>, sqlx::Error> {
    let row: Option<BalanceRow> = sqlx::query_as(
        r#"SELECT user_id, balance, last_update_time, created_at, updated_at
           FROM currency_balances_tb WHERE user_id = $1
           FOR UPDATE"#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(BalanceRecord::from))
}

/// Insert a zero balance unless the user already has one.
///
/// Returns true if a row was inserted.
pub async fn insert_if_absent<'e, E: PgExecutor<'e>>(
    executor: E,
    record: &BalanceRecord,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"INSERT INTO currency_balances_tb
               (user_id, balance, last_update_time, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5)
           ON CONFLICT (user_id) DO NOTHING"#,
    )
    .bind(record.user_id)
    .bind(record.balance)
    .bind(record.last_update_time)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Overwrite the balance of a locked row. Returns affected row count.
pub async fn set_balance(
    conn: &mut PgConnection,
    user_id: UserId,
    new_balance: Credits,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE currency_balances_tb
           SET balance = $1, last_update_time = $2, updated_at = $2
           WHERE user_id = $3"#,
    )
    .bind(new_balance)
    .bind(now)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}
