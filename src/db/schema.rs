//! PostgreSQL schema
//!
//! Statements are idempotent (`IF NOT EXISTS`) and run at startup.

use anyhow::{Context, Result};
use sqlx::PgPool;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users_tb (
    user_id       BIGSERIAL PRIMARY KEY,
    username      VARCHAR(20) NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

const CREATE_MEMOS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS memos_tb (
    memo_id    BIGSERIAL PRIMARY KEY,
    user_id    BIGINT NOT NULL REFERENCES users_tb(user_id),
    title      TEXT NOT NULL,
    content    TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

const CREATE_MEMOS_USER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_memos_user_created
    ON memos_tb (user_id, created_at DESC)"#;

const CREATE_BALANCES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS currency_balances_tb (
    user_id          BIGINT PRIMARY KEY,
    balance          BIGINT NOT NULL DEFAULT 0 CHECK (balance >= 0),
    last_update_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS currency_transactions_tb (
    id             BIGSERIAL PRIMARY KEY,
    transaction_id VARCHAR(40) NOT NULL UNIQUE,
    user_id        BIGINT NOT NULL,
    kind           VARCHAR(16) NOT NULL CHECK (kind IN ('deduct', 'recharge')),
    amount         BIGINT NOT NULL CHECK (amount > 0),
    balance_after  BIGINT NOT NULL CHECK (balance_after >= 0),
    reason         TEXT NOT NULL,
    memo_id        BIGINT,
    external_tx_id VARCHAR(128),
    source         VARCHAR(64),
    created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

/// Idempotence key for recharges
const CREATE_RECHARGE_UNIQUE_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS uq_recharge_external_tx
    ON currency_transactions_tb (kind, external_tx_id)
    WHERE kind = 'recharge'"#;

const CREATE_TRANSACTIONS_USER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_transactions_user_created
    ON currency_transactions_tb (user_id, created_at DESC)"#;

/// Create all tables and indexes
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    tracing::info!("Initializing PostgreSQL schema...");

    let steps: [(&str, &str); 7] = [
        ("users table", CREATE_USERS_TABLE),
        ("memos table", CREATE_MEMOS_TABLE),
        ("memos index", CREATE_MEMOS_USER_INDEX),
        ("currency balances table", CREATE_BALANCES_TABLE),
        ("currency transactions table", CREATE_TRANSACTIONS_TABLE),
        ("recharge unique index", CREATE_RECHARGE_UNIQUE_INDEX),
        ("transactions index", CREATE_TRANSACTIONS_USER_INDEX),
    ];

    for (name, sql) in steps {
        sqlx::query(sql)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create {}", name))?;
    }

    tracing::info!("PostgreSQL schema initialized successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recharge_index_is_partial_unique() {
        assert!(CREATE_RECHARGE_UNIQUE_INDEX.contains("UNIQUE INDEX"));
        assert!(CREATE_RECHARGE_UNIQUE_INDEX.contains("WHERE kind = 'recharge'"));
    }

    #[test]
    fn test_balance_non_negative_constraint() {
        assert!(CREATE_BALANCES_TABLE.contains("CHECK (balance >= 0)"));
    }
}
