//! memo_credits server
//!
//! Usage:
//!   memo_credits [--env dev] [--port 8080]
//!
//! With `postgres_url` configured (or `DATABASE_URL` set) users, memos and the
//! credits ledger live in PostgreSQL. Without it the ledger runs in memory and
//! the auth/memo routes answer 503.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use memo_credits::config::AppConfig;
use memo_credits::db::Database;
use memo_credits::gateway::{self, state::AppState};
use memo_credits::ledger::{
    BalanceQueryService, LedgerEngine, LedgerStore, MemoryLedgerStore, PgLedgerStore,
};
use memo_credits::logging;
use memo_credits::user_auth::TokenService;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }

    let _log_guard = logging::init_logging(&config);
    tracing::info!(
        env = %env,
        version = env!("GIT_HASH"),
        "memo_credits starting"
    );

    let op_timeout = Duration::from_millis(config.ledger.op_timeout_ms);
    let tokens = Arc::new(TokenService::new(
        config.auth.jwt_secret.clone(),
        config.auth.jwt_expires_hours,
    ));

    let (store, db): (Arc<dyn LedgerStore>, Option<Arc<Database>>) = match &config.postgres_url {
        Some(url) => {
            let db = Database::connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            db.init_schema().await?;
            tracing::info!("PostgreSQL connected, schema ready");
            let store: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(db.pool().clone()));
            (store, Some(Arc::new(db)))
        }
        None => {
            tracing::warn!("No postgres_url configured: in-memory ledger, auth and memos disabled");
            (Arc::new(MemoryLedgerStore::new()), None)
        }
    };

    let ledger = Arc::new(LedgerEngine::new(store.clone()).with_timeout(op_timeout));
    let balances = Arc::new(BalanceQueryService::new(store).with_timeout(op_timeout));

    let mut state = AppState::new(ledger, balances, tokens);
    if let Some(db) = db {
        state = state.with_database(db);
    }

    gateway::run_server(&config.gateway, Arc::new(state)).await
}
