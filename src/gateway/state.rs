use std::sync::Arc;

use crate::db::Database;
use crate::ledger::{BalanceQueryService, LedgerEngine};
use crate::memo::MemoService;
use crate::user_auth::{TokenService, UserAuthService};

/// Gateway application state (shared)
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL pool; absent when running on the in-memory ledger
    pub pg_db: Option<Arc<Database>>,
    /// JWT issue/verify, always available
    pub tokens: Arc<TokenService>,
    /// Register/login (requires PostgreSQL)
    pub user_auth: Option<Arc<UserAuthService>>,
    /// Memo CRUD (requires PostgreSQL)
    pub memos: Option<Arc<MemoService>>,
    /// Ledger write path
    pub ledger: Arc<LedgerEngine>,
    /// Ledger read path
    pub balances: Arc<BalanceQueryService>,
}

impl AppState {
    pub fn new(
        ledger: Arc<LedgerEngine>,
        balances: Arc<BalanceQueryService>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            pg_db: None,
            tokens,
            user_auth: None,
            memos: None,
            ledger,
            balances,
        }
    }

    /// Enable the PostgreSQL-backed services
    pub fn with_database(mut self, db: Arc<Database>) -> Self {
        self.user_auth = Some(Arc::new(UserAuthService::new(
            db.pool().clone(),
            self.tokens.clone(),
        )));
        self.memos = Some(Arc::new(MemoService::new(db.pool().clone())));
        self.pg_db = Some(db);
        self
    }
}
