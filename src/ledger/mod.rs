//! Credits Ledger
//!
//! Per-user virtual currency: balance query, atomic deduct, idempotent
//! recharge and an append-only transaction history.
//!
//! # Components
//!
//! - [`LedgerEngine`]: owns the write path; every mutation is one unit of work
//! - [`BalanceQueryService`]: read path with lazy zero initialization
//! - [`LedgerStore`]: persistence seam, backed by PostgreSQL ([`PgLedgerStore`])
//!   or memory ([`MemoryLedgerStore`])
//! - [`PaymentVerifier`]: external payment check run before a recharge

mod balances;
pub mod engine;
pub mod error;
pub mod memory;
pub mod pg;
pub mod query;
pub mod state;
pub mod store;
mod transactions;
pub mod types;
pub mod verifier;

pub use engine::{DEFAULT_OP_TIMEOUT_MS, LedgerEngine};
pub use error::LedgerError;
pub use memory::MemoryLedgerStore;
pub use pg::PgLedgerStore;
pub use query::BalanceQueryService;
pub use state::MutationState;
pub use store::{AppendOutcome, LedgerStore, LedgerTx};
pub use types::{
    BalanceResponse, DeductRequest, DeductResponse, InsufficientFundsData, RechargeRequest,
    RechargeResponse, TransactionId, TransactionKind, TransactionPage, TransactionView,
};
pub use verifier::{PaymentVerifier, TrustedVerifier};
