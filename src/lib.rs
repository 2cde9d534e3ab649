//! memo_credits - memos with a transactional credits ledger
//!
//! # Modules
//!
//! - [`core_types`] - Id and amount aliases
//! - [`config`] - YAML configuration with environment overrides
//! - [`logging`] - tracing subscriber setup
//! - [`db`] - PostgreSQL pool and schema
//! - [`ledger`] - Credits ledger engine, balance queries and stores
//! - [`user_auth`] - Registration, login and JWT middleware
//! - [`memo`] - Per-user memo CRUD
//! - [`gateway`] - HTTP router, handlers and OpenAPI docs

// Core types - must be first!
pub mod core_types;

pub mod config;
pub mod db;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod memo;
pub mod user_auth;

// Convenient re-exports at crate root
pub use core_types::{Credits, MemoId, UserId};
pub use ledger::{BalanceQueryService, LedgerEngine, LedgerError};
