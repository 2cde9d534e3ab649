//! HTTP handlers

pub mod currency;
pub mod health;

pub use currency::{HistoryQuery, deduct, get_balance, list_transactions, recharge};
pub use health::{HealthResponse, health_check};
