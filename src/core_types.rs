//! Core types used throughout the system
//!
//! Type aliases shared by the ledger, memo and auth modules.

/// User ID - primary key of `users_tb`, immutable after assignment.
///
/// # Usage:
/// - Owner key of balance, transaction and memo rows
/// - Carried in the JWT `sub` claim as a decimal string
pub type UserId = i64;

/// Memo ID - primary key of `memos_tb`
pub type MemoId = i64;

/// Credit amount. Balances are whole credits, never fractional.
pub type Credits = i64;
