//! Memo CRUD, scoped per user

pub mod error;
pub mod handlers;
pub mod models;
pub mod service;

pub use error::MemoError;
pub use models::{Memo, MemoListQuery, MemoPage, MemoRequest};
pub use service::MemoService;
