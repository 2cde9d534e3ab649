use thiserror::Error;

use crate::gateway::types::{ApiError, error_codes};

#[derive(Error, Debug)]
pub enum MemoError {
    #[error("{0}")]
    Validation(String),

    /// Missing, or owned by another user
    #[error("Memo not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<MemoError> for ApiError {
    fn from(err: MemoError) -> Self {
        match err {
            MemoError::Validation(msg) => ApiError::bad_request(msg),
            MemoError::NotFound => ApiError::not_found(error_codes::MEMO_NOT_FOUND, "Memo not found"),
            MemoError::Database(e) => {
                tracing::error!("Memo query failed: {}", e);
                ApiError::internal("Internal server error")
            }
        }
    }
}
