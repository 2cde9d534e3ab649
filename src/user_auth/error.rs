use thiserror::Error;

use crate::gateway::types::{ApiError, error_codes};

#[derive(Error, Debug)]
pub enum UserAuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Username already exists")]
    UsernameTaken,

    /// Unknown user and wrong password are reported identically
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// PostgreSQL unique_violation
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

impl From<UserAuthError> for ApiError {
    fn from(err: UserAuthError) -> Self {
        match err {
            UserAuthError::Validation(msg) => ApiError::bad_request(msg),
            UserAuthError::UsernameTaken => {
                ApiError::conflict(error_codes::USERNAME_TAKEN, "Username already exists")
            }
            UserAuthError::InvalidCredentials => ApiError::unauthorized(
                error_codes::INVALID_CREDENTIALS,
                "Invalid username or password",
            ),
            UserAuthError::Internal(e) => {
                tracing::error!("User auth failure: {:?}", e);
                ApiError::internal("Internal server error")
            }
        }
    }
}
