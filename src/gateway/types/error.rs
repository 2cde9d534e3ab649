//! Handler error type
//!
//! `ApiError` renders as the standard envelope with a matching HTTP status.
//! Domain errors convert into it at the handler boundary.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::response::{ApiResponse, error_codes};
use crate::ledger::{InsufficientFundsData, LedgerError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
    pub data: Option<serde_json::Value>,
}

/// Handler result: HTTP status plus the success envelope
pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// 200 with `data`
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

/// 201 with `data`
pub fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
            data: None,
        }
    }

    /// Attach structured details to the error envelope
    pub fn with_data(mut self, data: impl Serialize) -> Self {
        self.data = serde_json::to_value(data).ok();
        self
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn unauthorized(code: i32, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, msg)
    }

    pub fn not_found(code: i32, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, msg)
    }

    pub fn conflict(code: i32, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, msg)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            msg,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse {
            code: self.code,
            msg: self.msg,
            data: self.data,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let code = match &err {
            LedgerError::InsufficientFunds { .. } => error_codes::INSUFFICIENT_BALANCE,
            LedgerError::DuplicateTransaction(_) => error_codes::DUPLICATE_TRANSACTION,
            LedgerError::PaymentVerificationFailed(_) => error_codes::PAYMENT_VERIFICATION_FAILED,
            LedgerError::AccountNotFound(_) => error_codes::ACCOUNT_NOT_FOUND,
            LedgerError::InvariantViolation(_) => error_codes::INVARIANT_VIOLATION,
            e if e.is_validation() => error_codes::INVALID_PARAMETER,
            e if e.is_transient() => error_codes::SERVICE_UNAVAILABLE,
            _ => error_codes::INTERNAL_ERROR,
        };

        match &err {
            LedgerError::InvariantViolation(detail) => {
                tracing::error!(error_code = err.code(), %detail, "ledger invariant violated");
            }
            e if status.is_server_error() => {
                tracing::error!(error_code = e.code(), error = %e, "ledger operation failed");
            }
            _ => {}
        }

        // Internal details stay in the log
        let msg = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            err.to_string()
        };

        let api_err = ApiError::new(status, code, msg);
        match err {
            LedgerError::InsufficientFunds {
                current_balance,
                required_amount,
            } => api_err.with_data(InsufficientFundsData {
                current_balance,
                required_amount,
            }),
            _ => api_err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_carries_data() {
        let err = ApiError::from(LedgerError::InsufficientFunds {
            current_balance: 70,
            required_amount: 1000,
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, error_codes::INSUFFICIENT_BALANCE);
        let data = err.data.unwrap();
        assert_eq!(data["currentBalance"], 70);
        assert_eq!(data["requiredAmount"], 1000);
    }

    #[test]
    fn test_ledger_error_mapping() {
        let cases = [
            (
                LedgerError::DuplicateTransaction("tx1".into()),
                StatusCode::BAD_REQUEST,
                error_codes::DUPLICATE_TRANSACTION,
            ),
            (
                LedgerError::PaymentVerificationFailed("declined".into()),
                StatusCode::BAD_REQUEST,
                error_codes::PAYMENT_VERIFICATION_FAILED,
            ),
            (
                LedgerError::AccountNotFound(1),
                StatusCode::NOT_FOUND,
                error_codes::ACCOUNT_NOT_FOUND,
            ),
            (
                LedgerError::InvalidAmount,
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_PARAMETER,
            ),
            (
                LedgerError::Timeout(5000),
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::SERVICE_UNAVAILABLE,
            ),
            (
                LedgerError::InvariantViolation("negative".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INVARIANT_VIOLATION,
            ),
            (
                LedgerError::TransactionLogWriteFailed("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
            ),
        ];
        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.code, code);
        }
    }

    #[test]
    fn test_internal_details_hidden() {
        let api = ApiError::from(LedgerError::InvariantViolation("balance -5".into()));
        assert_eq!(api.msg, "Internal server error");
    }
}
