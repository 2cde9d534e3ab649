//! Credits ledger handlers (JWT protected)
//!
//! The caller's user id always comes from the verified token, never from the
//! request body.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{Query, State},
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::super::state::AppState;
use super::super::types::{ApiResponse, ApiResult, ValidatedJson, ok};
use crate::ledger::{
    BalanceResponse, DeductRequest, DeductResponse, RechargeRequest, RechargeResponse,
    TransactionPage,
};
use crate::user_auth::AuthUser;

/// Current balance (creates a zero balance on first access)
#[utoipa::path(
    get,
    path = "/api/currency/balance",
    responses(
        (status = 200, description = "Current balance", body = ApiResponse<BalanceResponse>),
        (status = 401, description = "Authentication failed"),
        (status = 503, description = "Store unavailable")
    ),
    security(("jwt" = [])),
    tag = "Currency"
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<BalanceResponse> {
    let balance = state.balances.get_balance(user.user_id).await?;
    ok(balance)
}

/// Deduct credits
#[utoipa::path(
    post,
    path = "/api/currency/deduct",
    request_body = DeductRequest,
    responses(
        (status = 200, description = "Credits deducted", body = ApiResponse<DeductResponse>),
        (status = 400, description = "Invalid amount or insufficient credits; data = {currentBalance, requiredAmount}"),
        (status = 404, description = "No credits account"),
        (status = 503, description = "Transient failure, safe to retry")
    ),
    security(("jwt" = [])),
    tag = "Currency"
)]
pub async fn deduct(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<DeductRequest>,
) -> ApiResult<DeductResponse> {
    let resp = state
        .ledger
        .deduct(user.user_id, req.amount, &req.reason, req.memo_id)
        .await?;
    ok(resp)
}

/// Recharge credits with an external payment id
#[utoipa::path(
    post,
    path = "/api/currency/recharge",
    request_body = RechargeRequest,
    responses(
        (status = 200, description = "Credits recharged", body = ApiResponse<RechargeResponse>),
        (status = 400, description = "Invalid input, duplicate transaction id or payment verification failed"),
        (status = 503, description = "Transient failure, safe to retry")
    ),
    security(("jwt" = [])),
    tag = "Currency"
)]
pub async fn recharge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<RechargeRequest>,
) -> ApiResult<RechargeResponse> {
    let resp = state
        .ledger
        .recharge(
            user.user_id,
            req.amount,
            &req.transaction_id,
            req.source.as_deref(),
        )
        .await?;
    ok(resp)
}

/// History query string
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Page number, starting at 1
    pub page: Option<i64>,
    /// Page size, 1-100 (default 20)
    pub limit: Option<i64>,
}

/// Ledger history, newest first
#[utoipa::path(
    get,
    path = "/api/currency/transactions",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Transaction page", body = ApiResponse<TransactionPage>),
        (status = 400, description = "Invalid paging")
    ),
    security(("jwt" = [])),
    tag = "Currency"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<TransactionPage> {
    let page = state
        .balances
        .list_transactions(user.user_id, query.page, query.limit)
        .await?;
    ok(page)
}
