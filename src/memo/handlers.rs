//! Memo HTTP handlers (JWT protected)

use std::sync::Arc;

use axum::{
    Extension,
    extract::{Path, Query, State},
};

use super::models::{Memo, MemoListQuery, MemoPage, MemoRequest};
use super::service::MemoService;
use crate::core_types::MemoId;
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiError, ApiResponse, ApiResult, ValidatedJson, created, ok};
use crate::user_auth::AuthUser;

fn memo_service(state: &AppState) -> Result<&Arc<MemoService>, ApiError> {
    state
        .memos
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Memo service unavailable"))
}

/// List the caller's memos
#[utoipa::path(
    get,
    path = "/api/memos",
    params(MemoListQuery),
    responses(
        (status = 200, description = "Memo page", body = ApiResponse<MemoPage>),
        (status = 400, description = "Invalid paging"),
        (status = 401, description = "Authentication failed")
    ),
    security(("jwt" = [])),
    tag = "Memo"
)]
pub async fn list_memos(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<MemoListQuery>,
) -> ApiResult<MemoPage> {
    let page = memo_service(&state)?.list(user.user_id, &query).await?;
    ok(page)
}

/// Create a memo
#[utoipa::path(
    post,
    path = "/api/memos",
    request_body = MemoRequest,
    responses(
        (status = 201, description = "Memo created", body = ApiResponse<Memo>),
        (status = 400, description = "Title missing"),
        (status = 401, description = "Authentication failed")
    ),
    security(("jwt" = [])),
    tag = "Memo"
)]
pub async fn create_memo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<MemoRequest>,
) -> ApiResult<Memo> {
    let memo = memo_service(&state)?.create(user.user_id, req).await?;
    created(memo)
}

/// Get one memo
#[utoipa::path(
    get,
    path = "/api/memos/{id}",
    params(("id" = i64, Path, description = "Memo id")),
    responses(
        (status = 200, description = "Memo", body = ApiResponse<Memo>),
        (status = 404, description = "Memo not found")
    ),
    security(("jwt" = [])),
    tag = "Memo"
)]
pub async fn get_memo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<MemoId>,
) -> ApiResult<Memo> {
    let memo = memo_service(&state)?.get(user.user_id, id).await?;
    ok(memo)
}

/// Replace title and content
#[utoipa::path(
    put,
    path = "/api/memos/{id}",
    params(("id" = i64, Path, description = "Memo id")),
    request_body = MemoRequest,
    responses(
        (status = 200, description = "Memo updated", body = ApiResponse<Memo>),
        (status = 404, description = "Memo not found")
    ),
    security(("jwt" = [])),
    tag = "Memo"
)]
pub async fn update_memo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<MemoId>,
    ValidatedJson(req): ValidatedJson<MemoRequest>,
) -> ApiResult<Memo> {
    let memo = memo_service(&state)?.update(user.user_id, id, req).await?;
    ok(memo)
}

/// Delete a memo
#[utoipa::path(
    delete,
    path = "/api/memos/{id}",
    params(("id" = i64, Path, description = "Memo id")),
    responses(
        (status = 200, description = "Memo deleted"),
        (status = 404, description = "Memo not found")
    ),
    security(("jwt" = [])),
    tag = "Memo"
)]
pub async fn delete_memo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<MemoId>,
) -> ApiResult<MemoId> {
    memo_service(&state)?.delete(user.user_id, id).await?;
    ok(id)
}
