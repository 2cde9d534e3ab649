use axum::extract::State;
use std::sync::Arc;

use super::service::{LoginRequest, LoginResponse, RegisterRequest, UserAuthService, UserView};
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiError, ApiResponse, ApiResult, ValidatedJson, created, ok};

fn auth_service(state: &AppState) -> Result<&Arc<UserAuthService>, ApiError> {
    state
        .user_auth
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Auth service unavailable"))
}

/// Register a new user
///
/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<UserView>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already exists"),
        (status = 503, description = "Auth service unavailable")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<UserView> {
    let user = auth_service(&state)?.register(req).await?;
    created(user)
}

/// Login user
///
/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials"),
        (status = 503, description = "Auth service unavailable")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let resp = auth_service(&state)?.login(req).await?;
    ok(resp)
}
