use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::core_types::UserId;
use crate::gateway::{
    state::AppState,
    types::{ApiError, error_codes},
};

/// Verified caller identity, inserted into request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
    pub username: String,
}

pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract Authorization header
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            ApiError::unauthorized(error_codes::MISSING_AUTH, "Missing Authorization header")
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized(error_codes::AUTH_FAILED, "Invalid token format"))?;

    // 2. Verify token
    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::debug!("JWT rejected: {}", e);
        ApiError::unauthorized(error_codes::AUTH_FAILED, "Invalid or expired token")
    })?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| ApiError::unauthorized(error_codes::AUTH_FAILED, "Invalid token subject"))?;

    // 3. Inject user
    request.extensions_mut().insert(AuthUser {
        user_id,
        username: claims.username,
    });
    Ok(next.run(request).await)
}
