//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::handlers::HealthResponse;
use crate::ledger::{
    BalanceResponse, DeductRequest, DeductResponse, InsufficientFundsData, RechargeRequest,
    RechargeResponse, TransactionKind, TransactionPage, TransactionView,
};
use crate::memo::{Memo, MemoPage, MemoRequest};
use crate::user_auth::{LoginRequest, LoginResponse, RegisterRequest, UserView};

/// JWT bearer security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from POST /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Memo Credits API",
        version = "1.0.0",
        description = "Per-user memos with a transactional credits ledger.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::user_auth::handlers::register,
        crate::user_auth::handlers::login,
        crate::memo::handlers::list_memos,
        crate::memo::handlers::create_memo,
        crate::memo::handlers::get_memo,
        crate::memo::handlers::update_memo,
        crate::memo::handlers::delete_memo,
        crate::gateway::handlers::currency::get_balance,
        crate::gateway::handlers::currency::deduct,
        crate::gateway::handlers::currency::recharge,
        crate::gateway::handlers::currency::list_transactions,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UserView,
            Memo,
            MemoRequest,
            MemoPage,
            BalanceResponse,
            DeductRequest,
            DeductResponse,
            RechargeRequest,
            RechargeResponse,
            InsufficientFundsData,
            TransactionKind,
            TransactionView,
            TransactionPage,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Memo", description = "Per-user memo CRUD (auth required)"),
        (name = "Currency", description = "Credits balance, deduct, recharge and history (auth required)"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generates() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "Memo Credits API");
        assert_eq!(spec.info.version, "1.0.0");
    }

    #[test]
    fn test_openapi_json_serializable() {
        let json_str = ApiDoc::openapi().to_json().unwrap();
        assert!(json_str.contains("Memo Credits API"));
        assert!(json_str.contains("remainingBalance"));
    }

    #[test]
    fn test_endpoints_registered() {
        let paths = ApiDoc::openapi().paths;
        for path in [
            "/health",
            "/api/auth/register",
            "/api/auth/login",
            "/api/memos",
            "/api/memos/{id}",
            "/api/currency/balance",
            "/api/currency/deduct",
            "/api/currency/recharge",
            "/api/currency/transactions",
        ] {
            assert!(paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_security_scheme_registered() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("should have components");
        assert!(components.security_schemes.contains_key("jwt"));
    }
}
