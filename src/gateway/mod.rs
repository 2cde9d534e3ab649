pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::GatewayConfig;
use crate::memo::handlers as memo_handlers;
use crate::user_auth::{handlers as auth_handlers, jwt_auth_middleware};
use state::AppState;

/// Assemble the full application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login));

    let memo_routes = Router::new()
        .route(
            "/api/memos",
            get(memo_handlers::list_memos).post(memo_handlers::create_memo),
        )
        .route(
            "/api/memos/{id}",
            get(memo_handlers::get_memo)
                .put(memo_handlers::update_memo)
                .delete(memo_handlers::delete_memo),
        )
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let currency_routes = Router::new()
        .route("/balance", get(handlers::get_balance))
        .route("/deduct", post(handlers::deduct))
        .route("/recharge", post(handlers::recharge))
        .route("/transactions", get(handlers::list_transactions))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/auth", auth_routes)
        .merge(memo_routes)
        .nest("/api/currency", currency_routes)
        .with_state(state)
        // Stateless, added after with_state
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start HTTP Gateway server
pub async fn run_server(config: &GatewayConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {}: {} (port {} may already be in use)",
            addr,
            e,
            config.port
        )
    })?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
