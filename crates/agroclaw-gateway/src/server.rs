//! HTTP server implementation using Axum.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use agroclaw_agent::Advisor;
use agroclaw_core::config::GatewayConfig;
use agroclaw_core::traits::RecordStore;
use agroclaw_core::{AgroClawError, Result};
use agroclaw_rag::Retriever;

use crate::routes;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub gateway_config: GatewayConfig,
    pub advisor: Arc<Advisor>,
    pub retriever: Arc<Retriever>,
    pub store: Arc<dyn RecordStore>,
}

pub fn router(state: Arc<AppState>) -> Router {
    // The mobile/web frontend runs on a different origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/api/chat", post(routes::chat))
        .route("/api/generate-text", post(routes::generate_text))
        .route("/api/rag/refresh", post(routes::rag_refresh))
        .route("/api/news", get(routes::list_news).post(routes::create_news))
        .route(
            "/api/news/{id}",
            get(routes::get_news)
                .put(routes::update_news)
                .delete(routes::delete_news),
        )
        .route("/api/tips", get(routes::list_tips).post(routes::create_tip))
        .route(
            "/api/tips/{id}",
            get(routes::get_tip)
                .put(routes::update_tip)
                .delete(routes::delete_tip),
        )
        .route(
            "/api/categories",
            get(routes::list_categories).post(routes::create_category),
        )
        .route("/api/categories/{id}", get(routes::get_category))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn start(state: AppState) -> Result<()> {
    let addr = format!(
        "{}:{}",
        state.gateway_config.host, state.gateway_config.port
    );
    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AgroClawError::Other(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("🚀 Gateway listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .map_err(|e| AgroClawError::Other(format!("Server error: {e}")))
}
