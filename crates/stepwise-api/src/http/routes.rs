//! HTTP route definitions.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::assets;
use crate::http::handlers::{chat, list_sessions, list_tools};
use crate::http::monitoring;
use crate::state::AppState;
use crate::websocket::ws_handler;

/// Create the main router.
///
/// ```text
/// GET  /                   - Browser client
/// GET  /app.js             - Browser client script
/// GET  /health             - Health check
/// GET  /api/version        - Server name and version
/// GET  /api/tools          - Tools available to the agent
/// GET  /api/sessions       - Connected sessions
/// POST /api/chat           - One non-streaming turn
/// GET  /ws/chat/{client_id} - Streaming session
/// ```
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/version", get(monitoring::version))
        .route("/tools", get(list_tools))
        .route("/sessions", get(list_sessions))
        .route("/chat", post(chat));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(assets::serve_index))
        .route("/app.js", get(assets::serve_js))
        .route("/health", get(monitoring::health_check))
        .route("/ws/chat/{client_id}", get(ws_handler))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
