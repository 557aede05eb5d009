//! Axum router construction for both gateway channels.
//!
//! Two separate routers back two separate listeners: the persistent
//! channel (`WebSocket`) and the request channel (plain HTTP). CORS is
//! wide open so browser-hosted controllers can talk to a locally
//! running instance.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::GatewayState;
use crate::ws;

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the persistent-channel router.
///
/// - `GET /ws` -- upgrade to the control channel
pub fn build_persistent_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_control))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the request-channel router.
///
/// - `POST /` -- submit one command envelope
/// - `GET /health` -- liveness probe
/// - anything else -- structured 404
pub fn build_request_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/", post(handlers::submit_command))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
