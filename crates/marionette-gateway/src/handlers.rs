//! Request-channel endpoint handlers.
//!
//! The request channel is the stateless HTTP alternative to the
//! persistent control channel: one command per request, with the routing
//! result returned in the response body.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/` | Submit one command envelope |
//! | `GET` | `/health` | Liveness probe, never touches the router |

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use marionette_types::CommandEnvelope;
use marionette_types::events::timestamp_ms;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::GatewayError;
use crate::state::GatewayState;

/// How long a request waits for the host before giving up.
///
/// The host routes commands on its tick loop, so a healthy system
/// answers within a tick or two; the deadline only fires when the loop
/// is stalled.
pub const RESPONSE_DEADLINE: Duration = Duration::from_secs(5);

/// Submit one command and wait for its routing result.
///
/// # Route
///
/// `POST /`
///
/// # Errors
///
/// Returns [`GatewayError::InvalidBody`] when the body does not parse
/// as a command envelope, [`GatewayError::Timeout`] when the host does
/// not answer within [`RESPONSE_DEADLINE`], and
/// [`GatewayError::ChannelClosed`] when the host is gone.
pub async fn submit_command(
    State(state): State<Arc<GatewayState>>,
    body: Result<Json<CommandEnvelope>, JsonRejection>,
) -> Result<Json<Value>, GatewayError> {
    let Json(envelope) = body.map_err(|rejection| GatewayError::InvalidBody(rejection.body_text()))?;
    let action = envelope.action.clone();
    debug!(action = %action, "request-channel command");

    let (reply_tx, reply_rx) = oneshot::channel();
    state.submit(envelope, Some(reply_tx)).await?;

    let result = tokio::time::timeout(RESPONSE_DEADLINE, reply_rx)
        .await
        .map_err(|_| GatewayError::Timeout)?
        .map_err(|_| GatewayError::ChannelClosed)?;

    let (status, message) = if result.is_success() {
        ("success", format!("{action} processed"))
    } else {
        ("error", result.error().unwrap_or("command rejected").to_owned())
    };

    Ok(Json(json!({
        "status": status,
        "message": message,
        "timestamp": timestamp_ms(),
        "result": result,
    })))
}

/// Liveness probe.
///
/// # Route
///
/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": timestamp_ms(),
    }))
}

/// Fallback for unknown paths.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "status": "error",
            "message": "Endpoint not found",
            "timestamp": timestamp_ms(),
        })),
    )
}
