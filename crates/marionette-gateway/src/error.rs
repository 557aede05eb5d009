//! Error types for the gateway layer.
//!
//! [`GatewayError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. The
//! response body follows the `{status, message, timestamp}` shape the
//! request channel uses for all replies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use marionette_types::events::timestamp_ms;

/// Errors that can occur in the gateway layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Failed to bind a network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The request body could not be parsed as a command envelope.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// The host did not answer within the request deadline.
    #[error("command processing timed out")]
    Timeout,

    /// The host side of the command channel is gone.
    #[error("command channel closed")]
    ChannelClosed,

    /// A serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Bind(_) | Self::ChannelClosed | Self::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "status": "error",
            "message": self.to_string(),
            "timestamp": timestamp_ms(),
        });

        (status, axum::Json(body)).into_response()
    }
}
