//! `WebSocket` handler for the persistent control channel.
//!
//! Clients connect to `GET /ws`, receive a `connection` event, and can
//! then send `{action, data}` envelopes at will. Every syntactically
//! valid envelope is acked immediately and forwarded to the host;
//! malformed frames produce an `error` event on the same socket without
//! closing it. Sync events broadcast by the host arrive interleaved on
//! the same connection.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use marionette_types::{CommandEnvelope, ServerEvent};
use tracing::{debug, warn};

use crate::state::GatewayState;

/// Upgrade an HTTP request to the persistent control channel.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_control(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the socket lifecycle: register with the fan-out registry,
/// greet the client, then shuttle frames both ways until either side
/// goes away.
async fn handle_ws(mut socket: WebSocket, state: Arc<GatewayState>) {
    let (id, mut outbound) = state.register().await;
    debug!(client = %id, "control channel connected");

    if let Ok(greeting) = serde_json::to_string(&ServerEvent::connected()) {
        if socket.send(Message::Text(greeting.into())).await.is_err() {
            state.deregister(id).await;
            return;
        }
    }

    loop {
        tokio::select! {
            // Events fanned out by the host (sync broadcasts).
            frame = outbound.recv() => {
                match frame {
                    Some(frame) => {
                        if socket.send(Message::Text(frame.into())).await.is_err() {
                            debug!(client = %id, "control channel disconnected (send failed)");
                            break;
                        }
                    }
                    None => {
                        debug!(client = %id, "fan-out channel closed");
                        break;
                    }
                }
            }
            // Frames sent by the client.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if !handle_frame(&mut socket, &state, text.as_str()).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(client = %id, "control channel disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(client = %id, "control channel error: {e}");
                        break;
                    }
                    _ => {
                        // Binary and pong frames are ignored.
                    }
                }
            }
        }
    }

    state.deregister(id).await;
}

/// Process one inbound text frame. Returns false when the socket should
/// close.
async fn handle_frame(socket: &mut WebSocket, state: &GatewayState, text: &str) -> bool {
    let envelope: CommandEnvelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            // A malformed frame is the client's problem, not a reason
            // to drop the connection.
            return send_event(
                socket,
                &ServerEvent::error("Invalid JSON format", Some(e.to_string())),
            )
            .await;
        }
    };

    let action = envelope.action.clone();
    if state.submit(envelope, None).await.is_err() {
        warn!("host command channel closed, dropping control channel");
        let _ = send_event(
            socket,
            &ServerEvent::error("command processing unavailable", None),
        )
        .await;
        return false;
    }

    // Accepted, not yet applied.
    send_event(socket, &ServerEvent::ack(action)).await
}

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(frame) => socket.send(Message::Text(frame.into())).await.is_ok(),
        Err(e) => {
            warn!("failed to serialize event: {e}");
            true
        }
    }
}
