//! Shared gateway state: the client registry and the command channel.
//!
//! The gateway never touches model state. Inbound envelopes are pushed
//! into a bounded [`mpsc`] channel the host drains once per tick;
//! outbound [`ServerEvent`]s are serialized once and fanned out to every
//! registered persistent-channel client.

use std::collections::BTreeMap;
use std::sync::Arc;

use marionette_types::{CommandEnvelope, CommandResult, ServerEvent};
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::debug;
use uuid::Uuid;

use crate::error::GatewayError;

/// Capacity of the inbound command channel.
///
/// When the host falls behind, senders wait rather than queueing
/// unboundedly.
const COMMAND_QUEUE_CAPACITY: usize = 256;

/// One command on its way to the host.
#[derive(Debug)]
pub struct ApiCommand {
    /// The parsed request envelope.
    pub envelope: CommandEnvelope,
    /// Where to send the routing result. `None` for persistent-channel
    /// clients, which get an ack instead and observe effects via sync
    /// events.
    pub reply: Option<oneshot::Sender<CommandResult>>,
}

/// Shared state for both gateway servers.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct GatewayState {
    commands: mpsc::Sender<ApiCommand>,
    clients: RwLock<BTreeMap<Uuid, mpsc::UnboundedSender<String>>>,
}

impl GatewayState {
    /// Create the gateway state plus the receiving end of the command
    /// channel the host drains.
    pub fn channel() -> (Arc<Self>, mpsc::Receiver<ApiCommand>) {
        let (commands, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let state = Arc::new(Self {
            commands,
            clients: RwLock::new(BTreeMap::new()),
        });
        (state, rx)
    }

    /// Register a persistent-channel client, returning its id and the
    /// receiver its socket task drains.
    pub async fn register(&self) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.write().await.insert(id, tx);
        debug!(client = %id, "client registered");
        (id, rx)
    }

    /// Drop a client from the registry.
    pub async fn deregister(&self, id: Uuid) {
        self.clients.write().await.remove(&id);
        debug!(client = %id, "client deregistered");
    }

    /// Number of currently registered clients.
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Forward a command to the host.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ChannelClosed`] when the host has shut
    /// down its receiving end.
    pub async fn submit(
        &self,
        envelope: CommandEnvelope,
        reply: Option<oneshot::Sender<CommandResult>>,
    ) -> Result<(), GatewayError> {
        self.commands
            .send(ApiCommand { envelope, reply })
            .await
            .map_err(|_| GatewayError::ChannelClosed)
    }

    /// Serialize an event once and push it to every registered client.
    ///
    /// Clients whose socket task has gone away are pruned. Returns the
    /// number of clients the event was queued for.
    pub async fn broadcast(&self, event: &ServerEvent) -> Result<usize, GatewayError> {
        let frame = serde_json::to_string(event)?;

        let mut clients = self.clients.write().await;
        let before = clients.len();
        clients.retain(|_, tx| tx.send(frame.clone()).is_ok());
        let delivered = clients.len();
        if delivered < before {
            debug!(pruned = before.saturating_sub(delivered), "pruned dead clients");
        }
        Ok(delivered)
    }

    /// Push an event to a single client.
    pub async fn send_to(&self, id: Uuid, event: &ServerEvent) -> Result<bool, GatewayError> {
        let frame = serde_json::to_string(event)?;
        let clients = self.clients.read().await;
        Ok(clients.get(&id).is_some_and(|tx| tx.send(frame).is_ok()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_all_clients() {
        let (state, _rx) = GatewayState::channel();
        let (_id_a, mut rx_a) = state.register().await;
        let (_id_b, mut rx_b) = state.register().await;

        let delivered = state.broadcast(&ServerEvent::connected()).await.unwrap();
        assert_eq!(delivered, 2);
        assert!(rx_a.recv().await.unwrap().contains("connected"));
        assert!(rx_b.recv().await.unwrap().contains("connected"));
    }

    #[tokio::test]
    async fn broadcast_prunes_dropped_clients() {
        let (state, _rx) = GatewayState::channel();
        let (_id_a, rx_a) = state.register().await;
        let (_id_b, _rx_b) = state.register().await;
        drop(rx_a);

        let delivered = state.broadcast(&ServerEvent::connected()).await.unwrap();
        assert_eq!(delivered, 1);
        assert_eq!(state.client_count().await, 1);
    }

    #[tokio::test]
    async fn deregister_removes_client() {
        let (state, _rx) = GatewayState::channel();
        let (id, _client_rx) = state.register().await;
        assert_eq!(state.client_count().await, 1);
        state.deregister(id).await;
        assert_eq!(state.client_count().await, 0);
    }

    #[tokio::test]
    async fn submit_delivers_to_host() {
        let (state, mut rx) = GatewayState::channel();
        state
            .submit(CommandEnvelope::new("stopMotion"), None)
            .await
            .unwrap();
        let command = rx.recv().await.unwrap();
        assert_eq!(command.envelope.action, "stopMotion");
    }

    #[tokio::test]
    async fn submit_fails_when_host_gone() {
        let (state, rx) = GatewayState::channel();
        drop(rx);
        let result = state.submit(CommandEnvelope::new("stopMotion"), None).await;
        assert!(matches!(result, Err(GatewayError::ChannelClosed)));
    }
}
