//! Gateway server lifecycle management.
//!
//! The gateway runs two listeners: the persistent channel (`WebSocket`)
//! and the request channel (plain HTTP). A single failed bind degrades
//! to the surviving channel with an error log; only when every enabled
//! listener fails to bind does startup abort.

use std::net::SocketAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::GatewayError;
use crate::router::{build_persistent_router, build_request_router};
use crate::state::GatewayState;

/// Default persistent-channel port.
pub const DEFAULT_PERSISTENT_PORT: u16 = 8765;

/// Default request-channel port.
pub const DEFAULT_REQUEST_PORT: u16 = 8766;

/// Configuration for the external API gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Master switch; when false no listener binds.
    pub enabled: bool,
    /// Host address both listeners bind to.
    pub host: String,
    /// Port of the persistent (`WebSocket`) channel.
    pub persistent_port: u16,
    /// Port of the request (HTTP) channel.
    pub request_port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: String::from("127.0.0.1"),
            persistent_port: DEFAULT_PERSISTENT_PORT,
            request_port: DEFAULT_REQUEST_PORT,
        }
    }
}

/// Bind and serve both gateway channels in background tasks.
///
/// Returns after the listeners are bound; serving continues until the
/// process exits. With `enabled: false` this is a logged no-op.
///
/// # Errors
///
/// Returns [`GatewayError::Bind`] only when every listener fails to
/// bind; a single failure degrades to the surviving channel.
pub async fn start_servers(
    config: &ApiConfig,
    state: Arc<GatewayState>,
) -> Result<(), GatewayError> {
    if !config.enabled {
        info!("external API disabled, not binding");
        return Ok(());
    }

    let persistent = bind(&config.host, config.persistent_port).await;
    let request = bind(&config.host, config.request_port).await;

    if persistent.is_err() && request.is_err() {
        return Err(GatewayError::Bind(String::from(
            "no gateway listener could bind",
        )));
    }

    match persistent {
        Ok(listener) => {
            info!(port = config.persistent_port, "persistent channel listening");
            let router = build_persistent_router(Arc::clone(&state));
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, router).await {
                    error!("persistent channel server failed: {e}");
                }
            });
        }
        Err(e) => error!("persistent channel bind failed, continuing without it: {e}"),
    }

    match request {
        Ok(listener) => {
            info!(port = config.request_port, "request channel listening");
            let router = build_request_router(state);
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, router).await {
                    error!("request channel server failed: {e}");
                }
            });
        }
        Err(e) => error!("request channel bind failed, continuing without it: {e}"),
    }

    Ok(())
}

async fn bind(host: &str, port: u16) -> Result<TcpListener, GatewayError> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| GatewayError::Bind(format!("invalid address: {e}")))?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| GatewayError::Bind(format!("bind failed on {addr}: {e}")))
}
