//! Host binary for the Marionette control plane.
//!
//! Wires the external API gateway to the model session and runs the
//! tick loop until terminated.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `marionette-config.yaml`
//! 3. Create the gateway state and command channel
//! 4. Bind the persistent and request channels
//! 5. Run the tick loop

mod config;
mod error;
mod loader;
mod runner;

use std::path::Path;
use std::sync::Arc;

use marionette_gateway::server::ApiConfig;
use marionette_gateway::state::GatewayState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::HostConfig;
use crate::error::HostError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error when configuration parsing fails. Gateway bind
/// failures are not fatal: the tick loop runs either way.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("marionette-host starting");

    let config = load_config()?;
    info!(
        api_enabled = config.api.enabled,
        persistent_port = config.api.persistent_port,
        request_port = config.api.request_port,
        tick_rate_hz = config.display.tick_rate_hz,
        models_root = %config.models.root.display(),
        "Configuration loaded"
    );

    let (gateway, commands) = GatewayState::channel();
    start_gateway(&config.api, Arc::clone(&gateway)).await;

    runner::run_loop(&config, gateway, commands).await?;

    info!("marionette-host shutdown complete");
    Ok(())
}

/// Start the gateway listeners.
///
/// A gateway that cannot bind any listener stops only the API surface:
/// the host logs the failure and keeps the tick loop and session alive.
async fn start_gateway(config: &ApiConfig, gateway: Arc<GatewayState>) {
    if let Err(e) = marionette_gateway::start_servers(config, gateway).await {
        error!("external API unavailable, continuing without it: {e}");
    }
}

/// Load the host configuration from `marionette-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<HostConfig, HostError> {
    let config_path = Path::new("marionette-config.yaml");
    if config_path.exists() {
        HostConfig::from_file(config_path)
    } else {
        info!("Config file not found, using defaults");
        Ok(HostConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn double_bind_failure_keeps_the_host_alive() {
        // Occupy both ports so neither gateway listener can bind.
        let taken_a = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let taken_b = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ApiConfig {
            enabled: true,
            host: String::from("127.0.0.1"),
            persistent_port: taken_a.local_addr().unwrap().port(),
            request_port: taken_b.local_addr().unwrap().port(),
        };

        // Returns instead of propagating, so the tick loop still runs.
        let (gateway, _commands) = GatewayState::channel();
        start_gateway(&config, gateway).await;
    }
}
