//! The host tick loop.
//!
//! One task owns the session and everything model-shaped. Each tick it
//! drains the gateway's command channel through the router, starts any
//! requested model load off-loop, applies queued control messages,
//! advances the active model by measured wall-clock delta, and
//! broadcasts whatever the monitors flagged.

use std::sync::Arc;
use std::time::Duration;

use marionette_gateway::state::{ApiCommand, GatewayState};
use marionette_model::asset::ModelControlInfo;
use marionette_model::error::ModelError;
use marionette_model::manager::ModelManager;
use marionette_model::session::{LoadOutcome, ModelSession};
use marionette_types::ServerEvent;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::HostConfig;
use crate::error::HostError;
use crate::loader::ManifestSource;

type LoadResult = Result<(ModelManager, ModelControlInfo), ModelError>;

/// Run the tick loop until Ctrl-C.
///
/// # Errors
///
/// Currently infallible at runtime; the `Result` return leaves room for
/// fatal loop errors without changing the call site.
pub async fn run_loop(
    config: &HostConfig,
    gateway: Arc<GatewayState>,
    mut commands: mpsc::Receiver<ApiCommand>,
) -> Result<(), HostError> {
    let source = Arc::new(ManifestSource::new(config.models.root.clone()));
    let mut session = ModelSession::new();
    let (load_tx, mut load_rx) = mpsc::unbounded_channel::<(u64, LoadResult)>();

    let tick_rate = config.display.tick_rate_hz.max(1);
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(tick_rate)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();

    info!(tick_rate_hz = tick_rate, "entering tick loop");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                drain_commands(&mut commands, &mut session);
                start_pending_load(&mut session, &source, &load_tx);

                session.drain();
                let now = Instant::now();
                let delta = now.duration_since(last_tick).as_secs_f64();
                last_tick = now;
                session.tick(delta);

                for message in session.poll_updates() {
                    if let Err(e) = gateway.broadcast(&ServerEvent::Sync { message }).await {
                        warn!("sync broadcast failed: {e}");
                    }
                }
            }
            completed = load_rx.recv() => {
                if let Some((generation, result)) = completed {
                    match session.complete_load(generation, result) {
                        LoadOutcome::Installed(info) => {
                            info!(
                                parameters = info.parameters.len(),
                                sequences = info.sequences.len(),
                                "model installed"
                            );
                        }
                        LoadOutcome::Stale => {}
                        LoadOutcome::Failed(error) => {
                            warn!(%error, "model load failed");
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    session.unload();
    Ok(())
}

/// Route every queued command, replying where a reply is expected.
fn drain_commands(commands: &mut mpsc::Receiver<ApiCommand>, session: &mut ModelSession) {
    while let Ok(command) = commands.try_recv() {
        let result = marionette_router::route(&command.envelope, session);
        if let Some(reply) = command.reply {
            // A dropped receiver just means the HTTP request timed out.
            let _ = reply.send(result);
        }
    }
}

/// Kick off a requested load on the blocking pool so manifest I/O never
/// stalls the tick.
fn start_pending_load(
    session: &mut ModelSession,
    source: &Arc<ManifestSource>,
    load_tx: &mpsc::UnboundedSender<(u64, LoadResult)>,
) {
    if let Some((generation, descriptor)) = session.take_load_request() {
        info!(name = %descriptor.name, "starting model load");
        let source = Arc::clone(source);
        let load_tx = load_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = ModelManager::load(source.as_ref(), &descriptor);
            let _ = load_tx.send((generation, result));
        });
    }
}
