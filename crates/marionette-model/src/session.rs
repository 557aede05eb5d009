//! The single-slot model session.
//!
//! One session holds at most one active manager, a bounded inbox of
//! control messages waiting for the next tick, and the bookkeeping for
//! asynchronous loads. Loads are generation-stamped so that when several
//! are requested in quick succession, only the most recent one can
//! install; earlier completions are discarded even if they finish later.

use std::collections::VecDeque;

use marionette_types::{ControlMessage, SyncMessage};
use tracing::{debug, info, warn};

use crate::asset::{ModelControlInfo, ModelDescriptor};
use crate::error::ModelError;
use crate::manager::ModelManager;

/// Maximum number of control messages queued between ticks.
///
/// When the inbox is full the oldest message is dropped, so a stalled
/// tick loop sheds backlog instead of growing without bound.
pub const INBOX_CAPACITY: usize = 64;

/// What became of one completed load.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The model was installed as the active manager.
    Installed(ModelControlInfo),
    /// A newer load superseded this one; the result was discarded.
    Stale,
    /// The load failed; any previously active model is untouched.
    Failed(ModelError),
}

/// The active model slot plus its message inbox and load bookkeeping.
#[derive(Debug, Default)]
pub struct ModelSession {
    manager: Option<ModelManager>,
    inbox: VecDeque<ControlMessage>,
    next_generation: u64,
    current_generation: Option<u64>,
    requested: Option<ModelDescriptor>,
}

impl ModelSession {
    /// An empty session with no model and nothing queued.
    pub const fn new() -> Self {
        Self {
            manager: None,
            inbox: VecDeque::new(),
            next_generation: 0,
            current_generation: None,
            requested: None,
        }
    }

    /// Whether a model is currently active.
    pub const fn is_active(&self) -> bool {
        self.manager.is_some()
    }

    /// The active manager, if any.
    pub const fn manager(&self) -> Option<&ModelManager> {
        self.manager.as_ref()
    }

    /// Control info of the active model, if any.
    pub const fn control_info(&self) -> Option<&ModelControlInfo> {
        match &self.manager {
            Some(manager) => Some(manager.control_info()),
            None => None,
        }
    }

    /// Queue a control message for the next tick.
    ///
    /// The inbox is bounded by [`INBOX_CAPACITY`]; overflow drops the
    /// oldest queued message with a warning.
    pub fn enqueue(&mut self, message: ControlMessage) {
        if self.inbox.len() >= INBOX_CAPACITY {
            self.inbox.pop_front();
            warn!("control inbox full, dropping oldest message");
        }
        self.inbox.push_back(message);
    }

    /// Request a model load, superseding any not-yet-started request.
    pub fn request_load(&mut self, descriptor: ModelDescriptor) {
        if self.requested.is_some() {
            debug!("superseding pending load request");
        }
        self.requested = Some(descriptor);
    }

    /// Take the pending load request, stamping it with a fresh
    /// generation. The host hands the descriptor to the asset pipeline
    /// and feeds the result back through [`Self::complete_load`].
    pub fn take_load_request(&mut self) -> Option<(u64, ModelDescriptor)> {
        let descriptor = self.requested.take()?;
        self.next_generation = self.next_generation.wrapping_add(1);
        self.current_generation = Some(self.next_generation);
        Some((self.next_generation, descriptor))
    }

    /// Feed a finished load back into the session.
    ///
    /// A result whose generation is not the most recently issued one is
    /// discarded as [`LoadOutcome::Stale`]. A failure keeps whatever
    /// model was active before. A success disposes the previous model,
    /// clears the inbox of messages addressed to it, and installs the
    /// new manager.
    pub fn complete_load(
        &mut self,
        generation: u64,
        result: Result<(ModelManager, ModelControlInfo), ModelError>,
    ) -> LoadOutcome {
        if self.current_generation != Some(generation) {
            debug!(generation, "discarding stale load result");
            return LoadOutcome::Stale;
        }
        self.current_generation = None;

        match result {
            Ok((manager, control_info)) => {
                if let Some(mut previous) = self.manager.replace(manager) {
                    previous.dispose();
                }
                self.inbox.clear();
                info!(kind = ?self.manager.as_ref().map(ModelManager::kind), "model installed");
                LoadOutcome::Installed(control_info)
            }
            Err(error) => {
                warn!(%error, "model load failed, keeping previous model");
                LoadOutcome::Failed(error)
            }
        }
    }

    /// Apply every queued message to the active manager, in order.
    ///
    /// With no active manager the inbox is discarded.
    pub fn drain(&mut self) {
        if let Some(manager) = &mut self.manager {
            while let Some(message) = self.inbox.pop_front() {
                manager.handle_message(&message);
            }
        } else if !self.inbox.is_empty() {
            debug!(count = self.inbox.len(), "no active model, dropping inbox");
            self.inbox.clear();
        }
    }

    /// Advance the active model by `delta` seconds.
    pub fn tick(&mut self, delta: f64) {
        if let Some(manager) = &mut self.manager {
            manager.tick(delta);
        }
    }

    /// Run the active model's monitors once.
    pub fn poll_updates(&mut self) -> Vec<SyncMessage> {
        self.manager
            .as_mut()
            .map_or_else(Vec::new, ModelManager::poll_updates)
    }

    /// Dispose the active model and cancel any in-flight load.
    pub fn unload(&mut self) {
        if let Some(mut manager) = self.manager.take() {
            manager.dispose();
        }
        self.inbox.clear();
        self.requested = None;
        self.current_generation = None;
    }
}
