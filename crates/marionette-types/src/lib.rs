//! Shared type definitions for the Marionette control plane.
//!
//! This crate is the single source of truth for the types exchanged
//! between the API gateway, the command router, and the model managers.
//! Types defined here flow downstream to `TypeScript` via `ts-rs` for the
//! operator dashboard.
//!
//! # Modules
//!
//! - [`command`] -- external command envelopes and structured results
//! - [`control`] -- internal backend-agnostic control messages
//! - [`events`] -- outbound protocol events (connection, ack, error, sync)

pub mod command;
pub mod control;
pub mod events;

// Re-export all public types at crate root for convenience.
pub use command::{CommandEnvelope, CommandResult};
pub use control::{
    ConfigValue, ControlMessage, InstantConfigKey, MotionRequest, SequenceSelector,
    STOP_MOTION_GROUP,
};
pub use events::{ServerEvent, SyncMessage, timestamp_ms};
