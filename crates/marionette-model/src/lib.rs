//! Model managers, animation sequencing, and change detection for the
//! Marionette control plane.
//!
//! This crate owns the live scene state for whichever rendering backend
//! is active and applies backend-agnostic control messages to it. The
//! actual GPU rendering and binary model parsing live behind the narrow
//! [`AssetSource`] seam; everything here is synchronous, bounded-time
//! state mutation driven by the host tick loop.
//!
//! # Modules
//!
//! - [`asset`] -- model descriptors, parsed asset payloads, and the
//!   loader seam
//! - [`instant`] -- the typed instant-configuration surface
//! - [`monitor`] -- change detectors that decide what state to push out
//! - [`sequencer`] -- the Idle/Playing sequence state machine
//! - [`manager`] -- the capability-tagged model manager and its backends
//! - [`session`] -- inbox, load exclusivity, and manager lifecycle
//!
//! [`AssetSource`]: asset::AssetSource

pub mod asset;
pub mod error;
pub mod instant;
pub mod manager;
pub mod mesh;
pub mod monitor;
pub mod puppet;
pub mod sequencer;
pub mod session;
pub mod skeletal;

// Re-export primary types for convenience.
pub use asset::{
    AssetSource, ModelAsset, ModelControlInfo, ModelDescriptor, ModelKind, SceneHandle,
    SequenceInfo,
};
pub use error::ModelError;
pub use instant::InstantConfig;
pub use manager::ModelManager;
pub use monitor::{BodygroupMonitor, DeltaMonitor, SequenceMonitor, SkinMonitor, ValueMonitor};
pub use sequencer::{Sequencer, SequencerNotice};
pub use session::{LoadOutcome, ModelSession};
