//! Command routing for the Marionette control plane.
//!
//! The router is the single write path from external callers to model
//! state: the gateway hands it a parsed [`CommandEnvelope`] and the
//! session, and gets back a [`CommandResult`] to surface verbatim.
//! Validation is all-or-nothing per command, so callers never observe a
//! half-applied batch.
//!
//! [`CommandEnvelope`]: marionette_types::CommandEnvelope
//! [`CommandResult`]: marionette_types::CommandResult

mod extract;
pub mod router;

pub use router::{MODEL_UNAVAILABLE, UNKNOWN_ACTION, route};
