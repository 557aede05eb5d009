//! External API gateway for the Marionette control plane.
//!
//! Two channels expose the same command vocabulary:
//!
//! - the **persistent channel**, a `WebSocket` endpoint where commands
//!   are acked immediately and state changes stream back as sync
//!   events, and
//! - the **request channel**, a plain HTTP endpoint that returns each
//!   command's routing result in the response body.
//!
//! The gateway owns no model state. It parses envelopes, forwards them
//! over a bounded channel the host drains on its tick loop, and fans
//! host-published events out to every connected client.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::GatewayError;
pub use server::{ApiConfig, start_servers};
pub use state::{ApiCommand, GatewayState};
