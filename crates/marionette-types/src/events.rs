//! Outbound protocol events pushed to persistent-channel clients.
//!
//! The gateway owns the `connection` / `ack` / `error` envelope kinds;
//! `sync` events carry [`SyncMessage`] payloads produced by the model
//! managers' change monitors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Milliseconds since the Unix epoch, as stamped on outbound events.
pub fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// An outbound message on the persistent channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// Connection acknowledgment, sent once when a client connects.
    Connection {
        /// Always `"connected"`.
        status: String,
        /// Human-readable greeting.
        message: String,
        /// Event timestamp (Unix milliseconds).
        timestamp: i64,
    },

    /// Command acknowledgment: the envelope was accepted for processing.
    ///
    /// This is sent before the router's side effects complete; it means
    /// "accepted", not "applied".
    Ack {
        /// The acknowledged action.
        action: String,
        /// Event timestamp (Unix milliseconds).
        timestamp: i64,
    },

    /// A protocol-level error on this connection.
    Error {
        /// Human-readable description.
        message: String,
        /// Underlying parse error detail, when available.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// A state-sync broadcast produced by a change monitor.
    Sync {
        /// The sync payload.
        #[serde(flatten)]
        message: SyncMessage,
    },
}

impl ServerEvent {
    /// The connection acknowledgment sent to every new client.
    pub fn connected() -> Self {
        Self::Connection {
            status: "connected".to_owned(),
            message: "Connected to Marionette API".to_owned(),
            timestamp: timestamp_ms(),
        }
    }

    /// A command acknowledgment for the given action.
    pub fn ack(action: impl Into<String>) -> Self {
        Self::Ack {
            action: action.into(),
            timestamp: timestamp_ms(),
        }
    }

    /// A protocol error event with optional detail.
    pub fn error(message: impl Into<String>, error: Option<String>) -> Self {
        Self::Error {
            message: message.into(),
            error,
        }
    }
}

/// A state change detected by a monitor and pushed to observers.
///
/// Channel names mirror the `manager:*` vocabulary the operator UI
/// listens on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "channel", content = "data", rename_all = "kebab-case")]
#[serde(rename_all_fields = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum SyncMessage {
    /// Periodic sequence playback state (index, time, playing).
    SequenceState {
        /// Active sequence index, `None` when idle.
        index: Option<usize>,
        /// Current playback time in seconds.
        time: f64,
        /// Whether the sequencer is advancing.
        playing: bool,
    },

    /// A sequence started playing.
    SequenceStarted {
        /// The resolved sequence index.
        index: usize,
        /// The sequence name, when the asset provides one.
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// A non-looping sequence reached its duration and stopped.
    SequenceFinished {
        /// The finished sequence index.
        index: usize,
    },

    /// One or more bodygroup values changed.
    BodygroupChanged {
        /// The full bodygroup map after the change.
        values: BTreeMap<usize, u32>,
    },

    /// The skin/texture variant changed.
    SkinChanged {
        /// The new skin index.
        index: usize,
    },

    /// The gaze offset moved beyond the sync threshold.
    FocusChanged {
        /// Horizontal gaze offset.
        x: f64,
        /// Vertical gaze offset.
        y: f64,
    },

    /// The orbit camera moved beyond the sync threshold.
    CameraChanged {
        /// Camera yaw in radians.
        yaw: f64,
        /// Camera pitch in radians.
        pitch: f64,
        /// Camera distance from the target.
        distance: f64,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ack_event_shape() {
        let event = ServerEvent::ack("setParameter");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json.get("type").and_then(serde_json::Value::as_str),
            Some("ack")
        );
        assert_eq!(
            json.get("action").and_then(serde_json::Value::as_str),
            Some("setParameter")
        );
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn error_event_omits_absent_detail() {
        let event = ServerEvent::error("Invalid JSON format", None);
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("error").is_none());
    }

    #[test]
    fn sync_event_flattens_channel() {
        let event = ServerEvent::Sync {
            message: SyncMessage::SkinChanged { index: 2 },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json.get("type").and_then(serde_json::Value::as_str),
            Some("sync")
        );
        assert_eq!(
            json.get("channel").and_then(serde_json::Value::as_str),
            Some("skin-changed")
        );
        assert_eq!(
            json.pointer("/data/index").and_then(serde_json::Value::as_u64),
            Some(2)
        );
    }
}
