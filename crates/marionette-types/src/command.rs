//! External command envelopes and the structured results returned to
//! callers.
//!
//! A [`CommandEnvelope`] is the request-scoped unit the gateway parses
//! from an inbound frame or HTTP body. It is immutable once received:
//! the router reads it, produces control messages, and discards it.
//!
//! A [`CommandResult`] is surfaced to external callers verbatim. Success
//! results echo the action and the effective values applied, because
//! external controllers do not necessarily keep a state mirror of their
//! own.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// External `{action, data}` request unit.
///
/// `action` selects a handler in the command router; unknown actions are
/// rejected, never silently ignored. `data` carries the handler-specific
/// fields and defaults to an empty mapping when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// The handler selector, e.g. `"setParameter"`.
    pub action: String,

    /// Handler-specific payload fields.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl CommandEnvelope {
    /// Create an envelope with an empty data mapping.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            data: Map::new(),
        }
    }

    /// Create an envelope with the given data mapping.
    pub fn with_data(action: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            action: action.into(),
            data,
        }
    }
}

/// Structured result of routing one command.
///
/// Serializes as `{"success": true, "action": ..., ...echoed fields}` on
/// success or `{"success": false, "error": ...}` on failure, matching the
/// wire contract expected by external controllers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandResult {
    /// The command was accepted; echoed fields describe the applied values.
    Success {
        /// Always `true`.
        success: bool,
        /// The action that was handled.
        action: String,
        /// Effective values applied, echoed back to the caller.
        #[serde(flatten)]
        details: Map<String, Value>,
    },

    /// The command was rejected and produced no side effects.
    Failure {
        /// Always `false`.
        success: bool,
        /// Human-readable description of the rejection.
        error: String,
    },
}

impl CommandResult {
    /// Build a success result echoing the action with no extra fields.
    pub fn ok(action: impl Into<String>) -> Self {
        Self::Success {
            success: true,
            action: action.into(),
            details: Map::new(),
        }
    }

    /// Build a success result echoing the action and the given fields.
    pub fn ok_with(action: impl Into<String>, details: Map<String, Value>) -> Self {
        Self::Success {
            success: true,
            action: action.into(),
            details,
        }
    }

    /// Build a failure result with a descriptive message.
    pub fn fail(error: impl Into<String>) -> Self {
        Self::Failure {
            success: false,
            error: error.into(),
        }
    }

    /// Whether this result reports success.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The failure message, if this result is a failure.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failure { error, .. } => Some(error),
            Self::Success { .. } => None,
        }
    }
}
