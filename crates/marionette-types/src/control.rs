//! Internal backend-agnostic control messages.
//!
//! A [`ControlMessage`] is the instruction the command router produces
//! from a validated command envelope and the active model manager
//! consumes in `handle_message`. The closed enum decouples the external
//! command vocabulary from internal state mutation: the router never
//! needs to know which backend is active, and backends declare
//! unsupported channels as no-ops instead of errors.
//!
//! Wire names (`set-parameter`, `change-instant-config`, ...) match the
//! channel strings used by the operator UI.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Sentinel motion group meaning "stop the current motion".
pub const STOP_MOTION_GROUP: &str = "none";

/// A backend-agnostic instruction derived from a command envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "channel", content = "data", rename_all = "kebab-case")]
#[serde(rename_all_fields = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ControlMessage {
    /// Set a single model parameter to a value (puppet backend).
    SetParameter {
        /// The addressable parameter id, e.g. `"ParamMouthOpenY"`.
        parameter_id: String,
        /// The value to apply. Last write wins.
        value: f64,
    },

    /// Start, randomize, or stop a motion (puppet backend).
    PlayMotion {
        /// The requested motion.
        motion: MotionRequest,
    },

    /// Set the opacity of a named model part (puppet backend).
    SetPart {
        /// The addressable part id.
        part_id: String,
        /// Opacity value to apply.
        value: f64,
    },

    /// Apply a named expression (puppet backend).
    SetExpression {
        /// The expression name.
        expression: String,
    },

    /// Toggle or adjust a named instant-configuration slot (all backends).
    ChangeInstantConfig {
        /// Which slot to change.
        name: InstantConfigKey,
        /// The value to apply; type-checked against the slot.
        value: ConfigValue,
    },

    /// Set the gaze target in normalized coordinates (all backends).
    SetFocus {
        /// Horizontal target, -1.0 to 1.0.
        x: f64,
        /// Vertical target, -1.0 to 1.0.
        y: f64,
    },

    /// Reframe the orbit camera (mesh backend only).
    SetCamera {
        /// Horizontal orbit angle in radians.
        yaw: f64,
        /// Vertical orbit angle in radians.
        pitch: f64,
        /// Distance from the orbit target; negatives clamp to zero.
        distance: f64,
    },

    /// Start an animation sequence (skeletal backend only).
    PlaySequence {
        /// Index or name identifying the sequence.
        selector: SequenceSelector,
    },

    /// Stop the running animation sequence (skeletal backend only).
    StopSequence,

    /// Set a bodygroup value (skeletal backend only).
    SetBodygroup {
        /// The bodygroup index.
        index: usize,
        /// The submodel choice for that bodygroup.
        value: u32,
    },

    /// Switch the skin/texture variant (skeletal backend only).
    SetSkin {
        /// The skin index.
        index: usize,
    },
}

/// A motion playback request.
///
/// Three shapes funnel through this one struct: an explicit
/// `{group, index}` or `{group, file}` pick, a random pick
/// (`random: true`, optionally constrained to a group), and the stop
/// sentinel ([`STOP_MOTION_GROUP`]).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct MotionRequest {
    /// The motion group, `None` meaning "any group".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Index of the motion within its group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,

    /// Motion file name, as an alternative to an index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Whether the backend should pick a motion at random.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub random: bool,
}

impl MotionRequest {
    /// A request that stops the current motion.
    pub fn stop() -> Self {
        Self {
            group: Some(STOP_MOTION_GROUP.to_owned()),
            ..Self::default()
        }
    }

    /// A request for a random motion, optionally constrained to a group.
    pub fn random(group: Option<String>) -> Self {
        Self {
            group,
            random: true,
            ..Self::default()
        }
    }

    /// Whether this request is the stop sentinel.
    pub fn is_stop(&self) -> bool {
        self.group.as_deref() == Some(STOP_MOTION_GROUP)
    }
}

/// The closed set of instant-configuration slots.
///
/// Every boolean/numeric feature toggle a backend exposes is addressed
/// through one of these keys, so a single control-message shape covers
/// all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum InstantConfigKey {
    /// Follow the pointer with the model's gaze.
    TrackMouse,
    /// Simulated idle breathing.
    AutoBreath,
    /// Simulated periodic eye blinking.
    AutoEyeBlink,
    /// Sequence playback speed multiplier (1.0 = normal).
    AnimationSpeed,
    /// Whether sequences wrap at the end of their duration.
    LoopAnimation,
}

/// A typed instant-configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export, export_to = "bindings/")]
pub enum ConfigValue {
    /// A boolean toggle.
    Bool(bool),
    /// A numeric setting.
    Number(f64),
}

impl ConfigValue {
    /// The boolean value, if this is a boolean.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Number(_) => None,
        }
    }

    /// The numeric value, if this is a number.
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(_) => None,
        }
    }
}

/// Identifies a sequence by index or by (case-insensitive) name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export, export_to = "bindings/")]
pub enum SequenceSelector {
    /// Zero-based index into the asset's sequence list.
    Index(usize),
    /// Sequence name, matched case-insensitively.
    Name(String),
}
