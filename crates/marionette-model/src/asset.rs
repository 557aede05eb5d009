//! Model descriptors, parsed asset payloads, and the loader seam.
//!
//! Binary model-format parsing and GPU scene-graph construction are
//! external collaborators. This module defines the narrow interface to
//! them: give an [`AssetSource`] a resolved [`ModelDescriptor`] and get
//! back a [`ModelAsset`] -- an opaque scene handle plus the lists of
//! addressable nodes and parameters the control plane needs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Frames per second assumed when a sequence does not declare a rate.
pub const DEFAULT_SEQUENCE_FPS: f64 = 30.0;

/// Which rendering backend a model targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// 2D rigged puppet driven by named parameters.
    Puppet,
    /// Generic 3D mesh with orbit camera and gaze tracking.
    Mesh,
    /// 3D rigged mesh with skeletal animation sequences.
    Skeletal,
}

/// Everything needed to resolve and load one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Display name of the model.
    pub name: String,

    /// Which backend should load this model.
    #[serde(rename = "modelType")]
    pub kind: ModelKind,

    /// Resolved path of the model's entrance file.
    #[serde(rename = "entranceFile")]
    pub entrance_file: PathBuf,
}

/// Opaque handle to a loaded scene.
///
/// Exclusively owned by the active model manager; the router and the
/// gateway never touch it. Dropping the handle releases the scene on the
/// rendering side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneHandle(u64);

impl SceneHandle {
    /// Wrap a renderer-assigned scene id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The renderer-assigned scene id.
    pub const fn id(&self) -> u64 {
        self.0
    }
}

/// Metadata for one skeletal animation sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceInfo {
    /// Sequence name, when the asset provides one.
    pub name: Option<String>,

    /// Number of frames in the clip.
    #[serde(rename = "frameCount")]
    pub frame_count: u32,

    /// Declared frame rate; `None` falls back to
    /// [`DEFAULT_SEQUENCE_FPS`].
    pub fps: Option<f64>,
}

impl SequenceInfo {
    /// Duration of the clip in seconds: `frame_count / fps`.
    ///
    /// A zero frame count is treated as one frame and a missing or
    /// non-positive rate as [`DEFAULT_SEQUENCE_FPS`], so the result is
    /// always positive.
    pub fn duration(&self) -> f64 {
        let frames = f64::from(self.frame_count.max(1));
        let fps = match self.fps {
            Some(fps) if fps > 0.0 => fps,
            _ => DEFAULT_SEQUENCE_FPS,
        };
        frames / fps
    }

    /// Display name, falling back to `Sequence {index}`.
    pub fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Sequence {index}"))
    }
}

/// The parsed result the external loader hands back for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    /// Handle to the constructed scene.
    pub scene: SceneHandle,

    /// Addressable parameter ids (puppet backend).
    pub parameters: Vec<String>,

    /// Addressable part ids (puppet backend).
    pub parts: Vec<String>,

    /// Motion files grouped by motion group name (puppet backend).
    pub motions: BTreeMap<String, Vec<String>>,

    /// Animation sequences (skeletal backend).
    pub sequences: Vec<SequenceInfo>,

    /// Bodygroup names (skeletal backend).
    pub bodygroups: Vec<String>,

    /// Number of skin/texture variants (skeletal backend).
    pub skin_count: usize,

    /// Addressable scene node names.
    pub nodes: Vec<String>,
}

/// Narrow seam to the external asset pipeline.
///
/// Implementations parse whatever on-disk format the descriptor points
/// at and return the control-plane view of it. Loading may be slow, so
/// the host always calls this off the tick loop.
pub trait AssetSource: Send + Sync {
    /// Load and parse the model the descriptor points at.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Load`] when the asset is missing or cannot
    /// be parsed. No partial state may be handed out on failure.
    fn load(&self, descriptor: &ModelDescriptor) -> Result<ModelAsset, ModelError>;
}

/// One label/value pair in a model's description block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionEntry {
    /// Entry label, e.g. `"model-type"`.
    pub label: String,
    /// Entry value, stringified for display.
    pub value: String,
}

/// The control surface summary returned by a successful load.
///
/// The operator UI renders this directly; external callers receive it as
/// the `loadModel` result payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelControlInfo {
    /// Label/value description entries.
    pub description: Vec<DescriptionEntry>,

    /// Addressable parameter ids.
    pub parameters: Vec<String>,

    /// Motion group names.
    #[serde(rename = "motionGroups")]
    pub motion_groups: Vec<String>,

    /// Sequence display names, in index order.
    pub sequences: Vec<String>,

    /// Bodygroup names, in index order.
    pub bodygroups: Vec<String>,

    /// Addressable scene node names.
    pub nodes: Vec<String>,
}

impl ModelControlInfo {
    /// Push one description entry.
    pub fn describe(&mut self, label: impl Into<String>, value: impl std::fmt::Display) {
        self.description.push(DescriptionEntry {
            label: label.into(),
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_uses_original_field_names() {
        let json = r#"{"name":"akari","modelType":"skeletal","entranceFile":"/models/akari.mdl"}"#;
        let descriptor: ModelDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.kind, ModelKind::Skeletal);
        assert_eq!(descriptor.name, "akari");
    }

    #[test]
    fn sequence_duration_defaults_fps_to_30() {
        let seq = SequenceInfo {
            name: Some("walk".to_owned()),
            frame_count: 60,
            fps: None,
        };
        assert!((seq.duration() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sequence_duration_never_zero() {
        let seq = SequenceInfo {
            name: None,
            frame_count: 0,
            fps: Some(0.0),
        };
        assert!(seq.duration() > 0.0);
    }

    #[test]
    fn display_name_falls_back_to_index() {
        let seq = SequenceInfo {
            name: None,
            frame_count: 10,
            fps: None,
        };
        assert_eq!(seq.display_name(3), "Sequence 3");
    }
}
