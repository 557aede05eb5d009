//! Manifest-backed asset source.
//!
//! The control plane does not parse binary model formats itself; the
//! rendering side exports a JSON manifest per model listing everything
//! addressable (parameters, motion groups, sequences, bodygroups,
//! skins, nodes). [`ManifestSource`] reads that manifest and hands the
//! control-plane view back through the [`AssetSource`] seam.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use marionette_model::asset::{
    AssetSource, ModelAsset, ModelDescriptor, SceneHandle, SequenceInfo,
};
use marionette_model::error::ModelError;
use serde::Deserialize;
use tracing::debug;

/// JSON manifest shape exported alongside each model.
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    parameters: Vec<String>,
    #[serde(default)]
    parts: Vec<String>,
    #[serde(default)]
    motions: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    sequences: Vec<SequenceInfo>,
    #[serde(default)]
    bodygroups: Vec<String>,
    #[serde(default, rename = "skinCount")]
    skin_count: usize,
    #[serde(default)]
    nodes: Vec<String>,
}

/// Loads model manifests from a root directory.
#[derive(Debug)]
pub struct ManifestSource {
    root: PathBuf,
    next_scene: AtomicU64,
}

impl ManifestSource {
    /// Create a source resolving relative paths against `root`.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            next_scene: AtomicU64::new(1),
        }
    }

    fn resolve(&self, entrance: &Path) -> PathBuf {
        if entrance.is_absolute() {
            entrance.to_path_buf()
        } else {
            self.root.join(entrance)
        }
    }
}

impl AssetSource for ManifestSource {
    fn load(&self, descriptor: &ModelDescriptor) -> Result<ModelAsset, ModelError> {
        if descriptor.entrance_file.as_os_str().is_empty() {
            return Err(ModelError::InvalidDescriptor {
                reason: String::from("entranceFile is empty"),
            });
        }

        let path = self.resolve(&descriptor.entrance_file);
        debug!(path = %path.display(), "reading model manifest");

        let contents = std::fs::read_to_string(&path)
            .map_err(|e| ModelError::load(format!("{}: {e}", path.display())))?;
        let manifest = parse_manifest(&contents)
            .map_err(|e| ModelError::load(format!("{}: {e}", path.display())))?;

        let scene = SceneHandle::new(self.next_scene.fetch_add(1, Ordering::Relaxed));
        Ok(ModelAsset {
            scene,
            parameters: manifest.parameters,
            parts: manifest.parts,
            motions: manifest.motions,
            sequences: manifest.sequences,
            bodygroups: manifest.bodygroups,
            skin_count: manifest.skin_count,
            nodes: manifest.nodes,
        })
    }
}

fn parse_manifest(contents: &str) -> Result<Manifest, serde_json::Error> {
    serde_json::from_str(contents)
}
