//! The polymorphic model manager.
//!
//! One capability-tagged enum replaces the original inheritance
//! hierarchy: every backend answers the same four operations
//! (`load`, `handle_message`, `tick`, `dispose`) and declares
//! unsupported control channels as no-ops instead of inheriting empty
//! methods. The active manager exclusively owns its scene handle; the
//! router and gateway reach it only through control messages.

use marionette_types::{ControlMessage, SyncMessage};
use tracing::info;

use crate::asset::{AssetSource, ModelControlInfo, ModelDescriptor, ModelKind};
use crate::error::ModelError;
use crate::mesh::MeshModel;
use crate::puppet::PuppetModel;
use crate::skeletal::SkeletalModel;

/// How fast the gaze offset converges on its target, per second.
const GAZE_FOLLOW_RATE: f64 = 10.0;

/// A gaze offset interpolating toward a target point.
///
/// Shared by all backends: `setFocus` and mouse tracking both write the
/// target; `tick` eases the current offset toward it so the head never
/// snaps. Disabling mouse tracking resets both to neutral immediately
/// rather than leaving a stale pose.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Gaze {
    target: [f64; 2],
    current: [f64; 2],
}

impl Gaze {
    /// A neutral gaze looking straight ahead.
    pub const fn neutral() -> Self {
        Self {
            target: [0.0, 0.0],
            current: [0.0, 0.0],
        }
    }

    /// Set the target point in normalized coordinates.
    pub fn set_target(&mut self, x: f64, y: f64) {
        self.target = [x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0)];
    }

    /// Snap both target and current offset back to neutral.
    pub const fn reset(&mut self) {
        self.target = [0.0, 0.0];
        self.current = [0.0, 0.0];
    }

    /// Ease the current offset toward the target.
    pub fn tick(&mut self, delta: f64) {
        let blend = (delta * GAZE_FOLLOW_RATE).min(1.0);
        self.current = [
            self.current[0] + (self.target[0] - self.current[0]) * blend,
            self.current[1] + (self.target[1] - self.current[1]) * blend,
        ];
    }

    /// The interpolated gaze offset.
    pub const fn current(&self) -> [f64; 2] {
        self.current
    }
}

/// The active model backend.
///
/// Variants share one contract: synchronous, bounded-time message
/// handling; per-tick advancement; monitor polling; and disposal that
/// releases the scene handle and resets all sub-state.
#[derive(Debug)]
pub enum ModelManager {
    /// 2D rigged puppet driven by a flat parameter map.
    Puppet(PuppetModel),
    /// Generic 3D mesh with orbit camera and gaze tracking.
    Mesh(MeshModel),
    /// 3D rigged mesh with skeletal sequences, bodygroups, and skins.
    Skeletal(SkeletalModel),
}

impl ModelManager {
    /// Load a model through the external asset seam and build the
    /// backend the descriptor's kind selects.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Load`] when the asset cannot be fetched or
    /// parsed; no manager state is installed in that case.
    pub fn load(
        source: &dyn AssetSource,
        descriptor: &ModelDescriptor,
    ) -> Result<(Self, ModelControlInfo), ModelError> {
        let asset = source.load(descriptor)?;
        info!(
            name = %descriptor.name,
            kind = ?descriptor.kind,
            scene = asset.scene.id(),
            "model loaded"
        );

        let manager = match descriptor.kind {
            ModelKind::Puppet => Self::Puppet(PuppetModel::new(&descriptor.name, asset)),
            ModelKind::Mesh => Self::Mesh(MeshModel::new(&descriptor.name, asset)),
            ModelKind::Skeletal => Self::Skeletal(SkeletalModel::new(&descriptor.name, asset)),
        };
        let info = manager.control_info().clone();
        Ok((manager, info))
    }

    /// The backend kind of this manager.
    pub const fn kind(&self) -> ModelKind {
        match self {
            Self::Puppet(_) => ModelKind::Puppet,
            Self::Mesh(_) => ModelKind::Mesh,
            Self::Skeletal(_) => ModelKind::Skeletal,
        }
    }

    /// The control surface summary built at load time.
    pub const fn control_info(&self) -> &ModelControlInfo {
        match self {
            Self::Puppet(m) => m.control_info(),
            Self::Mesh(m) => m.control_info(),
            Self::Skeletal(m) => m.control_info(),
        }
    }

    /// Apply one control message to local state.
    ///
    /// Synchronous and non-blocking. Channels a variant does not support
    /// are silent no-ops, since external callers cannot always know
    /// which backend is active.
    pub fn handle_message(&mut self, message: &ControlMessage) {
        match self {
            Self::Puppet(m) => m.handle_message(message),
            Self::Mesh(m) => m.handle_message(message),
            Self::Skeletal(m) => m.handle_message(message),
        }
    }

    /// Advance per-frame state by `delta` seconds.
    pub fn tick(&mut self, delta: f64) {
        match self {
            Self::Puppet(m) => m.tick(delta),
            Self::Mesh(m) => m.tick(delta),
            Self::Skeletal(m) => m.tick(delta),
        }
    }

    /// Run every monitor once and collect the sync messages to push out.
    pub fn poll_updates(&mut self) -> Vec<SyncMessage> {
        match self {
            Self::Puppet(m) => m.poll_updates(),
            Self::Mesh(m) => m.poll_updates(),
            Self::Skeletal(m) => m.poll_updates(),
        }
    }

    /// Release the scene handle and reset all sub-state.
    pub fn dispose(&mut self) {
        match self {
            Self::Puppet(m) => m.dispose(),
            Self::Mesh(m) => m.dispose(),
            Self::Skeletal(m) => m.dispose(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn gaze_eases_toward_target() {
        let mut gaze = Gaze::neutral();
        gaze.set_target(1.0, 0.0);

        gaze.tick(0.05);
        let [x, _] = gaze.current();
        assert!(x > 0.0 && x < 1.0);

        // A long tick converges fully.
        gaze.tick(1.0);
        let [x, _] = gaze.current();
        assert!((x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn gaze_reset_is_immediate() {
        let mut gaze = Gaze::neutral();
        gaze.set_target(1.0, -1.0);
        gaze.tick(1.0);
        gaze.reset();
        assert_eq!(gaze.current(), [0.0, 0.0]);
    }

    #[test]
    fn gaze_target_is_clamped() {
        let mut gaze = Gaze::neutral();
        gaze.set_target(5.0, -5.0);
        gaze.tick(1.0);
        let [x, y] = gaze.current();
        assert!((x - 1.0).abs() < 1e-9);
        assert!((y + 1.0).abs() < 1e-9);
    }
}
