//! The generic-mesh backend.
//!
//! A plain 3D scene without a rig: no parameters, no motions, no
//! sequences. What remains controllable is the orbit camera and the
//! gaze-driven head node, so this backend accepts only camera, focus,
//! and instant-config messages and silently ignores everything else.

use marionette_types::{ControlMessage, InstantConfigKey, SyncMessage};
use tracing::debug;

use crate::asset::{ModelAsset, ModelControlInfo, SceneHandle};
use crate::instant::InstantConfig;
use crate::manager::Gaze;
use crate::monitor::DeltaMonitor;

/// The orbit camera framing the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Horizontal orbit angle in radians.
    pub yaw: f64,
    /// Vertical orbit angle in radians.
    pub pitch: f64,
    /// Distance from the orbit target.
    pub distance: f64,
}

impl OrbitCamera {
    /// The default framing: straight on, a few units back.
    pub const fn home() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: 3.0,
        }
    }

    const fn as_array(&self) -> [f64; 3] {
        [self.yaw, self.pitch, self.distance]
    }
}

/// A loaded generic 3D mesh.
#[derive(Debug)]
pub struct MeshModel {
    scene: Option<SceneHandle>,
    info: ModelControlInfo,
    camera: OrbitCamera,
    config: InstantConfig,
    gaze: Gaze,
    camera_monitor: DeltaMonitor<3>,
    focus_monitor: DeltaMonitor<2>,
}

impl MeshModel {
    /// Build the backend from a parsed asset.
    pub fn new(name: &str, asset: ModelAsset) -> Self {
        let mut info = ModelControlInfo {
            nodes: asset.nodes,
            ..ModelControlInfo::default()
        };
        info.describe("name", name);
        info.describe("model-type", "Mesh");
        info.describe("nodes", info.nodes.len());

        let camera = OrbitCamera::home();
        Self {
            scene: Some(asset.scene),
            info,
            camera_monitor: DeltaMonitor::new(camera.as_array()),
            camera,
            config: InstantConfig::mesh(),
            gaze: Gaze::neutral(),
            focus_monitor: DeltaMonitor::new([0.0, 0.0]),
        }
    }

    /// The control surface summary built at load time.
    pub const fn control_info(&self) -> &ModelControlInfo {
        &self.info
    }

    /// The current orbit-camera framing.
    pub const fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// The instant-configuration surface.
    pub const fn config(&self) -> &InstantConfig {
        &self.config
    }

    /// Apply one control message. Parameter, motion, sequence,
    /// bodygroup, and skin channels have no meaning here and are
    /// ignored.
    pub fn handle_message(&mut self, message: &ControlMessage) {
        match message {
            ControlMessage::SetCamera {
                yaw,
                pitch,
                distance,
            } => {
                self.camera = OrbitCamera {
                    yaw: *yaw,
                    pitch: *pitch,
                    distance: distance.max(0.0),
                };
            }
            ControlMessage::SetFocus { x, y } => self.gaze.set_target(*x, *y),
            ControlMessage::ChangeInstantConfig { name, value } => {
                if self.config.set(*name, *value)
                    && *name == InstantConfigKey::TrackMouse
                    && !self.config.track_mouse
                {
                    self.gaze.reset();
                }
            }
            _ => debug!(?message, "channel not supported by mesh backend"),
        }
    }

    /// Advance the gaze interpolation.
    pub fn tick(&mut self, delta: f64) {
        self.gaze.tick(delta);
    }

    /// Run the camera and focus monitors.
    pub fn poll_updates(&mut self) -> Vec<SyncMessage> {
        let mut updates = Vec::new();
        if self.camera_monitor.check_update(&self.camera.as_array()) {
            updates.push(SyncMessage::CameraChanged {
                yaw: self.camera.yaw,
                pitch: self.camera.pitch,
                distance: self.camera.distance,
            });
        }
        let current = self.gaze.current();
        if self.focus_monitor.check_update(&current) {
            let [x, y] = current;
            updates.push(SyncMessage::FocusChanged { x, y });
        }
        updates
    }

    /// Release the scene handle and reset all sub-state.
    pub fn dispose(&mut self) {
        self.scene = None;
        self.camera = OrbitCamera::home();
        self.gaze.reset();
        self.camera_monitor.reset(self.camera.as_array());
        self.focus_monitor.reset([0.0, 0.0]);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use marionette_types::{ConfigValue, MotionRequest};

    fn asset() -> ModelAsset {
        ModelAsset {
            scene: SceneHandle::new(7),
            parameters: Vec::new(),
            parts: Vec::new(),
            motions: std::collections::BTreeMap::new(),
            sequences: Vec::new(),
            bodygroups: Vec::new(),
            skin_count: 0,
            nodes: vec!["Head".to_owned(), "Body".to_owned()],
        }
    }

    #[test]
    fn puppet_channels_are_ignored() {
        let mut mesh = MeshModel::new("statue", asset());
        mesh.handle_message(&ControlMessage::SetParameter {
            parameter_id: "Mouth".to_owned(),
            value: 1.0,
        });
        mesh.handle_message(&ControlMessage::PlayMotion {
            motion: MotionRequest::stop(),
        });
        assert!(mesh.poll_updates().is_empty());
    }

    #[test]
    fn focus_moves_gaze_and_reports() {
        let mut mesh = MeshModel::new("statue", asset());

        // Focus tracking works even though track_mouse defaults off:
        // explicit focus messages are always honored.
        mesh.handle_message(&ControlMessage::SetFocus { x: 0.8, y: -0.4 });
        mesh.tick(1.0);

        let updates = mesh.poll_updates();
        assert!(matches!(
            updates.as_slice(),
            [SyncMessage::FocusChanged { .. }]
        ));
        assert!(mesh.poll_updates().is_empty());
    }

    #[test]
    fn camera_reframe_reports_once() {
        let mut mesh = MeshModel::new("statue", asset());
        mesh.handle_message(&ControlMessage::SetCamera {
            yaw: 1.2,
            pitch: -0.3,
            distance: 5.0,
        });

        let updates = mesh.poll_updates();
        assert!(matches!(
            updates.as_slice(),
            [SyncMessage::CameraChanged { .. }]
        ));
        assert!((mesh.camera().yaw - 1.2).abs() < f64::EPSILON);
        assert!((mesh.camera().distance - 5.0).abs() < f64::EPSILON);
        assert!(mesh.poll_updates().is_empty());
    }

    #[test]
    fn camera_distance_clamps_at_zero() {
        let mut mesh = MeshModel::new("statue", asset());
        mesh.handle_message(&ControlMessage::SetCamera {
            yaw: 0.0,
            pitch: 0.0,
            distance: -2.0,
        });
        assert!(mesh.camera().distance.abs() < f64::EPSILON);
    }

    #[test]
    fn instant_config_toggles_apply() {
        let mut mesh = MeshModel::new("statue", asset());
        mesh.handle_message(&ControlMessage::ChangeInstantConfig {
            name: InstantConfigKey::TrackMouse,
            value: ConfigValue::Bool(true),
        });
        assert!(mesh.config().track_mouse);
    }
}
