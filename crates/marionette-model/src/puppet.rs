//! The puppet-parameter backend.
//!
//! State is a flat mapping from parameter id to float. Parameters are
//! mutated directly by control messages (last write wins) and by the
//! per-tick idle simulation: auto-breath writes a sine wave into the
//! breath parameter, auto-blink closes the eye parameters on a
//! randomized interval, and the gaze offset drives the head angle
//! parameters.

use std::collections::BTreeMap;

use marionette_types::{ControlMessage, InstantConfigKey, MotionRequest, SyncMessage};
use rand::Rng;
use tracing::{debug, info};

use crate::asset::{ModelAsset, ModelControlInfo, SceneHandle};
use crate::instant::InstantConfig;
use crate::manager::Gaze;
use crate::monitor::DeltaMonitor;

/// Breath cycle length in seconds.
const BREATH_CYCLE: f64 = 3.2;

/// How long a blink keeps the eyes closed, in seconds.
const BLINK_DURATION: f64 = 0.12;

/// Bounds of the randomized interval between blinks, in seconds.
const BLINK_INTERVAL: std::ops::Range<f64> = 1.5..6.0;

/// Degrees of head rotation at full gaze deflection.
const GAZE_ANGLE_RANGE: f64 = 30.0;

/// Standard parameter ids written by the idle simulation.
const PARAM_BREATH: &str = "ParamBreath";
const PARAM_EYE_L_OPEN: &str = "ParamEyeLOpen";
const PARAM_EYE_R_OPEN: &str = "ParamEyeROpen";
const PARAM_ANGLE_X: &str = "ParamAngleX";
const PARAM_ANGLE_Y: &str = "ParamAngleY";

/// The motion currently playing, as far as the control plane tracks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveMotion {
    /// The motion group.
    pub group: String,
    /// The motion file within the group.
    pub file: Option<String>,
    /// The index within the group, when addressed by index.
    pub index: Option<u32>,
}

/// A loaded 2D rigged puppet.
#[derive(Debug)]
pub struct PuppetModel {
    scene: Option<SceneHandle>,
    info: ModelControlInfo,
    parameters: BTreeMap<String, f64>,
    parts: BTreeMap<String, f64>,
    motions: BTreeMap<String, Vec<String>>,
    active_motion: Option<ActiveMotion>,
    expression: Option<String>,
    config: InstantConfig,
    gaze: Gaze,
    focus_monitor: DeltaMonitor<2>,
    breath_phase: f64,
    blink_countdown: f64,
    blink_remaining: f64,
}

impl PuppetModel {
    /// Build the backend from a parsed asset.
    pub fn new(name: &str, asset: ModelAsset) -> Self {
        let mut info = ModelControlInfo {
            parameters: asset.parameters.clone(),
            motion_groups: asset.motions.keys().cloned().collect(),
            nodes: asset.nodes,
            ..ModelControlInfo::default()
        };
        info.describe("name", name);
        info.describe("model-type", "Puppet");
        info.describe("parameters", asset.parameters.len());
        info.describe("motion-groups", asset.motions.len());

        let parameters = asset
            .parameters
            .iter()
            .map(|id| (id.clone(), 0.0))
            .collect();
        let parts = asset.parts.iter().map(|id| (id.clone(), 1.0)).collect();

        Self {
            scene: Some(asset.scene),
            info,
            parameters,
            parts,
            motions: asset.motions,
            active_motion: None,
            expression: None,
            config: InstantConfig::puppet(),
            gaze: Gaze::neutral(),
            focus_monitor: DeltaMonitor::new([0.0, 0.0]),
            breath_phase: 0.0,
            blink_countdown: 2.0,
            blink_remaining: 0.0,
        }
    }

    /// The control surface summary built at load time.
    pub const fn control_info(&self) -> &ModelControlInfo {
        &self.info
    }

    /// Current value of a parameter, if present.
    pub fn parameter(&self, id: &str) -> Option<f64> {
        self.parameters.get(id).copied()
    }

    /// Current opacity of a part, if present.
    pub fn part(&self, id: &str) -> Option<f64> {
        self.parts.get(id).copied()
    }

    /// The motion currently playing, if any.
    pub const fn active_motion(&self) -> Option<&ActiveMotion> {
        self.active_motion.as_ref()
    }

    /// The instant-configuration surface.
    pub const fn config(&self) -> &InstantConfig {
        &self.config
    }

    /// Apply one control message. Sequence, bodygroup, skin, and camera
    /// channels are not a puppet concept and are ignored.
    pub fn handle_message(&mut self, message: &ControlMessage) {
        match message {
            ControlMessage::SetParameter {
                parameter_id,
                value,
            } => {
                self.parameters.insert(parameter_id.clone(), *value);
            }
            ControlMessage::SetPart { part_id, value } => {
                self.parts.insert(part_id.clone(), *value);
            }
            ControlMessage::SetExpression { expression } => {
                self.expression = Some(expression.clone());
            }
            ControlMessage::PlayMotion { motion } => self.play_motion(motion),
            ControlMessage::ChangeInstantConfig { name, value } => {
                if self.config.set(*name, *value)
                    && *name == InstantConfigKey::TrackMouse
                    && !self.config.track_mouse
                {
                    self.gaze.reset();
                }
            }
            ControlMessage::SetFocus { x, y } => self.gaze.set_target(*x, *y),
            ControlMessage::PlaySequence { .. }
            | ControlMessage::StopSequence
            | ControlMessage::SetBodygroup { .. }
            | ControlMessage::SetSkin { .. }
            | ControlMessage::SetCamera { .. } => {
                debug!(?message, "channel not supported by puppet backend");
            }
        }
    }

    /// Advance the idle simulation and gaze interpolation.
    pub fn tick(&mut self, delta: f64) {
        self.gaze.tick(delta);
        let [gx, gy] = self.gaze.current();
        self.parameters
            .insert(PARAM_ANGLE_X.to_owned(), gx * GAZE_ANGLE_RANGE);
        self.parameters
            .insert(PARAM_ANGLE_Y.to_owned(), gy * GAZE_ANGLE_RANGE);

        if self.config.auto_breath {
            self.breath_phase = (self.breath_phase + delta) % BREATH_CYCLE;
            let wave =
                ((self.breath_phase / BREATH_CYCLE * std::f64::consts::TAU).sin() + 1.0) / 2.0;
            self.parameters.insert(PARAM_BREATH.to_owned(), wave);
        }

        if self.config.auto_eye_blink {
            self.advance_blink(delta);
        }
    }

    /// Run the focus monitor and emit a sync message when the gaze moved
    /// past the threshold.
    pub fn poll_updates(&mut self) -> Vec<SyncMessage> {
        let current = self.gaze.current();
        if self.focus_monitor.check_update(&current) {
            let [x, y] = current;
            vec![SyncMessage::FocusChanged { x, y }]
        } else {
            Vec::new()
        }
    }

    /// Release the scene handle and reset all sub-state.
    pub fn dispose(&mut self) {
        self.scene = None;
        self.parameters.clear();
        self.parts.clear();
        self.active_motion = None;
        self.expression = None;
        self.gaze.reset();
        self.focus_monitor.reset([0.0, 0.0]);
    }

    fn play_motion(&mut self, motion: &MotionRequest) {
        if motion.is_stop() {
            self.active_motion = None;
            debug!("motion stopped");
            return;
        }

        if motion.random {
            self.play_random_motion(motion.group.as_deref());
            return;
        }

        let Some(group) = motion.group.clone() else {
            debug!("motion request without a group, ignoring");
            return;
        };
        info!(group = %group, "motion started");
        self.active_motion = Some(ActiveMotion {
            group,
            file: motion.file.clone(),
            index: motion.index,
        });
    }

    fn play_random_motion(&mut self, group: Option<&str>) {
        let mut rng = rand::rng();

        let group = match group {
            Some(g) => Some(g.to_owned()),
            // Any group: pick one uniformly.
            None => {
                let count = self.motions.len();
                if count == 0 {
                    debug!("no motion groups available for random pick");
                    return;
                }
                let pick = rng.random_range(0..count);
                self.motions.keys().nth(pick).cloned()
            }
        };

        let Some(group) = group else { return };
        let Some(files) = self.motions.get(&group) else {
            debug!(group = %group, "unknown motion group for random pick");
            return;
        };
        if files.is_empty() {
            debug!(group = %group, "motion group is empty");
            return;
        }

        let pick = rng.random_range(0..files.len());
        let file = files.get(pick).cloned();
        info!(group = %group, file = ?file, "random motion started");
        self.active_motion = Some(ActiveMotion {
            group,
            file,
            index: None,
        });
    }

    fn advance_blink(&mut self, delta: f64) {
        if self.blink_remaining > 0.0 {
            self.blink_remaining -= delta;
            if self.blink_remaining <= 0.0 {
                self.blink_countdown = rand::rng().random_range(BLINK_INTERVAL);
            }
        } else {
            self.blink_countdown -= delta;
            if self.blink_countdown <= 0.0 {
                self.blink_remaining = BLINK_DURATION;
            }
        }

        let open = if self.blink_remaining > 0.0 { 0.0 } else { 1.0 };
        self.parameters.insert(PARAM_EYE_L_OPEN.to_owned(), open);
        self.parameters.insert(PARAM_EYE_R_OPEN.to_owned(), open);
    }
}
