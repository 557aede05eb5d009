//! The skeletal-sequence backend.
//!
//! A rigged 3D mesh whose animation clips, bodygroup variants, and skin
//! variants are all indexed. The sequencer owns where-in-the-clip
//! playback is; this backend owns the variant state and turns sequencer
//! transitions and monitor hits into outbound sync messages.

use std::collections::BTreeMap;

use marionette_types::{ControlMessage, InstantConfigKey, SyncMessage};
use tracing::{debug, warn};

use crate::asset::{ModelAsset, ModelControlInfo, SceneHandle};
use crate::instant::InstantConfig;
use crate::manager::Gaze;
use crate::monitor::{BodygroupMonitor, DeltaMonitor, SequenceMonitor, SkinMonitor};
use crate::sequencer::{Sequencer, SequencerNotice};

/// A loaded 3D rigged mesh with animation sequences.
#[derive(Debug)]
pub struct SkeletalModel {
    scene: Option<SceneHandle>,
    info: ModelControlInfo,
    sequencer: Sequencer,
    bodygroups: BTreeMap<usize, u32>,
    bodygroup_count: usize,
    skin: usize,
    skin_count: usize,
    config: InstantConfig,
    gaze: Gaze,
    sequence_monitor: SequenceMonitor,
    bodygroup_monitor: BodygroupMonitor,
    skin_monitor: SkinMonitor,
    focus_monitor: DeltaMonitor<2>,
    pending: Vec<SyncMessage>,
}

impl SkeletalModel {
    /// Build the backend from a parsed asset.
    pub fn new(name: &str, asset: ModelAsset) -> Self {
        let sequencer = Sequencer::new(asset.sequences);
        let mut info = ModelControlInfo {
            sequences: sequencer
                .sequence_list()
                .into_iter()
                .map(|entry| entry.name)
                .collect(),
            bodygroups: asset.bodygroups.clone(),
            nodes: asset.nodes,
            ..ModelControlInfo::default()
        };
        info.describe("name", name);
        info.describe("model-type", "Skeletal");
        info.describe("sequences", info.sequences.len());
        info.describe("bodygroups", asset.bodygroups.len());
        info.describe("skins", asset.skin_count);

        Self {
            scene: Some(asset.scene),
            info,
            sequencer,
            bodygroups: BTreeMap::new(),
            bodygroup_count: asset.bodygroups.len(),
            skin: 0,
            skin_count: asset.skin_count,
            config: InstantConfig::skeletal(),
            gaze: Gaze::neutral(),
            sequence_monitor: SequenceMonitor::new(),
            bodygroup_monitor: BodygroupMonitor::new(),
            skin_monitor: SkinMonitor::new(0),
            focus_monitor: DeltaMonitor::new([0.0, 0.0]),
            pending: Vec::new(),
        }
    }

    /// The control surface summary built at load time.
    pub const fn control_info(&self) -> &ModelControlInfo {
        &self.info
    }

    /// The sequence state machine.
    pub const fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// The current skin index.
    pub const fn skin(&self) -> usize {
        self.skin
    }

    /// The current bodygroup values, keyed by bodygroup index.
    pub const fn bodygroups(&self) -> &BTreeMap<usize, u32> {
        &self.bodygroups
    }

    /// The instant-configuration surface.
    pub const fn config(&self) -> &InstantConfig {
        &self.config
    }

    /// Apply one control message. Puppet channels (parameters, parts,
    /// motions, expressions) have no meaning here and are ignored.
    pub fn handle_message(&mut self, message: &ControlMessage) {
        match message {
            ControlMessage::PlaySequence { selector } => {
                if let Some(index) = self.sequencer.play(selector) {
                    self.pending.push(SyncMessage::SequenceStarted {
                        index,
                        name: self.sequencer.name_of(index),
                    });
                }
            }
            ControlMessage::StopSequence => self.sequencer.stop(),
            ControlMessage::SetBodygroup { index, value } => {
                if *index < self.bodygroup_count {
                    self.bodygroups.insert(*index, *value);
                } else {
                    warn!(index, "bodygroup index out of range");
                }
            }
            ControlMessage::SetSkin { index } => {
                if *index < self.skin_count {
                    self.skin = *index;
                } else {
                    warn!(index, "skin index out of range");
                }
            }
            ControlMessage::ChangeInstantConfig { name, value } => {
                if self.config.set(*name, *value) {
                    match name {
                        InstantConfigKey::AnimationSpeed => {
                            self.sequencer.set_speed(self.config.animation_speed);
                        }
                        InstantConfigKey::LoopAnimation => {
                            self.sequencer.set_loop(self.config.loop_animation);
                        }
                        InstantConfigKey::TrackMouse if !self.config.track_mouse => {
                            self.gaze.reset();
                        }
                        _ => {}
                    }
                }
            }
            ControlMessage::SetFocus { x, y } => self.gaze.set_target(*x, *y),
            ControlMessage::SetParameter { .. }
            | ControlMessage::SetPart { .. }
            | ControlMessage::SetExpression { .. }
            | ControlMessage::PlayMotion { .. }
            | ControlMessage::SetCamera { .. } => {
                debug!(?message, "channel not supported by skeletal backend");
            }
        }
    }

    /// Advance the sequencer and, while idle, the gaze interpolation.
    ///
    /// Gaze only drives the head while no sequence is playing, so clips
    /// keep full authority over the skeleton.
    pub fn tick(&mut self, delta: f64) {
        if let Some(SequencerNotice::Finished { index }) = self.sequencer.advance(delta) {
            self.pending.push(SyncMessage::SequenceFinished { index });
        }
        if self.sequencer.current_index().is_none() {
            self.gaze.tick(delta);
        }
    }

    /// Drain pending transition messages and run every monitor once.
    pub fn poll_updates(&mut self) -> Vec<SyncMessage> {
        let mut updates = std::mem::take(&mut self.pending);

        let index = self.sequencer.current_index();
        let time = self.sequencer.time();
        if self.sequence_monitor.check_update(index, time) {
            updates.push(SyncMessage::SequenceState {
                index,
                time,
                playing: self.sequencer.is_playing(),
            });
        }
        if self.bodygroup_monitor.check_update(&self.bodygroups) {
            updates.push(SyncMessage::BodygroupChanged {
                values: self.bodygroups.clone(),
            });
        }
        if self.skin_monitor.check_update(&self.skin) {
            updates.push(SyncMessage::SkinChanged { index: self.skin });
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
        self.sequencer.stop();
        self.bodygroups.clear();
        self.skin = 0;
        self.gaze.reset();
        self.sequence_monitor.reset();
        self.bodygroup_monitor.reset();
        self.skin_monitor.reset(0);
        self.focus_monitor.reset([0.0, 0.0]);
        self.pending.clear();
    }
}
