//! The animation sequence state machine.
//!
//! The sequencer owns sequence/time/speed/loop state for the skeletal
//! backend and advances it once per tick. Two states: Idle and Playing.
//! Bone-level transform application belongs to the renderer behind the
//! scene handle; the sequencer is the single source of truth for *where
//! in the clip* playback currently is.
//!
//! Switching sequences mid-playback is a hard cut: the new sequence
//! starts at time zero with no cross-fade.

use marionette_types::SequenceSelector;
use tracing::{debug, warn};

use crate::asset::SequenceInfo;

/// Notification produced by [`Sequencer::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerNotice {
    /// A non-looping sequence reached its duration and stopped.
    Finished {
        /// The sequence that finished.
        index: usize,
    },
}

/// Playback status snapshot returned by [`Sequencer::current_sequence`].
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceStatus {
    /// Active sequence index.
    pub index: usize,
    /// Sequence name, when the asset provides one.
    pub name: Option<String>,
    /// Clip duration in seconds.
    pub duration: f64,
    /// Current playback time in seconds.
    pub time: f64,
    /// Whether playback is advancing.
    pub playing: bool,
}

/// One entry of [`Sequencer::sequence_list`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SequenceListEntry {
    /// Zero-based sequence index.
    pub index: usize,
    /// Display name.
    pub name: String,
    /// Number of frames in the clip.
    #[serde(rename = "frameCount")]
    pub frame_count: u32,
    /// Effective frame rate.
    pub fps: f64,
}

/// The Idle/Playing sequence state machine.
///
/// Invariant: `current == None` implies `time == 0` and `!playing`.
/// Time advances monotonically while playing and wraps or clamps at the
/// clip duration depending on loop mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequencer {
    sequences: Vec<SequenceInfo>,
    current: Option<usize>,
    time: f64,
    speed: f64,
    looping: bool,
    playing: bool,
}

impl Sequencer {
    /// Create an idle sequencer over the asset's sequence list.
    pub const fn new(sequences: Vec<SequenceInfo>) -> Self {
        Self {
            sequences,
            current: None,
            time: 0.0,
            speed: 1.0,
            looping: true,
            playing: false,
        }
    }

    /// Start playing the sequence the selector resolves to.
    ///
    /// Resolution is by index bounds or case-insensitive name. An
    /// unresolved identifier is a warning no-op: state is unchanged and
    /// `None` is returned. Re-entering while playing hard-cuts to the
    /// new sequence at time zero.
    pub fn play(&mut self, selector: &SequenceSelector) -> Option<usize> {
        let index = self.resolve(selector);

        match index {
            Some(index) => {
                self.current = Some(index);
                self.time = 0.0;
                self.playing = true;
                debug!(index, "sequence started");
                Some(index)
            }
            None => {
                warn!(?selector, "sequence not found");
                None
            }
        }
    }

    /// Stop playback, returning to Idle with time reset to zero.
    pub const fn stop(&mut self) {
        self.current = None;
        self.time = 0.0;
        self.playing = false;
    }

    /// Halt advancement without losing position.
    pub const fn pause(&mut self) {
        self.playing = false;
    }

    /// Resume a paused sequence. Has no effect while Idle.
    pub const fn resume(&mut self) {
        if self.current.is_some() {
            self.playing = true;
        }
    }

    /// Jump to a time within the current clip, clamped to
    /// `[0, duration]`. Has no effect while Idle.
    pub fn seek(&mut self, time: f64) {
        if self.current.is_some() {
            self.time = time.clamp(0.0, self.duration());
        }
    }

    /// Set the playback speed multiplier; negative input clamps to zero
    /// so animation never runs backward.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.max(0.0);
    }

    /// Set whether playback wraps at the end of the clip.
    pub const fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Advance playback by `delta` seconds of wall time.
    ///
    /// `time += delta * speed`. On reaching the duration: wrap
    /// (`time mod duration`) and stay Playing when looping, otherwise
    /// clamp to the duration, drop to Idle, and emit a single
    /// [`SequencerNotice::Finished`].
    pub fn advance(&mut self, delta: f64) -> Option<SequencerNotice> {
        if !self.playing {
            return None;
        }
        let index = self.current?;
        let info = self.sequences.get(index)?;

        self.time += delta * self.speed;

        let duration = info.duration();
        if self.time >= duration {
            if self.looping {
                self.time %= duration;
            } else {
                self.time = duration;
                self.playing = false;
                debug!(index, "sequence finished");
                return Some(SequencerNotice::Finished { index });
            }
        }
        None
    }

    /// The active sequence index, `None` while Idle.
    pub const fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Current playback time in seconds.
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Whether playback is advancing.
    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    /// The effective speed multiplier.
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Whether playback wraps at the end of the clip.
    pub const fn looping(&self) -> bool {
        self.looping
    }

    /// Duration of the current clip in seconds, zero while Idle.
    ///
    /// Pure read; does not mutate time.
    pub fn duration(&self) -> f64 {
        self.current
            .and_then(|index| self.sequences.get(index))
            .map_or(0.0, SequenceInfo::duration)
    }

    /// Status of the current sequence, `None` while Idle.
    ///
    /// Pure read; does not mutate time.
    pub fn current_sequence(&self) -> Option<SequenceStatus> {
        let index = self.current?;
        let info = self.sequences.get(index)?;
        Some(SequenceStatus {
            index,
            name: info.name.clone(),
            duration: info.duration(),
            time: self.time,
            playing: self.playing,
        })
    }

    /// All available sequences with display names and effective rates.
    ///
    /// Pure read; does not mutate time.
    pub fn sequence_list(&self) -> Vec<SequenceListEntry> {
        self.sequences
            .iter()
            .enumerate()
            .map(|(index, info)| SequenceListEntry {
                index,
                name: info.display_name(index),
                frame_count: info.frame_count,
                fps: match info.fps {
                    Some(fps) if fps > 0.0 => fps,
                    _ => crate::asset::DEFAULT_SEQUENCE_FPS,
                },
            })
            .collect()
    }

    /// Name of a sequence by index, when the asset provides one.
    pub fn name_of(&self, index: usize) -> Option<String> {
        self.sequences.get(index).and_then(|info| info.name.clone())
    }

    fn resolve(&self, selector: &SequenceSelector) -> Option<usize> {
        match selector {
            SequenceSelector::Index(index) => {
                (*index < self.sequences.len()).then_some(*index)
            }
            SequenceSelector::Name(name) => self.sequences.iter().position(|info| {
                info.name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn walk_and_idle() -> Vec<SequenceInfo> {
        vec![
            SequenceInfo {
                name: Some("idle".to_owned()),
                frame_count: 30,
                fps: Some(30.0),
            },
            SequenceInfo {
                name: Some("walk".to_owned()),
                frame_count: 60,
                fps: Some(30.0),
            },
        ]
    }

    #[test]
    fn starts_idle() {
        let seq = Sequencer::new(walk_and_idle());
        assert_eq!(seq.current_index(), None);
        assert!(!seq.is_playing());
        assert!(seq.time().abs() < f64::EPSILON);
    }

    #[test]
    fn plays_by_name_case_insensitive() {
        let mut seq = Sequencer::new(walk_and_idle());
        let index = seq.play(&SequenceSelector::Name("Walk".to_owned()));
        assert_eq!(index, Some(1));
        assert!(seq.is_playing());
    }

    #[test]
    fn unresolved_selector_is_a_no_op() {
        let mut seq = Sequencer::new(walk_and_idle());
        assert_eq!(seq.play(&SequenceSelector::Name("fly".to_owned())), None);
        assert_eq!(seq.play(&SequenceSelector::Index(7)), None);
        assert_eq!(seq.current_index(), None);
        assert!(!seq.is_playing());
    }

    #[test]
    fn looping_wraps_time() {
        let mut seq = Sequencer::new(walk_and_idle());
        seq.play(&SequenceSelector::Index(1)); // duration 2.0s
        seq.set_loop(true);

        assert_eq!(seq.advance(1.0), None);
        // Half a duration plus epsilon: wraps to ~epsilon.
        assert_eq!(seq.advance(1.0 + 0.001), None);
        assert!(seq.time() < 0.01);
        assert!(seq.is_playing());
    }

    #[test]
    fn non_looping_clamps_and_finishes() {
        let mut seq = Sequencer::new(walk_and_idle());
        seq.play(&SequenceSelector::Index(1)); // duration 2.0s
        seq.set_loop(false);

        assert_eq!(seq.advance(1.0), None);
        let notice = seq.advance(1.5);
        assert_eq!(notice, Some(SequencerNotice::Finished { index: 1 }));
        assert!((seq.time() - 2.0).abs() < f64::EPSILON);
        assert!(!seq.is_playing());
        // Finished notification is emitted exactly once.
        assert_eq!(seq.advance(1.0), None);
    }

    #[test]
    fn negative_speed_clamps_to_zero() {
        let mut seq = Sequencer::new(walk_and_idle());
        seq.play(&SequenceSelector::Index(0));
        seq.set_speed(-5.0);
        assert!(seq.speed().abs() < f64::EPSILON);

        seq.advance(1.0);
        assert!(seq.time().abs() < f64::EPSILON);
    }

    #[test]
    fn speed_scales_advancement() {
        let mut seq = Sequencer::new(walk_and_idle());
        seq.play(&SequenceSelector::Index(1));
        seq.set_speed(2.0);
        seq.advance(0.5);
        assert!((seq.time() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn stop_resets_time() {
        let mut seq = Sequencer::new(walk_and_idle());
        seq.play(&SequenceSelector::Index(0));
        seq.advance(0.5);
        seq.stop();
        assert_eq!(seq.current_index(), None);
        assert!(seq.time().abs() < f64::EPSILON);
        assert!(!seq.is_playing());
    }

    #[test]
    fn pause_and_resume_keep_position() {
        let mut seq = Sequencer::new(walk_and_idle());
        seq.play(&SequenceSelector::Index(1));
        seq.advance(0.5);
        seq.pause();
        seq.advance(1.0);
        assert!((seq.time() - 0.5).abs() < 1e-9);
        seq.resume();
        assert!(seq.is_playing());
    }

    #[test]
    fn resume_while_idle_stays_idle() {
        let mut seq = Sequencer::new(walk_and_idle());
        seq.resume();
        assert!(!seq.is_playing());
    }

    #[test]
    fn seek_clamps_to_duration() {
        let mut seq = Sequencer::new(walk_and_idle());
        seq.play(&SequenceSelector::Index(1));
        seq.seek(10.0);
        assert!((seq.time() - 2.0).abs() < f64::EPSILON);
        seq.seek(-3.0);
        assert!(seq.time().abs() < f64::EPSILON);
    }

    #[test]
    fn switching_sequences_hard_cuts() {
        let mut seq = Sequencer::new(walk_and_idle());
        seq.play(&SequenceSelector::Index(0));
        seq.advance(0.5);
        seq.play(&SequenceSelector::Index(1));
        assert_eq!(seq.current_index(), Some(1));
        assert!(seq.time().abs() < f64::EPSILON);
        assert!(seq.is_playing());
    }

    #[test]
    fn queries_do_not_mutate_time() {
        let mut seq = Sequencer::new(walk_and_idle());
        seq.play(&SequenceSelector::Index(1));
        seq.advance(0.25);
        let before = seq.time();
        let _ = seq.current_sequence();
        let _ = seq.duration();
        let _ = seq.sequence_list();
        assert!((seq.time() - before).abs() < f64::EPSILON);
    }

    #[test]
    fn sequence_list_fills_missing_names() {
        let seq = Sequencer::new(vec![SequenceInfo {
            name: None,
            frame_count: 10,
            fps: None,
        }]);
        let list = seq.sequence_list();
        assert_eq!(list.len(), 1);
        assert_eq!(list.first().map(|e| e.name.as_str()), Some("Sequence 0"));
        assert!(list.first().is_some_and(|e| (e.fps - 30.0).abs() < f64::EPSILON));
    }
}
