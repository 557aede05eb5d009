//! The typed instant-configuration surface.
//!
//! Instant configuration is the set of named boolean/numeric toggles a
//! backend honors per frame: mouse tracking, auto-breath, auto-blink,
//! sequence speed, and loop mode. A single control-message shape
//! (`{name, value}`) can change any of them, with the type check
//! happening here at the boundary rather than through dynamic property
//! interception.

use marionette_types::{ConfigValue, InstantConfigKey};
use tracing::warn;

/// Typed storage for every instant-configuration slot.
///
/// Each backend constructs this with its own defaults; slots a backend
/// never reads are simply inert.
#[derive(Debug, Clone, PartialEq)]
pub struct InstantConfig {
    /// Follow the pointer with the model's gaze.
    pub track_mouse: bool,
    /// Simulated idle breathing.
    pub auto_breath: bool,
    /// Simulated periodic eye blinking.
    pub auto_eye_blink: bool,
    /// Sequence playback speed multiplier, never negative.
    pub animation_speed: f64,
    /// Whether sequences wrap at the end of their duration.
    pub loop_animation: bool,
}

impl InstantConfig {
    /// Defaults for the puppet backend: tracking, breathing, and
    /// blinking all on.
    pub const fn puppet() -> Self {
        Self {
            track_mouse: true,
            auto_breath: true,
            auto_eye_blink: true,
            animation_speed: 1.0,
            loop_animation: true,
        }
    }

    /// Defaults for the generic-mesh backend: everything off except the
    /// orbit camera, which is not an instant-config concern.
    pub const fn mesh() -> Self {
        Self {
            track_mouse: false,
            auto_breath: false,
            auto_eye_blink: false,
            animation_speed: 1.0,
            loop_animation: true,
        }
    }

    /// Defaults for the skeletal backend: tracking on, sequences loop at
    /// normal speed.
    pub const fn skeletal() -> Self {
        Self {
            track_mouse: true,
            auto_breath: false,
            auto_eye_blink: false,
            animation_speed: 1.0,
            loop_animation: true,
        }
    }

    /// Read one slot as a [`ConfigValue`].
    pub const fn get(&self, key: InstantConfigKey) -> ConfigValue {
        match key {
            InstantConfigKey::TrackMouse => ConfigValue::Bool(self.track_mouse),
            InstantConfigKey::AutoBreath => ConfigValue::Bool(self.auto_breath),
            InstantConfigKey::AutoEyeBlink => ConfigValue::Bool(self.auto_eye_blink),
            InstantConfigKey::AnimationSpeed => ConfigValue::Number(self.animation_speed),
            InstantConfigKey::LoopAnimation => ConfigValue::Bool(self.loop_animation),
        }
    }

    /// Write one slot, type-checking the value.
    ///
    /// Returns `true` when the value was applied. A type mismatch is
    /// logged and ignored; negative speeds are clamped to zero so
    /// animation never runs backward.
    pub fn set(&mut self, key: InstantConfigKey, value: ConfigValue) -> bool {
        match (key, value) {
            (InstantConfigKey::TrackMouse, ConfigValue::Bool(b)) => {
                self.track_mouse = b;
                true
            }
            (InstantConfigKey::AutoBreath, ConfigValue::Bool(b)) => {
                self.auto_breath = b;
                true
            }
            (InstantConfigKey::AutoEyeBlink, ConfigValue::Bool(b)) => {
                self.auto_eye_blink = b;
                true
            }
            (InstantConfigKey::AnimationSpeed, ConfigValue::Number(n)) => {
                self.animation_speed = n.max(0.0);
                true
            }
            (InstantConfigKey::LoopAnimation, ConfigValue::Bool(b)) => {
                self.loop_animation = b;
                true
            }
            (key, value) => {
                warn!(?key, ?value, "instant-config type mismatch, ignoring");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let mut config = InstantConfig::puppet();
        assert!(config.set(InstantConfigKey::AutoBreath, ConfigValue::Bool(false)));
        assert_eq!(
            config.get(InstantConfigKey::AutoBreath).as_bool(),
            Some(false)
        );
    }

    #[test]
    fn negative_speed_clamps_to_zero() {
        let mut config = InstantConfig::skeletal();
        assert!(config.set(InstantConfigKey::AnimationSpeed, ConfigValue::Number(-5.0)));
        assert_eq!(
            config.get(InstantConfigKey::AnimationSpeed).as_f64(),
            Some(0.0)
        );
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let mut config = InstantConfig::puppet();
        assert!(!config.set(InstantConfigKey::TrackMouse, ConfigValue::Number(1.0)));
        // Value unchanged.
        assert_eq!(config.get(InstantConfigKey::TrackMouse).as_bool(), Some(true));
    }
}
