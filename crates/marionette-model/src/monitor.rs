//! Change detectors that decide what state is worth pushing to
//! observers.
//!
//! A monitor never owns the state it watches; it holds only the
//! last-reported snapshot. The owning manager calls `check_update` with
//! the current value once per tick, and only a positive check -- true
//! exactly once per change -- results in an outbound sync message.
//! Discrete values compare exactly; continuous values use an epsilon
//! threshold (default [`DEFAULT_MIN_DELTA`]) to suppress sub-perceptible
//! churn.

use std::collections::BTreeMap;

/// Minimum change in a continuous value before it is reported.
pub const DEFAULT_MIN_DELTA: f64 = 0.05;

/// Exact-equality monitor for a discrete value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMonitor<T> {
    last: T,
}

impl<T: Clone + PartialEq> ValueMonitor<T> {
    /// Create a monitor whose snapshot starts at `initial`.
    ///
    /// The first `check_update` against an equal value returns false.
    pub const fn new(initial: T) -> Self {
        Self { last: initial }
    }

    /// Compare `current` against the snapshot, updating it on change.
    ///
    /// Returns true exactly once per change; repeated calls with the
    /// same value return false.
    pub fn check_update(&mut self, current: &T) -> bool {
        if *current == self.last {
            false
        } else {
            self.last = current.clone();
            true
        }
    }

    /// The last-reported snapshot.
    pub const fn snapshot(&self) -> &T {
        &self.last
    }

    /// Restore the snapshot to a known value.
    pub fn reset(&mut self, value: T) {
        self.last = value;
    }
}

/// Exact-equality monitor for the skin index.
pub type SkinMonitor = ValueMonitor<usize>;

/// Epsilon-tolerant monitor for `N` continuous components.
///
/// Used for gaze offsets (`N = 2`) and orbit-camera transforms
/// (`N = 3`). A change in any single component beyond the threshold
/// reports the whole tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaMonitor<const N: usize> {
    last: [f64; N],
    min_delta: f64,
}

impl<const N: usize> DeltaMonitor<N> {
    /// Create a monitor with the default threshold.
    pub const fn new(initial: [f64; N]) -> Self {
        Self {
            last: initial,
            min_delta: DEFAULT_MIN_DELTA,
        }
    }

    /// Create a monitor with a custom threshold.
    pub const fn with_min_delta(initial: [f64; N], min_delta: f64) -> Self {
        Self {
            last: initial,
            min_delta,
        }
    }

    /// Compare `current` against the snapshot, updating it on change.
    pub fn check_update(&mut self, current: &[f64; N]) -> bool {
        let changed = self
            .last
            .iter()
            .zip(current.iter())
            .any(|(last, now)| (now - last).abs() > self.min_delta);
        if changed {
            self.last = *current;
        }
        changed
    }

    /// Restore the snapshot to a known value.
    pub const fn reset(&mut self, value: [f64; N]) {
        self.last = value;
    }
}

/// Composite monitor for sequence playback: exact on the index,
/// epsilon-tolerant on the time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceMonitor {
    last_index: Option<usize>,
    last_time: f64,
    min_delta: f64,
}

impl SequenceMonitor {
    /// Create a monitor with no sequence reported yet.
    pub const fn new() -> Self {
        Self {
            last_index: None,
            last_time: 0.0,
            min_delta: DEFAULT_MIN_DELTA,
        }
    }

    /// Compare the current `(index, time)` pair against the snapshot.
    ///
    /// An index change always reports; a time change reports only past
    /// the threshold.
    pub fn check_update(&mut self, index: Option<usize>, time: f64) -> bool {
        if index != self.last_index || (time - self.last_time).abs() > self.min_delta {
            self.last_index = index;
            self.last_time = time;
            true
        } else {
            false
        }
    }

    /// Forget everything reported so far.
    pub const fn reset(&mut self) {
        self.last_index = None;
        self.last_time = 0.0;
    }
}

impl Default for SequenceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-key monitor for the bodygroup map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodygroupMonitor {
    last: BTreeMap<usize, u32>,
}

impl BodygroupMonitor {
    /// Create a monitor with an empty snapshot.
    pub const fn new() -> Self {
        Self {
            last: BTreeMap::new(),
        }
    }

    /// Compare the current map against the snapshot.
    ///
    /// Any added, removed, or changed entry reports once.
    pub fn check_update(&mut self, current: &BTreeMap<usize, u32>) -> bool {
        if *current == self.last {
            false
        } else {
            self.last.clone_from(current);
            true
        }
    }

    /// Forget everything reported so far.
    pub fn reset(&mut self) {
        self.last.clear();
    }
}
