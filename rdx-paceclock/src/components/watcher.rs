//! Defines watchers that turn the engine's tick stream into higher-level cues.

use crate::engine::{EngineSnapshot, EngineState};

/// Announces the last few seconds of every segment.
///
/// Each remaining-seconds value is reported at most once per segment, however
/// often the same tick or snapshot is observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownWatcher {
    threshold: i64,
    last_cue: Option<(usize, i64)>,
}

impl CountdownWatcher {
    /// Creates a watcher that cues from `threshold` seconds down to 1.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: i64::from(threshold),
            last_cue: None,
        }
    }

    /// Processes one tick. Returns the number to announce, if any.
    pub fn process_tick(&mut self, segment_index: usize, segment_remaining: i64) -> Option<u32> {
        if segment_remaining <= 0 || segment_remaining > self.threshold {
            return None;
        }
        let cue = (segment_index, segment_remaining);
        if self.last_cue == Some(cue) {
            return None;
        }
        self.last_cue = Some(cue);
        u32::try_from(segment_remaining).ok()
    }

    /// Processes a snapshot. Only running engines produce cues.
    pub fn observe(&mut self, snapshot: &EngineSnapshot) -> Option<u32> {
        if snapshot.state != EngineState::Running {
            return None;
        }
        self.process_tick(snapshot.current_segment_index, snapshot.segment_remaining)
    }

    /// Forgets earlier cues, e.g. after the workout is restarted.
    pub fn reset(&mut self) {
        self.last_cue = None;
    }

    /// Style class for the countdown ring: `elapsed-N` during the countdown,
    /// `elapsed-any` otherwise.
    pub fn circle_class(&self, segment_remaining: i64) -> String {
        if segment_remaining > 0 && segment_remaining <= self.threshold {
            format!("elapsed-{segment_remaining}")
        } else {
            "elapsed-any".to_string()
        }
    }
}

impl Default for CountdownWatcher {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Reports when the active segment changes, so lists can follow along.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentChangeWatcher {
    last_index: Option<usize>,
}

impl SegmentChangeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new index the first time it is seen after a change.
    pub fn process_index(&mut self, index: usize) -> Option<usize> {
        if self.last_index == Some(index) {
            return None;
        }
        self.last_index = Some(index);
        Some(index)
    }

    pub fn observe(&mut self, snapshot: &EngineSnapshot) -> Option<usize> {
        self.process_index(snapshot.current_segment_index)
    }

    pub fn reset(&mut self) {
        self.last_index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineOptions, WorkoutEngine};
    use crate::model::{Pace, SegmentSpec, Stride, Workout};
    use crate::time::ManualClock;

    #[test]
    fn cues_count_down_once_each() {
        let mut watcher = CountdownWatcher::new(5);
        assert_eq!(watcher.process_tick(0, 6), None);
        assert_eq!(watcher.process_tick(0, 5), Some(5));
        assert_eq!(watcher.process_tick(0, 5), None);
        assert_eq!(watcher.process_tick(0, 1), Some(1));
        assert_eq!(watcher.process_tick(0, 0), None);
        assert_eq!(watcher.process_tick(1, 1), Some(1));
    }

    #[test]
    fn circle_class_tracks_countdown() {
        let watcher = CountdownWatcher::default();
        assert_eq!(watcher.circle_class(3), "elapsed-3");
        assert_eq!(watcher.circle_class(0), "elapsed-any");
        assert_eq!(watcher.circle_class(12), "elapsed-any");
    }

    #[test]
    fn countdown_from_engine_snapshots() {
        let mut engine = WorkoutEngine::new(EngineOptions::default(), ManualClock::new());
        engine.load(
            Workout::new("Cue", vec![SegmentSpec::new(Pace::NiceSteady, 7)]),
            &Stride::Jog.profile(),
        );
        let mut watcher = CountdownWatcher::new(5);
        let mut cues = Vec::new();

        engine.toggle();
        cues.extend(watcher.observe(&engine.snapshot()));
        while engine.state() == EngineState::Running {
            engine.on_tick();
            cues.extend(watcher.observe(&engine.snapshot()));
        }
        assert_eq!(cues, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn segment_changes_are_reported_once() {
        let mut watcher = SegmentChangeWatcher::new();
        assert_eq!(watcher.process_index(0), Some(0));
        assert_eq!(watcher.process_index(0), None);
        assert_eq!(watcher.process_index(1), Some(1));
        watcher.reset();
        assert_eq!(watcher.process_index(1), Some(1));
    }
}
