//! Defines all public event types broadcast by the workout engine.
//!
//! Front ends subscribe to these to react to the run (announce a countdown,
//! scroll a segment list, play a sound) without polling the engine.

use crate::engine::EngineState;

/// Something that happened inside the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A workout replaced whatever was loaded before.
    WorkoutLoaded {
        name: String,
        segment_count: usize,
        total_duration: u32,
    },
    /// The lifecycle moved between `Stopped`, `Running` and `Paused`.
    StateChanged { from: EngineState, to: EngineState },
    /// The segment at `index` became the active one.
    SegmentStarted { index: usize },
    /// The segment at `index` ran its full length.
    SegmentCompleted { index: usize },
    /// The last segment finished. The engine is back in `Stopped`.
    WorkoutCompleted { name: String },
    /// One second of running time was applied.
    Ticked {
        timer_elapsed: u32,
        segment_index: usize,
        segment_remaining: i64,
    },
    /// Segment speeds were re-derived from another stride profile.
    StrideChanged,
}

impl EngineEvent {
    /// Whether this event ends a run, either by completion or by an explicit stop.
    pub fn ends_run(&self) -> bool {
        matches!(
            self,
            EngineEvent::WorkoutCompleted { .. }
                | EngineEvent::StateChanged {
                    to: EngineState::Stopped,
                    ..
                }
        )
    }
}
