//! The workout data model: paces, stride profiles, segments and workouts.
//!
//! Everything here is plain data plus pure functions. The engine consumes a
//! `Workout` and a `StrideProfile` and turns them into a `SegmentPlan`.

pub mod pace;
pub mod segment;
pub mod stride;
pub mod workout;

pub use pace::Pace;
pub use segment::{build_segments, speed_graph, Segment, SegmentPlan, GRAPH_SAMPLE_SECONDS};
pub use stride::{resolve_speed, Stride, StrideProfile};
pub use workout::{SegmentSpec, Workout};
