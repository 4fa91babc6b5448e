//! Authored workouts, as they arrive from a workout source.

use crate::model::pace::Pace;
use serde::{Deserialize, Serialize};

/// One authored leg of a workout: a pace held for `time` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub pace: Pace,
    pub time: u32,
}

impl SegmentSpec {
    pub fn new(pace: Pace, time: u32) -> Self {
        Self { pace, time }
    }
}

/// A named, ordered list of segments.
///
/// Wire shape: `{ "name": "...", "segments": [{ "pace": 0, "time": 60 }], "path": "..." }`.
/// Extra fields on segments (pre-computed offsets from older files) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub name: String,
    pub segments: Vec<SegmentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Workout {
    pub fn new(name: impl Into<String>, segments: Vec<SegmentSpec>) -> Self {
        Self {
            name: name.into(),
            segments,
            path: None,
        }
    }

    /// Sum of the authored segment durations, in seconds.
    pub fn planned_duration(&self) -> u32 {
        self.segments.iter().map(|segment| segment.time).sum()
    }

    /// Returns a copy with a `Pace::Start` segment of `seconds` put in front.
    pub fn with_lead_in(&self, seconds: u32) -> Workout {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(SegmentSpec::new(Pace::Start, seconds));
        segments.extend_from_slice(&self.segments);
        Workout {
            name: self.name.clone(),
            segments,
            path: self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_shape() {
        let json = r#"{
            "name": "Pyramid",
            "segments": [
                { "pace": 0, "time": 300 },
                { "pace": 2, "time": 60, "startTime": 301, "endTime": 360 }
            ]
        }"#;
        let workout: Workout = serde_json::from_str(json).unwrap();
        assert_eq!(workout.name, "Pyramid");
        assert_eq!(workout.path, None);
        assert_eq!(workout.segments[1], SegmentSpec::new(Pace::PickItUp, 60));
        assert_eq!(workout.planned_duration(), 360);
    }

    #[test]
    fn lead_in_is_prepended_without_touching_the_original() {
        let workout = Workout::new("Short", vec![SegmentSpec::new(Pace::WarmUp, 10)]);
        let led = workout.with_lead_in(3);
        assert_eq!(led.segments.len(), 2);
        assert_eq!(led.segments[0], SegmentSpec::new(Pace::Start, 3));
        assert_eq!(led.planned_duration(), 13);
        assert_eq!(workout.segments.len(), 1);
    }
}
