//! Resolved segments and the plan built from an authored workout.

use crate::model::pace::Pace;
use crate::model::stride::StrideProfile;
use crate::model::workout::SegmentSpec;
use serde::Serialize;

/// Roughly how many seconds of a segment one chart sample stands for.
pub const GRAPH_SAMPLE_SECONDS: f64 = 30.0;

/// A segment placed on the workout timeline.
///
/// Offsets are 1-based seconds from the start of the workout and inclusive on
/// both ends, so `end_offset - start_offset + 1 == planned_duration`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub pace: Pace,
    pub planned_duration: u32,
    pub start_offset: u32,
    pub end_offset: u32,
    pub speed: f64,
    /// `None` until reached, `Some(false)` while active, `Some(true)` once finished.
    pub completed: Option<bool>,
}

impl Segment {
    /// The sentinel returned when a cursor points past the last segment.
    pub const EMPTY: Segment = Segment {
        pace: Pace::NiceSteady,
        planned_duration: 0,
        start_offset: 0,
        end_offset: 0,
        speed: 0.0,
        completed: None,
    };

    pub fn is_active(&self) -> bool {
        self.completed == Some(false)
    }

    pub fn is_completed(&self) -> bool {
        self.completed == Some(true)
    }
}

impl Default for Segment {
    fn default() -> Self {
        Segment::EMPTY
    }
}

/// Segments with their offsets and speeds, the total duration and the chart samples.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SegmentPlan {
    pub segments: Vec<Segment>,
    pub total_duration: u32,
    pub graph: Vec<f64>,
}

impl SegmentPlan {
    /// Re-resolves every speed (and the chart) against another stride profile.
    /// Offsets and completion flags are left alone.
    pub fn restride(&mut self, profile: &StrideProfile) {
        for segment in &mut self.segments {
            segment.speed = profile.resolve_speed(segment.pace);
        }
        self.graph = speed_graph(&self.segments);
    }

    pub fn clear_completed(&mut self) {
        for segment in &mut self.segments {
            segment.completed = None;
        }
    }
}

/// Lays authored segments out on the timeline and resolves their speeds.
pub fn build_segments(specs: &[SegmentSpec], profile: &StrideProfile) -> SegmentPlan {
    let mut running_total: u32 = 0;
    let segments: Vec<Segment> = specs
        .iter()
        .map(|spec| {
            let start_offset = running_total + 1;
            running_total += spec.time;
            Segment {
                pace: spec.pace,
                planned_duration: spec.time,
                start_offset,
                end_offset: running_total,
                speed: profile.resolve_speed(spec.pace),
                completed: None,
            }
        })
        .collect();

    let graph = speed_graph(&segments);
    SegmentPlan {
        segments,
        total_duration: running_total,
        graph,
    }
}

/// Coarse speed-over-time samples: each segment contributes
/// `round((end - start) / 30) + 1` copies of its speed, never fewer than one.
pub fn speed_graph(segments: &[Segment]) -> Vec<f64> {
    let mut graph = Vec::new();
    for segment in segments {
        let span = f64::from(segment.end_offset) - f64::from(segment.start_offset);
        let samples = ((span / GRAPH_SAMPLE_SECONDS).round() as i64 + 1).max(1) as usize;
        graph.extend(std::iter::repeat(segment.speed).take(samples));
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::stride::Stride;

    fn profile_ab() -> StrideProfile {
        StrideProfile::from_pairs([(Pace::WarmUp, 3.0), (Pace::NiceSteady, 5.0)])
    }

    #[test]
    fn offsets_are_contiguous_and_one_based() {
        let specs = [
            SegmentSpec::new(Pace::WarmUp, 5),
            SegmentSpec::new(Pace::NiceSteady, 3),
        ];
        let plan = build_segments(&specs, &profile_ab());

        assert_eq!(plan.total_duration, 8);
        let first = &plan.segments[0];
        assert_eq!((first.start_offset, first.end_offset, first.speed), (1, 5, 3.0));
        let second = &plan.segments[1];
        assert_eq!((second.start_offset, second.end_offset, second.speed), (6, 8, 5.0));
        assert!(plan.segments.iter().all(|s| s.completed.is_none()));
    }

    #[test]
    fn durations_sum_to_total() {
        let specs: Vec<SegmentSpec> = [120, 45, 1, 600, 30]
            .iter()
            .zip(Pace::AUTHORED)
            .map(|(time, pace)| SegmentSpec::new(pace, *time))
            .collect();
        let plan = build_segments(&specs, &Stride::Run.profile());

        let planned: u32 = plan.segments.iter().map(|s| s.planned_duration).sum();
        assert_eq!(planned, plan.total_duration);
        for segment in &plan.segments {
            assert_eq!(segment.end_offset - segment.start_offset + 1, segment.planned_duration);
        }
        for pair in plan.segments.windows(2) {
            assert_eq!(pair[0].end_offset + 1, pair[1].start_offset);
        }
    }

    #[test]
    fn empty_input_yields_empty_plan() {
        let plan = build_segments(&[], &Stride::Jog.profile());
        assert!(plan.segments.is_empty());
        assert!(plan.graph.is_empty());
        assert_eq!(plan.total_duration, 0);
    }

    #[test]
    fn graph_samples_scale_with_duration() {
        let specs = [
            SegmentSpec::new(Pace::WarmUp, 5),
            SegmentSpec::new(Pace::NiceSteady, 120),
        ];
        let plan = build_segments(&specs, &profile_ab());
        // 5s: round(4 / 30) + 1 = 1 sample; 120s: round(119 / 30) + 1 = 5 samples.
        assert_eq!(plan.graph, vec![3.0, 5.0, 5.0, 5.0, 5.0, 5.0]);
    }

    #[test]
    fn zero_length_segment_still_gets_a_sample() {
        let specs = [SegmentSpec::new(Pace::WarmUp, 0)];
        let plan = build_segments(&specs, &profile_ab());
        assert_eq!(plan.graph, vec![3.0]);
        assert_eq!(plan.segments[0].start_offset, 1);
        assert_eq!(plan.segments[0].end_offset, 0);
    }

    #[test]
    fn restride_updates_speeds_and_graph_only() {
        let specs = [SegmentSpec::new(Pace::ToTheMax, 60)];
        let mut plan = build_segments(&specs, &Stride::Jog.profile());
        plan.segments[0].completed = Some(false);
        plan.restride(&Stride::Run.profile());

        assert_eq!(plan.segments[0].speed, 9.0);
        assert_eq!(plan.segments[0].completed, Some(false));
        assert_eq!(plan.graph, vec![9.0, 9.0, 9.0]);
        assert_eq!(plan.total_duration, 60);
    }

    #[test]
    fn sentinel_is_the_default_segment() {
        assert_eq!(Segment::default(), Segment::EMPTY);
        assert_eq!(Segment::EMPTY.pace, Pace::NiceSteady);
        assert!(!Segment::EMPTY.is_active());
    }
}
