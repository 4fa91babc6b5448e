//! The workout engine: the tick-driven state machine behind every run.
//!
//! A `WorkoutEngine` owns the loaded segment plan and the run cursors
//! (`timer_elapsed`, `current_segment_index`). It moves between `Stopped`,
//! `Running` and `Paused` in response to `load`, `toggle` and `stop`, and it
//! advances one second per tick while running. Everything a front end shows
//! (percentages, clock text, current and next segment) is derived on read.

use crate::common::RunEpoch;
use crate::events::EngineEvent;
use crate::format::{format_clock, segment_label, TimeFormat};
use crate::model::{build_segments, Segment, SegmentPlan, StrideProfile, Workout};
use crate::time::{TickEvent, TickSource};
use serde::Serialize;
use std::fmt;
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

static EMPTY_SEGMENT: Segment = Segment::EMPTY;

/// Lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    /// Nothing is running. Initial state, after `stop`, and after a workout finishes.
    #[default]
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Stopped => "stopped",
            EngineState::Running => "running",
            EngineState::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Behavioural switches for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Prepend a `Pace::Start` segment of `lead_in_seconds` to every loaded workout.
    pub include_lead_in: bool,
    pub lead_in_seconds: u32,
    pub time_format: TimeFormat,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            include_lead_in: false,
            lead_in_seconds: 3,
            time_format: TimeFormat::Auto,
        }
    }
}

/// Everything a front end reads once per tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub state: EngineState,
    pub workout_name: String,
    pub timer_elapsed: u32,
    pub total_duration: u32,
    /// Counts down from 100 towards 0 over the workout.
    pub percentage: f64,
    pub current_segment_index: usize,
    /// Seconds left in the current segment, as of the last tick.
    pub segment_remaining: i64,
    pub segment_percentage: f64,
    pub current_segment: Segment,
    pub next_segment: Segment,
    pub segments: Vec<Segment>,
    pub segment_graph: Vec<f64>,
    pub formatted_elapsed: String,
    pub formatted_total: String,
    pub formatted_segment_remaining: String,
    pub segment_label: String,
}

/// The workout timing engine.
///
/// Ticks arrive from the `TickSource` the engine owns. Every transition that
/// starts, pauses, stops or replaces a run stops the source first and bumps
/// the run epoch, so a tick that was already on its way is rejected by
/// [`WorkoutEngine::handle_tick`].
pub struct WorkoutEngine<T: TickSource> {
    options: EngineOptions,
    ticker: T,
    state: EngineState,
    epoch: RunEpoch,
    workout_name: String,
    has_lead_in: bool,
    plan: SegmentPlan,
    timer_elapsed: u32,
    current_segment_index: usize,
    segment_remaining: i64,
    event_sender: broadcast::Sender<EngineEvent>,
}

// Lifecycle operations.
impl<T: TickSource> WorkoutEngine<T> {
    /// Creates an engine with nothing loaded, in `Stopped`.
    pub fn new(options: EngineOptions, ticker: T) -> Self {
        let (event_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            options,
            ticker,
            state: EngineState::Stopped,
            epoch: RunEpoch::default(),
            workout_name: String::new(),
            has_lead_in: false,
            plan: SegmentPlan::default(),
            timer_elapsed: 0,
            current_segment_index: 0,
            segment_remaining: 0,
            event_sender,
        }
    }

    /// Replaces the loaded workout and resets the engine to `Stopped`.
    ///
    /// Ticking stops before anything is mutated. No segment or cursor of the
    /// previous workout survives the call.
    pub fn load(&mut self, workout: Workout, profile: &StrideProfile) {
        self.halt();

        let has_lead_in = self.options.include_lead_in && !workout.segments.is_empty();
        let workout = if has_lead_in {
            workout.with_lead_in(self.options.lead_in_seconds)
        } else {
            workout
        };

        self.plan = build_segments(&workout.segments, profile);
        self.has_lead_in = has_lead_in;
        self.workout_name = workout.name;
        self.reset_cursors();
        self.set_state(EngineState::Stopped);

        info!(
            "Loaded workout '{}' ({} segments, {}s).",
            self.workout_name,
            self.plan.segments.len(),
            self.plan.total_duration
        );
        self.emit(EngineEvent::WorkoutLoaded {
            name: self.workout_name.clone(),
            segment_count: self.plan.segments.len(),
            total_duration: self.plan.total_duration,
        });
    }

    /// Starts, pauses or resumes the run depending on the current state.
    ///
    /// - `Stopped` -> `Running`: cursors rewind, segment 0 becomes active and one
    ///   tick is applied immediately, so the first displayed second is already 1.
    /// - `Running` -> `Paused`: ticking stops, cursors are kept.
    /// - `Paused` -> `Running`: the current segment is re-marked active, one tick
    ///   is applied immediately and ticking resumes.
    pub fn toggle(&mut self) {
        match self.state {
            EngineState::Running => {
                self.halt();
                self.set_state(EngineState::Paused);
            }
            EngineState::Paused => {
                self.set_state(EngineState::Running);
                if let Some(segment) = self.plan.segments.get_mut(self.current_segment_index) {
                    segment.completed = Some(false);
                }
                self.resume_ticking();
            }
            EngineState::Stopped => {
                if self.plan.segments.is_empty() {
                    warn!("Toggle ignored: no workout with segments is loaded.");
                    return;
                }
                self.reset_cursors();
                self.set_state(EngineState::Running);
                if let Some(first) = self.plan.segments.first_mut() {
                    first.completed = Some(false);
                }
                self.emit(EngineEvent::SegmentStarted { index: 0 });
                self.resume_ticking();
            }
        }
    }

    /// Stops ticking and rewinds everything. Calling it repeatedly is harmless.
    pub fn stop(&mut self) {
        self.halt();
        self.reset_cursors();
        self.set_state(EngineState::Stopped);
    }

    /// Re-derives segment speeds and the speed graph from another profile.
    /// The run itself is unaffected.
    pub fn select_stride(&mut self, profile: &StrideProfile) {
        self.plan.restride(profile);
        debug!("Stride changed for '{}'.", self.workout_name);
        self.emit(EngineEvent::StrideChanged);
    }

    /// Applies a tick from the tick source.
    ///
    /// Returns `false` (and changes nothing) when the tick belongs to an older
    /// run epoch or the engine is not running.
    pub fn handle_tick(&mut self, tick: &TickEvent) -> bool {
        if tick.epoch != self.epoch || self.state != EngineState::Running {
            trace!(
                "Dropping tick #{} from {} (current {}, {}).",
                tick.tick_count,
                tick.epoch,
                self.epoch,
                self.state
            );
            return false;
        }
        self.on_tick();
        true
    }

    /// Advances the run by one second.
    ///
    /// The segment rolls over only once `timer_elapsed` passes its end offset,
    /// so together with the 1-based offsets every segment stays active for
    /// exactly its planned duration. Outside `Running` this does nothing.
    pub fn on_tick(&mut self) {
        if self.state != EngineState::Running {
            return;
        }
        let index = self.current_segment_index;
        let Some(end_offset) = self.plan.segments.get(index).map(|s| s.end_offset) else {
            return;
        };

        self.segment_remaining = i64::from(end_offset) - i64::from(self.timer_elapsed);
        self.timer_elapsed += 1;
        trace!(
            "Tick: elapsed {}s, segment {} has {}s left.",
            self.timer_elapsed,
            index,
            self.segment_remaining
        );
        self.emit(EngineEvent::Ticked {
            timer_elapsed: self.timer_elapsed,
            segment_index: index,
            segment_remaining: self.segment_remaining,
        });

        if self.timer_elapsed <= end_offset {
            return;
        }

        self.plan.segments[index].completed = Some(true);
        self.emit(EngineEvent::SegmentCompleted { index });
        self.current_segment_index += 1;

        let next = self.current_segment_index;
        match self.plan.segments.get_mut(next) {
            Some(segment) => {
                segment.completed = Some(false);
                debug!("Segment {} started ({}).", next, segment.pace);
                self.emit(EngineEvent::SegmentStarted { index: next });
            }
            None => {
                self.halt();
                self.set_state(EngineState::Stopped);
                info!("Workout '{}' completed.", self.workout_name);
                self.emit(EngineEvent::WorkoutCompleted {
                    name: self.workout_name.clone(),
                });
            }
        }
    }
}

// Internal helpers.
impl<T: TickSource> WorkoutEngine<T> {
    fn halt(&mut self) {
        self.ticker.stop();
        self.epoch = self.epoch.next();
    }

    fn resume_ticking(&mut self) {
        self.epoch = self.epoch.next();
        self.on_tick();
        if self.state == EngineState::Running {
            self.ticker.start(self.epoch);
        }
    }

    fn reset_cursors(&mut self) {
        self.timer_elapsed = 0;
        self.current_segment_index = 0;
        self.segment_remaining = 0;
        self.plan.clear_completed();
    }

    fn set_state(&mut self, to: EngineState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        info!("Engine {} -> {}.", from, to);
        self.emit(EngineEvent::StateChanged { from, to });
    }

    fn emit(&self, event: EngineEvent) {
        self.event_sender.send(event).ok();
    }

    fn lead_in_offset(&self) -> i64 {
        if !self.has_lead_in {
            return 0;
        }
        self.plan
            .segments
            .first()
            .map_or(0, |segment| i64::from(segment.planned_duration))
    }
}

// Read-only view.
impl<T: TickSource> WorkoutEngine<T> {
    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn epoch(&self) -> RunEpoch {
        self.epoch
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn ticker(&self) -> &T {
        &self.ticker
    }

    pub fn workout_name(&self) -> &str {
        &self.workout_name
    }

    pub fn has_lead_in(&self) -> bool {
        self.has_lead_in
    }

    pub fn is_loaded(&self) -> bool {
        !self.plan.segments.is_empty()
    }

    pub fn timer_elapsed(&self) -> u32 {
        self.timer_elapsed
    }

    pub fn total_duration(&self) -> u32 {
        self.plan.total_duration
    }

    pub fn current_segment_index(&self) -> usize {
        self.current_segment_index
    }

    pub fn segment_remaining(&self) -> i64 {
        self.segment_remaining
    }

    pub fn segments(&self) -> &[Segment] {
        &self.plan.segments
    }

    pub fn segment_graph(&self) -> &[f64] {
        &self.plan.graph
    }

    /// `100 - elapsed * 100 / total`. NaN or infinite for an empty workout.
    pub fn percentage(&self) -> f64 {
        100.0 - (f64::from(self.timer_elapsed) * 100.0) / f64::from(self.plan.total_duration)
    }

    /// Share of the current segment still to run, in percent; `0` past the end.
    pub fn segment_percentage(&self) -> f64 {
        match self.plan.segments.get(self.current_segment_index) {
            Some(segment) => {
                (self.segment_remaining as f64 * 100.0) / f64::from(segment.planned_duration)
            }
            None => 0.0,
        }
    }

    /// The active segment, or the empty sentinel once the cursor is past the end.
    pub fn current_segment(&self) -> &Segment {
        self.plan
            .segments
            .get(self.current_segment_index)
            .unwrap_or(&EMPTY_SEGMENT)
    }

    /// The segment after the active one, or the empty sentinel.
    pub fn next_segment(&self) -> &Segment {
        self.plan
            .segments
            .get(self.current_segment_index + 1)
            .unwrap_or(&EMPTY_SEGMENT)
    }

    /// Elapsed time as clock text, not counting the lead-in.
    pub fn formatted_elapsed(&self) -> String {
        format_clock(
            i64::from(self.timer_elapsed) - self.lead_in_offset(),
            self.options.time_format,
        )
    }

    /// Total time as clock text, not counting the lead-in.
    pub fn formatted_total(&self) -> String {
        format_clock(
            i64::from(self.plan.total_duration) - self.lead_in_offset(),
            self.options.time_format,
        )
    }

    pub fn formatted_segment_remaining(&self) -> String {
        format_clock(self.segment_remaining, self.options.time_format)
    }

    pub fn segment_label(&self) -> String {
        segment_label(
            self.current_segment_index,
            self.plan.segments.len(),
            self.has_lead_in,
        )
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state,
            workout_name: self.workout_name.clone(),
            timer_elapsed: self.timer_elapsed,
            total_duration: self.plan.total_duration,
            percentage: self.percentage(),
            current_segment_index: self.current_segment_index,
            segment_remaining: self.segment_remaining,
            segment_percentage: self.segment_percentage(),
            current_segment: self.current_segment().clone(),
            next_segment: self.next_segment().clone(),
            segments: self.plan.segments.clone(),
            segment_graph: self.plan.graph.clone(),
            formatted_elapsed: self.formatted_elapsed(),
            formatted_total: self.formatted_total(),
            formatted_segment_remaining: self.formatted_segment_remaining(),
            segment_label: self.segment_label(),
        }
    }

    /// Subscribes to the `EngineEvent` stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_sender.subscribe()
    }

    /// A sender handle for the event stream, for owners that subscribe later
    /// without access to the engine.
    pub fn event_sender(&self) -> broadcast::Sender<EngineEvent> {
        self.event_sender.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Pace, SegmentSpec, Stride};
    use crate::time::ManualClock;

    fn engine() -> WorkoutEngine<ManualClock> {
        WorkoutEngine::new(EngineOptions::default(), ManualClock::new())
    }

    fn short_workout() -> Workout {
        Workout::new(
            "Short",
            vec![
                SegmentSpec::new(Pace::WarmUp, 2),
                SegmentSpec::new(Pace::PickItUp, 1),
            ],
        )
    }

    fn drain(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn stale_epoch_ticks_are_dropped() {
        let mut engine = engine();
        engine.load(short_workout(), &Stride::Jog.profile());
        engine.toggle();
        let stale = engine.ticker().tick().unwrap();

        engine.stop();
        assert!(!engine.handle_tick(&stale));
        assert_eq!(engine.timer_elapsed(), 0);

        engine.toggle();
        assert!(!engine.handle_tick(&stale));
        let fresh = engine.ticker().tick().unwrap();
        assert!(engine.handle_tick(&fresh));
        assert_eq!(engine.timer_elapsed(), 2);
    }

    #[test]
    fn paused_engine_ignores_ticks() {
        let mut engine = engine();
        engine.load(short_workout(), &Stride::Jog.profile());
        engine.toggle();
        let tick = engine.ticker().tick().unwrap();
        engine.toggle();

        assert!(!engine.handle_tick(&tick));
        engine.on_tick();
        assert_eq!(engine.timer_elapsed(), 1);
        assert!(!engine.ticker().is_running());
    }

    #[test]
    fn ticker_follows_state() {
        let mut engine = engine();
        engine.load(short_workout(), &Stride::Jog.profile());
        assert!(!engine.ticker().is_running());

        engine.toggle();
        assert!(engine.ticker().is_running());
        assert_eq!(engine.ticker().epoch(), Some(engine.epoch()));

        engine.toggle();
        assert!(!engine.ticker().is_running());

        engine.toggle();
        assert!(engine.ticker().is_running());
        assert_eq!(engine.ticker().epoch(), Some(engine.epoch()));

        engine.on_tick();
        engine.on_tick();
        assert_eq!(engine.state(), EngineState::Stopped);
        assert!(!engine.ticker().is_running());
    }

    #[test]
    fn events_trace_a_full_run() {
        let mut engine = engine();
        let mut rx = engine.subscribe();
        engine.load(short_workout(), &Stride::Jog.profile());
        engine.toggle();
        for _ in 0..3 {
            engine.on_tick();
        }

        let events = drain(&mut rx);
        assert_eq!(
            events[0],
            EngineEvent::WorkoutLoaded {
                name: "Short".into(),
                segment_count: 2,
                total_duration: 3
            }
        );
        assert!(events.contains(&EngineEvent::SegmentCompleted { index: 0 }));
        assert!(events.contains(&EngineEvent::SegmentStarted { index: 1 }));
        assert!(events.contains(&EngineEvent::SegmentCompleted { index: 1 }));
        assert_eq!(
            events.last(),
            Some(&EngineEvent::WorkoutCompleted { name: "Short".into() })
        );
        assert!(events.iter().any(EngineEvent::ends_run));
    }

    #[test]
    fn toggle_without_segments_stays_stopped() {
        let mut engine = engine();
        engine.toggle();
        assert_eq!(engine.state(), EngineState::Stopped);
        assert!(!engine.ticker().is_running());

        engine.load(Workout::new("Empty", Vec::new()), &Stride::Jog.profile());
        engine.toggle();
        assert_eq!(engine.state(), EngineState::Stopped);
        assert!(engine.percentage().is_nan());
        assert_eq!(engine.segment_percentage(), 0.0);
        assert_eq!(engine.current_segment(), &Segment::EMPTY);
    }

    #[test]
    fn lead_in_shifts_displayed_times() {
        let options = EngineOptions {
            include_lead_in: true,
            ..EngineOptions::default()
        };
        let mut engine = WorkoutEngine::new(options, ManualClock::new());
        engine.load(short_workout(), &Stride::Jog.profile());

        assert_eq!(engine.segments().len(), 3);
        assert_eq!(engine.segments()[0].pace, Pace::Start);
        assert_eq!(engine.segments()[0].speed, 0.0);
        assert_eq!(engine.total_duration(), 6);
        assert_eq!(engine.formatted_total(), "00:03");
        assert_eq!(engine.segment_label(), "0 / 2");

        engine.toggle();
        assert_eq!(engine.formatted_elapsed(), "00:00");
        for _ in 0..3 {
            engine.on_tick();
        }
        assert_eq!(engine.current_segment_index(), 1);
        assert_eq!(engine.formatted_elapsed(), "00:01");
        assert_eq!(engine.segment_label(), "1 / 2");
    }

    #[test]
    fn empty_workout_gets_no_lead_in() {
        let options = EngineOptions {
            include_lead_in: true,
            ..EngineOptions::default()
        };
        let mut engine = WorkoutEngine::new(options, ManualClock::new());
        engine.load(Workout::new("Empty", Vec::new()), &Stride::Jog.profile());
        assert!(!engine.is_loaded());
        assert!(!engine.has_lead_in());
    }

    #[test]
    fn select_stride_keeps_run_position() {
        let mut engine = engine();
        engine.load(short_workout(), &Stride::Walk.profile());
        engine.toggle();
        engine.select_stride(&Stride::Run.profile());

        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(engine.timer_elapsed(), 1);
        assert_eq!(engine.current_segment().speed, 3.5);
        assert_eq!(engine.next_segment().speed, 7.5);
        assert_eq!(engine.segment_graph(), &[3.5, 7.5]);
    }
}
