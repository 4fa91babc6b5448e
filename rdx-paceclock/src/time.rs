//! Tick sources: the clocks that advance a running workout.

use crate::common::RunEpoch;
use crate::config::ClockResolution;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

/// One tick delivered by a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    /// The epoch the clock was started under.
    pub epoch: RunEpoch,
    /// Ticks fired since that start, beginning at 1.
    pub tick_count: u64,
    pub timestamp: DateTime<Utc>,
}

/// The clock collaborator the engine starts and stops.
///
/// `start` begins (or restarts) ticking for `epoch`; `stop` ends it. After
/// `stop` returns, no new tick for the old run may be produced.
pub trait TickSource: Send {
    fn start(&mut self, epoch: RunEpoch);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// A tokio-driven clock that publishes `TickEvent`s on a broadcast channel.
///
/// Each `start` spawns an interval task whose first tick lands one period
/// later. `stop` aborts it. Ticks already queued in the channel are left for
/// the consumer to discard by epoch.
#[derive(Debug)]
pub struct SystemClock {
    resolution: ClockResolution,
    tick_sender: broadcast::Sender<TickEvent>,
    handle: Option<JoinHandle<()>>,
}

impl SystemClock {
    pub fn new(resolution: ClockResolution, tick_sender: broadcast::Sender<TickEvent>) -> Self {
        Self {
            resolution,
            tick_sender,
            handle: None,
        }
    }

    pub fn resolution(&self) -> &ClockResolution {
        &self.resolution
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TickEvent> {
        self.tick_sender.subscribe()
    }
}

impl TickSource for SystemClock {
    /// Must be called from within a tokio runtime.
    fn start(&mut self, epoch: RunEpoch) {
        self.stop();
        let period = self.resolution.period();
        let sender = self.tick_sender.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick_count = 0u64;
            loop {
                ticker.tick().await;
                tick_count += 1;
                let tick = TickEvent {
                    epoch,
                    tick_count,
                    timestamp: Utc::now(),
                };
                if sender.send(tick).is_err() {
                    trace!("Tick #{} for {} had no receivers.", tick_count, epoch);
                }
            }
        }));
        trace!("SystemClock started for {} at {:?}.", epoch, period);
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            trace!("SystemClock stopped.");
        }
    }

    fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for SystemClock {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A clock that never fires on its own.
///
/// It records how it was driven, which makes it the clock of choice for tests
/// and for synchronous replays where the caller invokes `on_tick` directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualClock {
    running: bool,
    epoch: Option<RunEpoch>,
    starts: usize,
    stops: usize,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The epoch of the most recent `start`.
    pub fn epoch(&self) -> Option<RunEpoch> {
        self.epoch
    }

    pub fn starts(&self) -> usize {
        self.starts
    }

    pub fn stops(&self) -> usize {
        self.stops
    }

    /// Builds the tick this clock would deliver next for its current epoch.
    pub fn tick(&self) -> Option<TickEvent> {
        let epoch = self.epoch.filter(|_| self.running)?;
        Some(TickEvent {
            epoch,
            tick_count: 0,
            timestamp: Utc::now(),
        })
    }
}

impl TickSource for ManualClock {
    fn start(&mut self, epoch: RunEpoch) {
        self.running = true;
        self.epoch = Some(epoch);
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.running = false;
        self.stops += 1;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn manual_clock_records_calls() {
        let mut clock = ManualClock::new();
        assert!(clock.tick().is_none());

        clock.start(RunEpoch(4));
        assert!(clock.is_running());
        assert_eq!(clock.tick().map(|t| t.epoch), Some(RunEpoch(4)));

        clock.stop();
        assert!(!clock.is_running());
        assert!(clock.tick().is_none());
        assert_eq!((clock.starts(), clock.stops()), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn system_clock_ticks_once_per_period() {
        let (sender, mut receiver) = broadcast::channel(16);
        let mut clock = SystemClock::new(ClockResolution::Realtime, sender);
        clock.start(RunEpoch(1));

        let first = receiver.recv().await.unwrap();
        let second = receiver.recv().await.unwrap();
        assert_eq!((first.epoch, first.tick_count), (RunEpoch(1), 1));
        assert_eq!(second.tick_count, 2);
        clock.stop();
        assert!(!clock.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_system_clock_goes_quiet() {
        let (sender, mut receiver) = broadcast::channel(16);
        let mut clock = SystemClock::new(ClockResolution::Realtime, sender);
        clock.start(RunEpoch(1));
        clock.stop();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(matches!(
            receiver.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_uses_the_new_epoch() {
        let (sender, mut receiver) = broadcast::channel(16);
        let mut clock = SystemClock::new(ClockResolution::Realtime, sender);
        clock.start(RunEpoch(1));
        clock.start(RunEpoch(2));

        let tick = receiver.recv().await.unwrap();
        assert_eq!(tick.epoch, RunEpoch(2));
    }
}
