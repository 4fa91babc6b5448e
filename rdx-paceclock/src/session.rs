//! The async driver that connects a `WorkoutEngine` to a `SystemClock`.

use crate::config::PaceClockConfig;
use crate::engine::{EngineSnapshot, EngineState, WorkoutEngine};
use crate::events::EngineEvent;
use crate::model::{StrideProfile, Workout};
use crate::time::{SystemClock, TickEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, warn};

const TICK_CHANNEL_CAPACITY: usize = 64;

/// A shareable handle to a running workout engine.
///
/// `WorkoutSession` is designed to be cloned and handed to every task that
/// needs to control or observe the workout. All operations serialize on one
/// lock, so ticks and control calls never interleave.
#[derive(Clone)]
pub struct WorkoutSession {
    engine: Arc<RwLock<WorkoutEngine<SystemClock>>>,
    tick_sender: broadcast::Sender<TickEvent>,
    event_sender: broadcast::Sender<EngineEvent>,
}

impl WorkoutSession {
    /// Creates a session with nothing loaded.
    pub fn new(config: &PaceClockConfig) -> Self {
        let (tick_sender, _) = broadcast::channel(TICK_CHANNEL_CAPACITY);
        let clock = SystemClock::new(config.resolution.clone(), tick_sender.clone());
        let engine = WorkoutEngine::new(config.engine_options(), clock);
        let event_sender = engine.event_sender();
        Self {
            engine: Arc::new(RwLock::new(engine)),
            tick_sender,
            event_sender,
        }
    }

    /// Runs the dispatcher loop until `shutdown_rx` fires.
    ///
    /// Every tick from the clock is forwarded to the engine, which drops ticks
    /// from stale epochs. On exit the engine is stopped.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let mut tick_rx = self.tick_sender.subscribe();
        info!("WorkoutSession dispatcher running.");
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                received = tick_rx.recv() => match received {
                    Ok(tick) => {
                        self.engine.write().await.handle_tick(&tick);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Dispatcher lagged behind the clock; {} ticks skipped.", skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        self.engine.write().await.stop();
        info!("WorkoutSession dispatcher stopped.");
        Ok(())
    }

    /// Runs the dispatcher until Ctrl+C is pressed.
    pub async fn run_until_ctrl_c(&self) -> anyhow::Result<()> {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let dispatcher = self.clone();
        let handle = tokio::spawn(async move { dispatcher.run(shutdown_rx).await });

        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received.");
        if shutdown_tx.send(()).is_err() {
            error!("Failed to send shutdown signal; the dispatcher already exited.");
        }
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(joined) => joined??,
            Err(_) => warn!("Dispatcher did not stop within a second."),
        }
        Ok(())
    }

    pub async fn load(&self, workout: Workout, profile: &StrideProfile) {
        self.engine.write().await.load(workout, profile);
    }

    pub async fn toggle(&self) -> EngineState {
        let mut engine = self.engine.write().await;
        engine.toggle();
        engine.state()
    }

    pub async fn stop(&self) {
        self.engine.write().await.stop();
    }

    pub async fn select_stride(&self, profile: &StrideProfile) {
        self.engine.write().await.select_stride(profile);
    }

    pub async fn state(&self) -> EngineState {
        self.engine.read().await.state()
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        self.engine.read().await.snapshot()
    }

    /// Subscribes to the `EngineEvent` stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_sender.subscribe()
    }
}
