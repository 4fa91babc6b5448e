use anyhow::{bail, Context, Result};
use colored::Colorize;
use paceclock::library::WorkoutLibrary;
use paceclock::prelude::*;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Plays one workout file headlessly and logs what the engine does.
///
/// Usage: `pacedev <workout.json> [config.toml]`
#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // 2. Read arguments and configuration.
    let mut args = std::env::args().skip(1);
    let Some(workout_path) = args.next().map(PathBuf::from) else {
        bail!("usage: pacedev <workout.json> [config.toml]");
    };
    let config_path = args.next().map(PathBuf::from);
    let config = PaceClockConfig::load(config_path.as_deref())?;
    let workout = WorkoutLibrary::load_file(&workout_path)
        .with_context(|| format!("cannot play {}", workout_path.display()))?;

    // 3. Create the session and watch its events.
    let session = WorkoutSession::new(&config);
    let mut events = session.subscribe();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let dispatcher = session.clone();
    let dispatcher_handle = tokio::spawn(async move { dispatcher.run(shutdown_rx).await });

    // 4. Load and start.
    info!(
        "Playing '{}' with the {} stride at {:?}.",
        workout.name.cyan(),
        config.stride,
        config.resolution
    );
    session.load(workout, &config.stride.profile()).await;
    session.toggle().await;

    let mut countdown = CountdownWatcher::new(config.countdown_threshold);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted.");
                break;
            }
            received = events.recv() => {
                let event = match received {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                match &event {
                    EngineEvent::Ticked { segment_index, segment_remaining, .. } => {
                        if let Some(cue) = countdown.process_tick(*segment_index, *segment_remaining) {
                            info!("{}", cue.to_string().yellow().bold());
                        }
                    }
                    EngineEvent::SegmentStarted { .. } => {
                        let snapshot = session.snapshot().await;
                        let segment = &snapshot.current_segment;
                        info!(
                            "[{}] {} at {:.1} for {}s (next {:.1})",
                            snapshot.segment_label,
                            segment.pace.label().bold(),
                            segment.speed,
                            segment.planned_duration,
                            snapshot.next_segment.speed
                        );
                    }
                    EngineEvent::WorkoutCompleted { name } => {
                        info!("{} '{}'", "Completed".green().bold(), name);
                        break;
                    }
                    other => info!("[EVENT] => {:?}", other),
                }
            }
        }
    }

    shutdown_tx.send(()).ok();
    dispatcher_handle.await??;
    Ok(())
}
