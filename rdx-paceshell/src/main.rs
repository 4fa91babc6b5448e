use anyhow::Result;
use colored::Colorize;
use paceclock::library::WorkoutLibrary;
use paceclock::prelude::*;
use paceclock::{ENGINE_NAME, VERSION as LIB_VERSION};
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");
const GRAPH_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct ShellHighlighter;

impl Highlighter for ShellHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            Cow::Owned(format!("{} {}", command.yellow().bold(), rest.yellow()))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    println!("{}", "  paceshell :: interval workout console".cyan().bold());
    println!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    println!(
        "{}",
        "    This software is provided 'as is', without warranty of any kind.\n    Distributed under the MIT OR Apache-2.0 license. Use at your own risk."
            .dimmed()
    );
    println!("{}", "-".repeat(79).dimmed());
}

/// Spawns the task that prints engine events and countdown cues.
fn spawn_event_listener(
    session: &WorkoutSession,
    countdown_threshold: u32,
    is_listening_to_ticks: Arc<AtomicBool>,
) {
    let mut events = session.subscribe();
    tokio::spawn(async move {
        let mut countdown = CountdownWatcher::new(countdown_threshold);
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            };
            match event {
                EngineEvent::Ticked {
                    timer_elapsed,
                    segment_index,
                    segment_remaining,
                } => {
                    if let Some(cue) = countdown.process_tick(segment_index, segment_remaining) {
                        println!("<-- {}", cue.to_string().yellow().bold());
                    } else if is_listening_to_ticks.load(Ordering::Relaxed) {
                        println!("<-- [TICK] {}s, segment {} has {}s left", timer_elapsed, segment_index + 1, segment_remaining);
                    }
                }
                EngineEvent::WorkoutCompleted { name } => {
                    countdown.reset();
                    println!("\n<-- {} '{}'\n>> ", "[DONE]".green().bold(), name);
                }
                EngineEvent::StateChanged { from, to } => {
                    if to == EngineState::Stopped {
                        countdown.reset();
                    }
                    println!("<-- [STATE] {} -> {}", from, to);
                }
                other => println!("<-- [EVENT] {:?}", other),
            }
        }
    });
}

fn print_status(snapshot: &EngineSnapshot) {
    if snapshot.segments.is_empty() {
        println!("No workout loaded. Use 'list' and 'load <N>'.");
        return;
    }
    println!(
        "{} [{}]  {} / {}  ({:.0}% left)",
        snapshot.workout_name.cyan().bold(),
        snapshot.state,
        snapshot.formatted_elapsed,
        snapshot.formatted_total,
        snapshot.percentage.max(0.0)
    );
    let current = &snapshot.current_segment;
    println!(
        "  segment {}: {} at {:.1}, {} left ({:.0}%)",
        snapshot.segment_label,
        current.pace.label().bold(),
        current.speed,
        snapshot.formatted_segment_remaining,
        snapshot.segment_percentage.max(0.0)
    );
    println!(
        "  next: {} at {:.1}   clock {}",
        snapshot.next_segment.pace.label(),
        snapshot.next_segment.speed,
        chrono::Local::now().format("%H:%M")
    );
}

fn print_segments(snapshot: &EngineSnapshot) {
    for (index, segment) in snapshot.segments.iter().enumerate() {
        let marker = match segment.completed {
            Some(true) => "✓".green(),
            Some(false) => "▶".yellow().bold(),
            None => " ".normal(),
        };
        println!(
            "  {} {:>3}. {:<12} {:>5.1}  {:>5}s  [{}..{}]",
            marker,
            index + 1,
            segment.pace.label(),
            segment.speed,
            segment.planned_duration,
            segment.start_offset,
            segment.end_offset
        );
    }
}

fn render_graph(graph: &[f64]) -> String {
    let max = graph.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return String::new();
    }
    graph
        .iter()
        .map(|speed| {
            let level = ((speed / max) * (GRAPH_BARS.len() - 1) as f64).round() as usize;
            GRAPH_BARS[level.min(GRAPH_BARS.len() - 1)]
        })
        .collect()
}

fn load_library(config: &PaceClockConfig) -> WorkoutLibrary {
    let dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.workouts_dir.clone());
    match dir {
        Some(dir) => match WorkoutLibrary::load_dir(&dir) {
            Ok(library) => {
                info!("Found {} workouts in {}.", library.len(), dir.display());
                library
            }
            Err(err) => {
                eprintln!("{} {:#}", "Could not read workouts:".red(), err);
                WorkoutLibrary::new()
            }
        },
        None => WorkoutLibrary::new(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config_path = env::var_os("PACECLOCK_CONFIG").map(PathBuf::from);
    let config = PaceClockConfig::load(config_path.as_deref())?;
    let library = load_library(&config);
    let mut stride = config.stride;

    let session = WorkoutSession::new(&config);
    let is_listening_to_ticks = Arc::new(AtomicBool::new(false));
    spawn_event_listener(&session, config.countdown_threshold, is_listening_to_ticks.clone());

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let dispatcher = session.clone();
    info!("Spawning {} in the background...", ENGINE_NAME.cyan());
    let dispatcher_handle = tokio::spawn(async move {
        if let Err(e) = dispatcher.run(shutdown_rx).await {
            eprintln!("\nEngine stopped with an error: {}", e);
        }
    });

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ShellHighlighter));

    println!("{} is ready. Type 'help' for commands or 'exit' to quit.", ENGINE_NAME.cyan());

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(_) => {
                println!("Exiting paceshell...");
                break;
            }
        };
        rl.add_history_entry(line.as_str())?;
        let args = line.split_whitespace().collect::<Vec<_>>();
        let Some(command) = args.first() else {
            continue;
        };

        match *command {
            "list" => {
                if library.is_empty() {
                    println!("No workouts. Start the shell with a workouts directory.");
                }
                for (handle, (_, workout)) in library.iter().enumerate() {
                    println!(
                        "  #{:<3} {:<30} {:>4} segments",
                        handle,
                        workout.name,
                        workout.segments.len()
                    );
                }
            }
            "load" => {
                let Some(target) = args.get(1) else {
                    println!("Usage: load <HANDLE|NAME>");
                    continue;
                };
                let workout = match target.parse::<usize>() {
                    Ok(handle) => library
                        .ids()
                        .get(handle)
                        .and_then(|id| library.get(*id)),
                    Err(_) => library.find_by_name(&args[1..].join(" ")).map(|(_, w)| w),
                };
                match workout {
                    Some(workout) => {
                        if session.state().await != EngineState::Stopped {
                            println!("Stop the current workout before loading another.");
                            continue;
                        }
                        session.load(workout.clone(), &stride.profile()).await;
                        println!("--> Loaded '{}' ({} stride).", workout.name, stride);
                    }
                    None => println!("Error: no workout '{}'. Use 'list'.", target),
                }
            }
            "stride" => match args.get(1).map(|s| s.parse::<Stride>()) {
                Some(Ok(choice)) => {
                    stride = choice;
                    session.select_stride(&stride.profile()).await;
                    println!("--> Stride set to {}.", stride);
                }
                Some(Err(err)) => println!("Error: {}", err),
                None => println!("Current stride: {} (walk, jog, run)", stride),
            },
            "toggle" | "go" | "pause" => {
                let state = session.toggle().await;
                println!("--> Workout is {}.", state);
            }
            "stop" => {
                session.stop().await;
                println!("--> Workout stopped.");
            }
            "status" => print_status(&session.snapshot().await),
            "segments" => print_segments(&session.snapshot().await),
            "graph" => {
                let snapshot = session.snapshot().await;
                println!("  {}", render_graph(&snapshot.segment_graph).magenta());
            }
            "ticks" => match args.get(1) {
                Some(&"on") => {
                    is_listening_to_ticks.store(true, Ordering::Relaxed);
                    println!("--> Printing every tick.");
                }
                Some(&"off") => {
                    is_listening_to_ticks.store(false, Ordering::Relaxed);
                    println!("--> Tick printing off.");
                }
                _ => println!("Usage: ticks <on|off>"),
            },
            "help" => {
                println!("Available commands:");
                println!("  list                  - Shows available workouts and their handles.");
                println!("  load <N|NAME>         - Loads a workout (only while stopped).");
                println!("  stride [walk|jog|run] - Shows or changes the stride profile.");
                println!("  toggle | go | pause   - Starts, pauses or resumes the workout.");
                println!("  stop                  - Stops and rewinds the workout.");
                println!("  status                - Shows clocks and the current segment.");
                println!("  segments              - Lists segments with their progress.");
                println!("  graph                 - Draws the speed-over-time chart.");
                println!("  ticks <on|off>        - Prints every tick.");
                println!("  exit                  - Quits the shell.");
            }
            "exit" => break,
            _ => println!("Unknown command: '{}'. Type 'help'.", line.trim()),
        }
    }

    shutdown_tx.send(()).ok();
    dispatcher_handle.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_scales_to_the_fastest_sample() {
        assert_eq!(render_graph(&[2.0, 4.0, 8.0]), "▃▅█");
        assert_eq!(render_graph(&[]), "");
        assert_eq!(render_graph(&[0.0, 0.0]), "");
    }
}
