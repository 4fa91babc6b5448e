//! # Paceclock
//!
//! A tick-driven interval workout timer engine for Rust.
//!
//! Paceclock turns a workout definition (an ordered list of paced segments)
//! into a running countdown: it tracks elapsed time, resolves the current and
//! next segment, flags completed segments, and exposes the derived values a
//! front end needs to draw progress rings, clocks and a speed chart.
//!
//! ## Core Concepts
//!
//! - **Workout**: a name plus ordered `SegmentSpec`s (a pace and a duration).
//! - **Stride**: a named profile mapping every pace to a speed. Switching the
//!   stride re-derives every segment speed of the loaded workout.
//! - **WorkoutEngine**: the state machine (`Stopped`, `Running`, `Paused`). It is
//!   driven by `load`, `toggle` and `stop`, and advanced by one-second ticks.
//! - **TickSource**: the clock collaborator. `SystemClock` ticks on tokio;
//!   `ManualClock` never fires and leaves ticking to the caller.
//! - **Run epochs**: every start, pause, stop or load bumps the engine's epoch,
//!   and ticks carrying an older epoch are dropped.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use paceclock::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Load configuration (defaults when no file is given).
//!     let config = PaceClockConfig::load(None)?;
//!
//!     // 2. Create the session and listen to engine events.
//!     let session = WorkoutSession::new(&config);
//!     let mut events = session.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Engine event: {:?}", event);
//!         }
//!     });
//!
//!     // 3. Load a workout and start it.
//!     let workout: Workout = serde_json::from_str(
//!         r#"{ "name": "Quick", "segments": [{ "pace": 0, "time": 60 }] }"#,
//!     )?;
//!     session.load(workout, &Stride::Jog.profile()).await;
//!     session.toggle().await;
//!
//!     // 4. Drive ticks until Ctrl+C.
//!     session.run_until_ctrl_c().await
//! }
//! ```

pub const ENGINE_NAME: &str = "Pace Engine";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod events;
pub mod format;
pub mod library;
pub mod model;
pub mod session;
pub mod time;

/// A prelude module for easy importing of the most common Paceclock types.
pub mod prelude {
    pub use crate::common::{RunEpoch, WorkoutId};
    pub use crate::components::watcher::{CountdownWatcher, SegmentChangeWatcher};
    pub use crate::config::{ClockResolution, PaceClockConfig};
    pub use crate::engine::{EngineOptions, EngineSnapshot, EngineState, WorkoutEngine};
    pub use crate::events::EngineEvent;
    pub use crate::format::TimeFormat;
    pub use crate::library::WorkoutLibrary;
    pub use crate::model::{
        build_segments, resolve_speed, Pace, Segment, SegmentPlan, SegmentSpec, Stride,
        StrideProfile, Workout,
    };
    pub use crate::session::WorkoutSession;
    pub use crate::time::{ManualClock, SystemClock, TickEvent, TickSource};
}
