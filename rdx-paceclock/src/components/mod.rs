//! Contains the building blocks front ends use to react to a running workout.
//!
//! Watchers sit outside the engine: they observe ticks or snapshots and tell
//! the caller when something worth announcing happened. The engine never
//! depends on them.

pub mod watcher;
