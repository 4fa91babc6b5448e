//! Contains common, primitive types shared across the engine.
//!
//! `RunEpoch` identifies one uninterrupted stretch of ticking, `WorkoutId`
//! identifies a workout held by a `WorkoutLibrary`. Distinct types keep the two
//! counters from being mixed up with plain integers.

use serde::Serialize;
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Uniquely and safely identifies a workout stored in a `WorkoutLibrary`.
    ///
    /// Keys are never reused, so a handle kept by a front end cannot silently
    /// point at a different workout after the library changes.
    pub struct WorkoutId;
}

/// Generation counter for tick subscriptions.
///
/// The engine bumps its epoch whenever ticking starts, pauses, stops or the
/// workout is replaced. A tick source stamps every tick with the epoch it was
/// started under, so a tick that was already in flight when the run changed
/// can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct RunEpoch(pub u64);

impl RunEpoch {
    /// Returns the epoch that follows this one.
    pub fn next(self) -> Self {
        RunEpoch(self.0.wrapping_add(1))
    }
}

impl fmt::Display for RunEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_epoch_is_strictly_greater() {
        let epoch = RunEpoch::default();
        assert_eq!(epoch.next(), RunEpoch(1));
        assert!(epoch.next() > epoch);
    }

    #[test]
    fn epoch_display_is_tagged() {
        assert_eq!(RunEpoch(7).to_string(), "epoch#7");
    }
}
