//! Stride profiles: how fast each pace is for a given kind of runner.

use crate::model::pace::Pace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// An immutable mapping from pace to speed (mph in the bundled catalogue).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrideProfile {
    speeds: BTreeMap<Pace, f64>,
}

impl StrideProfile {
    /// Builds a profile from one speed per authored pace, in ordinal order.
    pub fn new(
        warm_up: f64,
        nice_steady: f64,
        pick_it_up: f64,
        to_the_max: f64,
        walk_it_out: f64,
        cool_down: f64,
    ) -> Self {
        let speeds = [warm_up, nice_steady, pick_it_up, to_the_max, walk_it_out, cool_down];
        Self::from_pairs(Pace::AUTHORED.into_iter().zip(speeds))
    }

    /// Builds a profile from explicit pairs. Paces left out resolve to `0.0`.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Pace, f64)>) -> Self {
        Self {
            speeds: pairs.into_iter().collect(),
        }
    }

    /// The speed for `pace`, or `0.0` when the profile has no entry for it.
    pub fn resolve_speed(&self, pace: Pace) -> f64 {
        self.speeds.get(&pace).copied().unwrap_or(0.0)
    }
}

/// Free-function form of [`StrideProfile::resolve_speed`].
pub fn resolve_speed(pace: Pace, profile: &StrideProfile) -> f64 {
    profile.resolve_speed(pace)
}

/// The bundled stride catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stride {
    Walk,
    #[default]
    Jog,
    Run,
}

impl Stride {
    pub const ALL: [Stride; 3] = [Stride::Walk, Stride::Jog, Stride::Run];

    pub fn profile(self) -> StrideProfile {
        match self {
            Stride::Walk => StrideProfile::new(2.5, 3.0, 3.5, 4.0, 2.5, 2.5),
            Stride::Jog => StrideProfile::new(3.5, 5.0, 6.5, 7.5, 3.5, 3.5),
            Stride::Run => StrideProfile::new(3.5, 5.0, 7.5, 9.0, 3.5, 3.5),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stride::Walk => "walk",
            Stride::Jog => "jog",
            Stride::Run => "run",
        }
    }
}

impl fmt::Display for Stride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Stride::ALL
            .into_iter()
            .find(|stride| stride.name() == wanted)
            .ok_or_else(|| format!("unknown stride '{}' (expected walk, jog or run)", s.trim()))
    }
}
