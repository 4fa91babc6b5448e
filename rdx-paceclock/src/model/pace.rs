//! Pace categories and their display attributes.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A named effort level a segment is run at.
///
/// Authored workouts refer to paces by ordinal (`0` is warm up, `5` is cool
/// down). `Start` has no ordinal: it only exists as the synthetic lead-in the
/// engine may prepend to a workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Pace {
    Start,
    WarmUp,
    #[default]
    NiceSteady,
    PickItUp,
    ToTheMax,
    WalkItOut,
    CoolDown,
}

impl Pace {
    /// The paces a workout author can use, in ordinal order.
    pub const AUTHORED: [Pace; 6] = [
        Pace::WarmUp,
        Pace::NiceSteady,
        Pace::PickItUp,
        Pace::ToTheMax,
        Pace::WalkItOut,
        Pace::CoolDown,
    ];

    /// Looks up an authored pace by its ordinal.
    pub fn from_index(index: u64) -> Option<Pace> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::AUTHORED.get(i))
            .copied()
    }

    /// The ordinal used in workout files. `None` for the synthetic lead-in.
    pub fn index(self) -> Option<usize> {
        Self::AUTHORED.iter().position(|pace| *pace == self)
    }

    /// Human-readable name, as announced to the runner.
    pub fn label(self) -> &'static str {
        match self {
            Pace::Start => "start",
            Pace::WarmUp => "warm up",
            Pace::NiceSteady => "nice steady",
            Pace::PickItUp => "pick it up",
            Pace::ToTheMax => "to the max",
            Pace::WalkItOut => "walk it out",
            Pace::CoolDown => "cool down",
        }
    }

    /// Display colour used by renderers for this pace.
    pub fn color(self) -> &'static str {
        match self {
            Pace::Start => "#9e9e9e",
            Pace::WarmUp => "#f84d04",
            Pace::NiceSteady => "#ac4ffc",
            Pace::PickItUp => "#8504f6",
            Pace::ToTheMax => "#5f03b0",
            Pace::WalkItOut => "#cf9bfd",
            Pace::CoolDown => "#04a5f6",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Pace::Start => "start",
            Pace::WarmUp => "warm_up",
            Pace::NiceSteady => "nice_steady",
            Pace::PickItUp => "pick_it_up",
            Pace::ToTheMax => "to_the_max",
            Pace::WalkItOut => "walk_it_out",
            Pace::CoolDown => "cool_down",
        }
    }
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Pace {
    type Err = String;

    /// Accepts an ordinal (`"2"`), a key (`"pick_it_up"`) or a label (`"pick it up"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(index) = trimmed.parse::<u64>() {
            return Pace::from_index(index).ok_or_else(|| format!("unknown pace ordinal {index}"));
        }
        let normalized = trimmed.to_ascii_lowercase().replace([' ', '-'], "_");
        std::iter::once(Pace::Start)
            .chain(Pace::AUTHORED)
            .find(|pace| pace.key() == normalized)
            .ok_or_else(|| format!("unknown pace '{trimmed}'"))
    }
}

impl Serialize for Pace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.index() {
            Some(index) => serializer.serialize_u64(index as u64),
            None => serializer.serialize_str(self.key()),
        }
    }
}

struct PaceVisitor;

impl<'de> Visitor<'de> for PaceVisitor {
    type Value = Pace;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a pace ordinal between 0 and 5 or a pace name")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Pace, E> {
        Pace::from_index(value)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(value), &self))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Pace, E> {
        u64::try_from(value)
            .ok()
            .and_then(Pace::from_index)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Pace, E> {
        value
            .parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
    }
}

impl<'de> Deserialize<'de> for Pace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PaceVisitor)
    }
}
