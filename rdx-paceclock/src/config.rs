//! Defines all configuration structures for the Paceclock engine.
//!
//! `PaceClockConfig` is deserialized with `serde` through the `config` crate:
//! an optional TOML file, overlaid by `PACECLOCK_*` environment variables
//! (for example `PACECLOCK_INCLUDE_LEAD_IN=true`).

use crate::engine::EngineOptions;
use crate::format::TimeFormat;
use crate::model::Stride;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The top-level configuration for a workout session.
#[derive(Debug, Clone, Deserialize)]
pub struct PaceClockConfig {
    /// How fast the `SystemClock` delivers ticks.
    #[serde(default)]
    pub resolution: ClockResolution,

    /// Prepend a synthetic `start` segment before the first authored one.
    #[serde(default)]
    pub include_lead_in: bool,

    /// Length of the lead-in, in seconds.
    #[serde(default = "default_lead_in_seconds")]
    pub lead_in_seconds: u32,

    #[serde(default)]
    pub time_format: TimeFormat,

    /// Stride used when a workout is loaded without an explicit choice.
    #[serde(default)]
    pub stride: Stride,

    /// Remaining seconds at which countdown cues begin.
    #[serde(default = "default_countdown_threshold")]
    pub countdown_threshold: u32,

    /// Directory holding workout `*.json` files.
    #[serde(default)]
    pub workouts_dir: Option<PathBuf>,
}

/// Defines the operational speed of the `SystemClock`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockResolution {
    /// One tick per second. What a real workout runs at.
    #[default]
    Realtime,
    /// Ten ticks per second. Handy for rehearsing a workout.
    Accelerated,
    /// A user-defined speed in ticks per second.
    Custom { ticks_per_second: u64 },
}

impl ClockResolution {
    /// Time between two ticks.
    pub fn period(&self) -> Duration {
        match self {
            ClockResolution::Realtime => Duration::from_secs(1),
            ClockResolution::Accelerated => Duration::from_millis(100),
            ClockResolution::Custom { ticks_per_second } => {
                Duration::from_secs(1) / (*ticks_per_second).clamp(1, 1000) as u32
            }
        }
    }
}

impl PaceClockConfig {
    /// Loads configuration from `path` (if any) and the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("PACECLOCK").try_parsing(true));

        let settings = builder
            .build()
            .with_context(|| match path {
                Some(path) => format!("failed to read configuration from {}", path.display()),
                None => "failed to read configuration from the environment".to_string(),
            })?;
        settings
            .try_deserialize()
            .context("configuration has invalid values")
    }

    /// The subset of settings the engine itself needs.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            include_lead_in: self.include_lead_in,
            lead_in_seconds: self.lead_in_seconds,
            time_format: self.time_format,
        }
    }
}

impl Default for PaceClockConfig {
    fn default() -> Self {
        Self {
            resolution: ClockResolution::default(),
            include_lead_in: false,
            lead_in_seconds: default_lead_in_seconds(),
            time_format: TimeFormat::default(),
            stride: Stride::default(),
            countdown_threshold: default_countdown_threshold(),
            workouts_dir: None,
        }
    }
}

// --- Default value functions for serde ---

fn default_lead_in_seconds() -> u32 {
    3
}

fn default_countdown_threshold() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn periods_follow_resolution() {
        assert_eq!(ClockResolution::Realtime.period(), Duration::from_secs(1));
        assert_eq!(ClockResolution::Accelerated.period(), Duration::from_millis(100));
        assert_eq!(
            ClockResolution::Custom { ticks_per_second: 4 }.period(),
            Duration::from_millis(250)
        );
        assert_eq!(
            ClockResolution::Custom { ticks_per_second: 0 }.period(),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn defaults_without_a_file() {
        let config = PaceClockConfig::default();
        assert_eq!(config.lead_in_seconds, 3);
        assert_eq!(config.countdown_threshold, 5);
        assert_eq!(config.stride, Stride::Jog);
        assert!(!config.include_lead_in);
        assert_eq!(config.resolution, ClockResolution::Realtime);
    }

    #[test]
    fn loads_values_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
resolution = "accelerated"
include_lead_in = true
time_format = "minutes_seconds"
stride = "run"
workouts_dir = "/srv/workouts"
"#
        )
        .unwrap();

        let config = PaceClockConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.resolution, ClockResolution::Accelerated);
        assert!(config.include_lead_in);
        assert_eq!(config.lead_in_seconds, 3);
        assert_eq!(config.time_format, TimeFormat::MinutesSeconds);
        assert_eq!(config.stride, Stride::Run);
        assert_eq!(config.workouts_dir, Some(PathBuf::from("/srv/workouts")));

        let options = config.engine_options();
        assert!(options.include_lead_in);
        assert_eq!(options.time_format, TimeFormat::MinutesSeconds);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = PaceClockConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(result.is_err());
    }
}
