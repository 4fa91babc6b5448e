//! Clock text and segment counters for display.

use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: i64 = 3600;

/// How elapsed and total times are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// `MM:SS` below one hour, `H:MM:SS` from one hour on.
    #[default]
    Auto,
    /// Always `MM:SS`; minutes grow past 59 (`75:00`).
    MinutesSeconds,
}

/// Renders `seconds` as clock text. Negative values show as zero.
pub fn format_clock(seconds: i64, format: TimeFormat) -> String {
    let seconds = seconds.max(0);
    match format {
        TimeFormat::Auto if seconds >= SECONDS_PER_HOUR => format!(
            "{}:{:02}:{:02}",
            seconds / SECONDS_PER_HOUR,
            (seconds % SECONDS_PER_HOUR) / 60,
            seconds % 60
        ),
        _ => format!("{:02}:{:02}", seconds / 60, seconds % 60),
    }
}

/// The "n / count" counter shown next to the clock.
///
/// Numbering is 1-based over authored segments. When the workout carries a
/// lead-in at index 0, it is not counted and shows as `0`. Once the cursor
/// has run off the end the counter stays on the last segment.
pub fn segment_label(index: usize, segment_count: usize, has_lead_in: bool) -> String {
    let (number, total) = if has_lead_in {
        (index, segment_count.saturating_sub(1))
    } else {
        (index + 1, segment_count)
    };
    format!("{} / {}", number.min(total), total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_times_are_minutes_and_seconds() {
        assert_eq!(format_clock(0, TimeFormat::Auto), "00:00");
        assert_eq!(format_clock(65, TimeFormat::Auto), "01:05");
        assert_eq!(format_clock(3599, TimeFormat::Auto), "59:59");
    }

    #[test]
    fn auto_switches_to_hours() {
        assert_eq!(format_clock(3600, TimeFormat::Auto), "1:00:00");
        assert_eq!(format_clock(3725, TimeFormat::Auto), "1:02:05");
        assert_eq!(format_clock(4500, TimeFormat::MinutesSeconds), "75:00");
    }

    #[test]
    fn negative_clamps_to_zero() {
        assert_eq!(format_clock(-3, TimeFormat::Auto), "00:00");
        assert_eq!(format_clock(-3, TimeFormat::MinutesSeconds), "00:00");
    }

    #[test]
    fn segment_label_is_one_based() {
        assert_eq!(segment_label(0, 4, false), "1 / 4");
        assert_eq!(segment_label(3, 4, false), "4 / 4");
        assert_eq!(segment_label(4, 4, false), "4 / 4");
    }

    #[test]
    fn lead_in_is_not_counted() {
        assert_eq!(segment_label(0, 5, true), "0 / 4");
        assert_eq!(segment_label(1, 5, true), "1 / 4");
        assert_eq!(segment_label(0, 0, false), "0 / 0");
    }
}
