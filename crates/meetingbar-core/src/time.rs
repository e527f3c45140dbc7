//! Time helpers.
//!
//! This module provides [`TimeWindow`] for defining query ranges, and the
//! duration and clock formatting shared by the tray text and notifications.

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};

/// Default look-ahead of an aggregation window.
pub const DEFAULT_LOOKAHEAD_HOURS: i64 = 24;

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a time window starting from now extending the given duration.
    ///
    /// Negative durations produce an empty window at `now`; an end past the
    /// last representable instant is clamped to it.
    pub fn from_now(now: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            start: now,
            end: now
                .checked_add_signed(duration.max(Duration::zero()))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// The default aggregation window: `[now, now + 24h)`.
    pub fn default_lookahead(now: DateTime<Utc>) -> Self {
        Self::from_now(now, Duration::hours(DEFAULT_LOOKAHEAD_HOURS))
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }

    /// Checks if an interval `[start, end)` overlaps with this window.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

/// Formats a duration for the tray, e.g. `"1h 30m"`, `"5m"` or `"<1m"`.
///
/// Non-positive durations render as `"0m"`. Seconds are truncated, so any
/// positive duration under one minute renders as `"<1m"`.
pub fn format_duration(d: Duration) -> String {
    if d <= Duration::zero() {
        return "0m".to_string();
    }

    let total_minutes = d.num_minutes();
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    match (hours, minutes) {
        (0, 0) => "<1m".to_string(),
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Formats an instant as local wall-clock time, `HH:MM`.
pub fn format_clock(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 5, h, min, s).unwrap()
    }

    mod time_window {
        use super::*;

        #[test]
        fn creation() {
            let window = TimeWindow::new(utc(9, 0, 0), utc(17, 0, 0));
            assert_eq!(window.duration(), Duration::hours(8));
        }

        #[test]
        #[should_panic(expected = "start must be <= end")]
        fn invalid_window() {
            TimeWindow::new(utc(17, 0, 0), utc(9, 0, 0));
        }

        #[test]
        fn default_lookahead_is_a_day() {
            let window = TimeWindow::default_lookahead(utc(9, 0, 0));
            assert_eq!(window.start, utc(9, 0, 0));
            assert_eq!(window.duration(), Duration::hours(24));
        }

        #[test]
        fn negative_duration_is_empty() {
            let window = TimeWindow::from_now(utc(9, 0, 0), Duration::minutes(-5));
            assert_eq!(window.duration(), Duration::zero());
        }

        #[test]
        fn huge_duration_clamps_to_max() {
            let window = TimeWindow::from_now(utc(9, 0, 0), Duration::MAX);
            assert_eq!(window.end, DateTime::<Utc>::MAX_UTC);
        }

        #[test]
        fn contains_is_half_open() {
            let window = TimeWindow::new(utc(9, 0, 0), utc(17, 0, 0));
            assert!(window.contains(utc(9, 0, 0)));
            assert!(window.contains(utc(16, 59, 59)));
            assert!(!window.contains(utc(17, 0, 0)));
            assert!(!window.contains(utc(8, 59, 59)));
        }

        #[test]
        fn overlaps() {
            let window = TimeWindow::new(utc(9, 0, 0), utc(17, 0, 0));
            assert!(window.overlaps(utc(8, 0, 0), utc(10, 0, 0)));
            assert!(window.overlaps(utc(16, 0, 0), utc(18, 0, 0)));
            assert!(window.overlaps(utc(8, 0, 0), utc(18, 0, 0)));
            assert!(!window.overlaps(utc(7, 0, 0), utc(9, 0, 0)));
            assert!(!window.overlaps(utc(17, 0, 0), utc(18, 0, 0)));
        }
    }

    mod duration {
        use super::*;

        #[test]
        fn minutes_only() {
            assert_eq!(format_duration(Duration::minutes(5)), "5m");
            assert_eq!(format_duration(Duration::minutes(59)), "59m");
        }

        #[test]
        fn hours_and_minutes() {
            assert_eq!(format_duration(Duration::minutes(90)), "1h 30m");
            assert_eq!(format_duration(Duration::minutes(125)), "2h 5m");
        }

        #[test]
        fn whole_hours() {
            assert_eq!(format_duration(Duration::hours(2)), "2h");
        }

        #[test]
        fn under_a_minute() {
            assert_eq!(format_duration(Duration::seconds(30)), "<1m");
            assert_eq!(format_duration(Duration::seconds(1)), "<1m");
        }

        #[test]
        fn non_positive() {
            assert_eq!(format_duration(Duration::minutes(-1)), "0m");
            assert_eq!(format_duration(Duration::zero()), "0m");
        }

        #[test]
        fn truncates_seconds() {
            assert_eq!(format_duration(Duration::seconds(5 * 60 + 59)), "5m");
        }
    }

    #[test]
    fn clock_is_two_digit() {
        let s = format_clock(utc(9, 5, 0));
        assert_eq!(s.len(), 5);
        assert_eq!(&s[2..3], ":");
    }
}
