//! Raw event type from calendar sources.
//!
//! [`RawEvent`] is the source-agnostic shape of an event before
//! normalization. Every field a source may omit is optional here; the
//! normalizer decides what to do with gaps.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use meetingbar_core::TimeWindow;
use serde::{Deserialize, Serialize};

/// The time specification for a raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum RawEventTime {
    /// A specific instant.
    DateTime(DateTime<Utc>),
    /// A date without time of day (all-day events).
    Date(NaiveDate),
}

impl RawEventTime {
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Approximate instant, dates at midnight UTC. Only used for window checks.
    fn approx_utc(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::Date(date) => date.and_time(chrono::NaiveTime::MIN).and_utc(),
        }
    }
}

/// Conference data attached to an event by the calendar service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConferenceData {
    /// The conference solution name (e.g., "Google Meet").
    pub solution_name: Option<String>,
    /// Entry points for joining the conference.
    pub entry_points: Vec<RawEntryPoint>,
}

/// An entry point for joining a conference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntryPoint {
    /// The kind of entry point ("video", "phone", "sip", "more").
    pub entry_point_type: String,
    pub uri: Option<String>,
    pub label: Option<String>,
}

impl RawEntryPoint {
    pub fn new(entry_point_type: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            entry_point_type: entry_point_type.into(),
            uri: Some(uri.into()),
            label: None,
        }
    }

    pub fn is_video(&self) -> bool {
        self.entry_point_type.eq_ignore_ascii_case("video")
    }
}

/// A raw calendar event from a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Identifier of this occurrence within the source.
    pub id: String,
    /// When the event starts; `None` if the source gave nothing usable.
    pub start: Option<RawEventTime>,
    /// When the event ends.
    pub end: Option<RawEventTime>,
    /// The event title.
    pub summary: Option<String>,
    /// The event description (may contain HTML).
    pub description: Option<String>,
    pub location: Option<String>,
    /// Status as reported by the source ("confirmed", "tentative", "cancelled").
    pub status: Option<String>,
    pub conference_data: Option<RawConferenceData>,
    /// The calendar this event belongs to.
    pub calendar_id: String,
    /// The account or backend this calendar belongs to.
    pub account_id: String,
}

impl RawEvent {
    /// Creates a new raw event with a start and end.
    pub fn new(
        id: impl Into<String>,
        start: RawEventTime,
        end: RawEventTime,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            start: Some(start),
            end: Some(end),
            summary: None,
            description: None,
            location: None,
            status: None,
            conference_data: None,
            calendar_id: calendar_id.into(),
            account_id: String::new(),
        }
    }

    /// Returns the effective title, falling back to "(No title)" if empty.
    pub fn effective_title(&self) -> &str {
        self.summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("(No title)")
    }

    /// Returns true if the event is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }

    /// Returns true if this is an all-day event.
    pub fn is_all_day(&self) -> bool {
        self.start.is_some_and(|s| s.is_all_day())
    }

    /// Returns true if the event may overlap `window`.
    ///
    /// Dates are compared with a day of slack on each side. Events without a
    /// start are kept so the normalizer can reject and count them.
    pub fn may_overlap(&self, window: &TimeWindow) -> bool {
        let Some(start) = self.start else {
            return true;
        };
        let slack = if start.is_all_day() {
            Duration::days(1)
        } else {
            Duration::zero()
        };
        let start = start.approx_utc();
        let end = self
            .end
            .map(|e| e.approx_utc())
            .filter(|e| *e > start)
            .unwrap_or(start + Duration::hours(1));
        start - slack < window.end && end + slack > window.start
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Builder method to set conference data.
    pub fn with_conference_data(mut self, conference_data: RawConferenceData) -> Self {
        self.conference_data = Some(conference_data);
        self
    }

    /// Builder method to set the account.
    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self
    }

    /// Builder method to override the start.
    pub fn with_start(mut self, start: Option<RawEventTime>) -> Self {
        self.start = start;
        self
    }

    /// Builder method to override the end.
    pub fn with_end(mut self, end: Option<RawEventTime>) -> Self {
        self.end = end;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> RawEvent {
        let start = Utc.with_ymd_and_hms(2025, 2, 5, 10, 0, 0).unwrap();
        RawEvent::new(
            "evt-1",
            RawEventTime::DateTime(start),
            RawEventTime::DateTime(start + chrono::Duration::hours(1)),
            "primary",
        )
    }

    #[test]
    fn effective_title_fallback() {
        assert_eq!(sample().effective_title(), "(No title)");
        assert_eq!(sample().with_summary("   ").effective_title(), "(No title)");
        assert_eq!(sample().with_summary("Standup").effective_title(), "Standup");
    }

    #[test]
    fn cancelled_is_case_insensitive() {
        assert!(sample().with_status("CANCELLED").is_cancelled());
        assert!(sample().with_status("cancelled").is_cancelled());
        assert!(!sample().with_status("confirmed").is_cancelled());
        assert!(!sample().is_cancelled());
    }

    #[test]
    fn all_day_detection() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 5).unwrap();
        let ev = sample().with_start(Some(RawEventTime::Date(date)));
        assert!(ev.is_all_day());
        assert!(!sample().is_all_day());
        assert!(!sample().with_start(None).is_all_day());
    }

    #[test]
    fn video_entry_point() {
        assert!(RawEntryPoint::new("VIDEO", "https://meet.google.com/x").is_video());
        assert!(!RawEntryPoint::new("phone", "tel:+1").is_video());
    }

    #[test]
    fn window_overlap() {
        let start = Utc.with_ymd_and_hms(2025, 2, 5, 10, 0, 0).unwrap();
        let inside = TimeWindow::from_now(start - Duration::minutes(30), Duration::hours(2));
        let before = TimeWindow::from_now(start - Duration::hours(3), Duration::hours(1));
        let after = TimeWindow::from_now(start + Duration::hours(2), Duration::hours(1));
        assert!(sample().may_overlap(&inside));
        assert!(!sample().may_overlap(&before));
        assert!(!sample().may_overlap(&after));
        assert!(sample().with_start(None).may_overlap(&before));
    }

    #[test]
    fn missing_end_counts_as_one_hour() {
        let start = Utc.with_ymd_and_hms(2025, 2, 5, 10, 0, 0).unwrap();
        let window = TimeWindow::from_now(start + Duration::minutes(45), Duration::hours(1));
        assert!(sample().with_end(None).may_overlap(&window));
    }

    #[test]
    fn serde_time_tagging() {
        let t = RawEventTime::Date(NaiveDate::from_ymd_opt(2025, 2, 5).unwrap());
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"type":"Date","value":"2025-02-05"}"#);
    }
}
