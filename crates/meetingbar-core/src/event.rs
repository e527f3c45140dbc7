//! Meeting types.
//!
//! This module provides the canonical types shared by every crate:
//! - [`Meeting`]: one timed occurrence rebuilt from scratch every refresh
//! - [`MeetingLink`]: a joinable conference URL with its provider
//! - [`ProviderKind`]: the conferencing service behind a link
//! - [`CalendarDescriptor`]: a calendar offered by a source

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};

/// The conferencing provider of a meeting link.
///
/// Variants are declared in priority order: when several links are found
/// for one meeting, the lowest rank wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    GoogleMeet,
    Teams,
    Zoom,
    /// Any other URL found in the event text.
    Unknown,
}

impl ProviderKind {
    /// Returns a human-readable name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::GoogleMeet => "Google Meet",
            Self::Teams => "Microsoft Teams",
            Self::Zoom => "Zoom",
            Self::Unknown => "Link",
        }
    }

    /// Returns the selection rank of this provider (lower wins).
    pub fn priority(&self) -> u8 {
        match self {
            Self::GoogleMeet => 0,
            Self::Teams => 1,
            Self::Zoom => 2,
            Self::Unknown => 3,
        }
    }

    /// Returns true if this is a recognised video conferencing service.
    pub fn is_video_conference(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// A conference link extracted from a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeetingLink {
    /// The URL as found in the event.
    pub url: String,
    /// The detected provider.
    pub kind: ProviderKind,
}

impl MeetingLink {
    /// Creates a new link.
    pub fn new(kind: ProviderKind, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }
}

/// A calendar exposed by a calendar source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDescriptor {
    /// Calendar identifier, unique within its account.
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Owning account or backend identifier.
    pub account_id: String,
    /// Whether the calendar contributes to aggregation.
    pub enabled: bool,
    /// Display colour, if the source provides one.
    pub color: Option<String>,
}

impl CalendarDescriptor {
    /// Creates an enabled calendar descriptor.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            account_id: account_id.into(),
            enabled: true,
            color: None,
        }
    }

    /// Builder method to set the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder method to set the colour.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A canonical meeting occurrence.
///
/// Meetings carry no cross-cycle state: anything that must survive a
/// refresh (such as reminder bookkeeping) is keyed by [`Meeting::id`]
/// in a side table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    /// Stable identifier of this occurrence.
    pub id: String,
    /// The meeting title.
    pub title: String,
    /// When the meeting starts.
    pub start: DateTime<Utc>,
    /// When the meeting ends. Always after `start`.
    pub end: DateTime<Utc>,
    /// Calendar the meeting came from.
    pub calendar_id: String,
    /// Account or backend the calendar belongs to.
    pub account_id: String,
    /// Primary conference link, if any.
    pub link: Option<MeetingLink>,
    /// Whether the source event was date-only.
    pub is_all_day: bool,
}

impl Meeting {
    /// Creates a new meeting with required fields.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
            calendar_id: calendar_id.into(),
            account_id: String::new(),
            link: None,
            is_all_day: false,
        }
    }

    /// Builder method to set the account.
    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self
    }

    /// Builder method to set the link.
    pub fn with_link(mut self, link: MeetingLink) -> Self {
        self.link = Some(link);
        self
    }

    /// Builder method to mark as all-day.
    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.is_all_day = all_day;
        self
    }

    /// Checks if the meeting is ongoing at the given time.
    pub fn is_ongoing_at(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }

    /// Checks if the meeting starts after the given time.
    pub fn is_upcoming_at(&self, now: DateTime<Utc>) -> bool {
        self.start > now
    }

    /// Checks if the meeting has ended at the given time.
    pub fn has_ended_at(&self, now: DateTime<Utc>) -> bool {
        self.end <= now
    }

    /// Time left until the meeting starts (negative once started).
    pub fn time_until_start(&self, now: DateTime<Utc>) -> Duration {
        self.start - now
    }

    /// Time left until the meeting ends (negative once ended).
    pub fn time_until_end(&self, now: DateTime<Utc>) -> Duration {
        self.end - now
    }

    /// Returns the duration of the meeting.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Start time in the local timezone.
    pub fn start_local(&self) -> DateTime<Local> {
        self.start.with_timezone(&Local)
    }

    /// End time in the local timezone.
    pub fn end_local(&self) -> DateTime<Local> {
        self.end.with_timezone(&Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 5, h, min, 0).unwrap()
    }

    mod provider_kind {
        use super::*;

        #[test]
        fn display_names() {
            assert_eq!(ProviderKind::GoogleMeet.display_name(), "Google Meet");
            assert_eq!(ProviderKind::Teams.display_name(), "Microsoft Teams");
            assert_eq!(ProviderKind::Zoom.display_name(), "Zoom");
            assert_eq!(ProviderKind::Unknown.display_name(), "Link");
        }

        #[test]
        fn priority_matches_ordering() {
            let mut kinds = vec![
                ProviderKind::Unknown,
                ProviderKind::Zoom,
                ProviderKind::GoogleMeet,
                ProviderKind::Teams,
            ];
            kinds.sort();
            assert_eq!(
                kinds,
                vec![
                    ProviderKind::GoogleMeet,
                    ProviderKind::Teams,
                    ProviderKind::Zoom,
                    ProviderKind::Unknown
                ]
            );
            assert!(kinds.windows(2).all(|w| w[0].priority() < w[1].priority()));
        }

        #[test]
        fn serde_names() {
            let json = serde_json::to_string(&ProviderKind::GoogleMeet).unwrap();
            assert_eq!(json, "\"google_meet\"");
            let parsed: ProviderKind = serde_json::from_str("\"teams\"").unwrap();
            assert_eq!(parsed, ProviderKind::Teams);
        }
    }

    mod meeting {
        use super::*;

        fn sample() -> Meeting {
            Meeting::new("evt-1", "Team Standup", utc(10, 0), utc(10, 30), "primary")
                .with_account("work")
        }

        #[test]
        fn ongoing_is_half_open() {
            let m = sample();
            assert!(!m.is_ongoing_at(utc(9, 59)));
            assert!(m.is_ongoing_at(utc(10, 0)));
            assert!(m.is_ongoing_at(utc(10, 29)));
            assert!(!m.is_ongoing_at(utc(10, 30)));
            assert!(m.has_ended_at(utc(10, 30)));
        }

        #[test]
        fn time_until() {
            let m = sample();
            assert_eq!(m.time_until_start(utc(9, 45)), Duration::minutes(15));
            assert_eq!(m.time_until_end(utc(10, 10)), Duration::minutes(20));
            assert_eq!(m.duration(), Duration::minutes(30));
        }

        #[test]
        fn builder() {
            let m = sample()
                .with_link(MeetingLink::new(
                    ProviderKind::Zoom,
                    "https://zoom.us/j/123",
                ))
                .with_all_day(true);
            assert_eq!(m.account_id, "work");
            assert_eq!(m.link.as_ref().unwrap().kind, ProviderKind::Zoom);
            assert!(m.is_all_day);
        }
    }

    #[test]
    fn calendar_descriptor_builder() {
        let cal = CalendarDescriptor::new("cal-1", "Work", "acct")
            .with_enabled(false)
            .with_color("#3b82f6");
        assert!(!cal.enabled);
        assert_eq!(cal.color.as_deref(), Some("#3b82f6"));
        assert_eq!(cal.account_id, "acct");
    }
}
