//! Tray display state.
//!
//! [`DisplayState`] classifies "now" against an ordered meeting sequence.
//! It is derived fresh every cycle and never stored across refreshes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::Meeting;

/// What the tray should show.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "meeting", rename_all = "snake_case")]
pub enum DisplayState {
    /// Nothing ongoing or ahead.
    #[default]
    NoMeetings,
    /// A meeting is currently running.
    InMeeting(Meeting),
    /// The next meeting to start.
    Upcoming(Meeting),
}

impl DisplayState {
    /// Resolves the display state for `now`.
    ///
    /// `meetings` must be sorted by start. An ongoing meeting always wins over
    /// an upcoming one; among candidates the first in sequence order is taken.
    pub fn resolve(meetings: &[Meeting], now: DateTime<Utc>) -> Self {
        if let Some(current) = meetings.iter().find(|m| m.is_ongoing_at(now)) {
            return Self::InMeeting(current.clone());
        }
        if let Some(next) = meetings.iter().find(|m| m.is_upcoming_at(now)) {
            return Self::Upcoming(next.clone());
        }
        Self::NoMeetings
    }

    /// The canonical meeting, if any.
    pub fn meeting(&self) -> Option<&Meeting> {
        match self {
            Self::NoMeetings => None,
            Self::InMeeting(m) | Self::Upcoming(m) => Some(m),
        }
    }

    pub fn is_in_meeting(&self) -> bool {
        matches!(self, Self::InMeeting(_))
    }

    pub fn is_upcoming(&self) -> bool {
        matches!(self, Self::Upcoming(_))
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoMeetings => "no_meetings",
            Self::InMeeting(_) => "in_meeting",
            Self::Upcoming(_) => "upcoming",
        }
    }
}

/// A bounded meeting listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Agenda {
    /// Meetings to list, in sequence order.
    pub meetings: Vec<Meeting>,
    /// How many more not-yet-ended meetings were left out.
    pub hidden: usize,
}

impl Agenda {
    /// Builds the listing: at most `max` meetings that have not ended at `now`.
    pub fn build(meetings: &[Meeting], now: DateTime<Utc>, max: usize) -> Self {
        let mut visible: Vec<Meeting> = meetings
            .iter()
            .filter(|m| !m.has_ended_at(now))
            .cloned()
            .collect();
        let hidden = visible.len().saturating_sub(max);
        visible.truncate(max);
        Self {
            meetings: visible,
            hidden,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 5, 10, 0, 0).unwrap()
    }

    fn meeting(id: &str, start_offset: i64, len: i64) -> Meeting {
        let start = now() + Duration::minutes(start_offset);
        Meeting::new(id, id, start, start + Duration::minutes(len), "primary")
    }

    mod resolve {
        use super::*;

        #[test]
        fn empty_is_no_meetings() {
            assert_eq!(DisplayState::resolve(&[], now()), DisplayState::NoMeetings);
        }

        #[test]
        fn ongoing_wins_over_upcoming() {
            let meetings = vec![meeting("a", -10, 30), meeting("b", 5, 30)];
            let state = DisplayState::resolve(&meetings, now());
            assert!(state.is_in_meeting());
            assert_eq!(state.meeting().unwrap().id, "a");
        }

        #[test]
        fn earliest_ongoing_is_canonical() {
            let meetings = vec![meeting("early", -30, 60), meeting("late", -5, 60)];
            let state = DisplayState::resolve(&meetings, now());
            assert_eq!(state.meeting().unwrap().id, "early");
        }

        #[test]
        fn upcoming_when_nothing_running() {
            let meetings = vec![meeting("past", -60, 30), meeting("next", 15, 30)];
            let state = DisplayState::resolve(&meetings, now());
            assert!(state.is_upcoming());
            assert_eq!(state.meeting().unwrap().id, "next");
        }

        #[test]
        fn meeting_starting_now_is_in_meeting() {
            let state = DisplayState::resolve(&[meeting("a", 0, 30)], now());
            assert!(state.is_in_meeting());
        }

        #[test]
        fn only_ended_meetings() {
            let state = DisplayState::resolve(&[meeting("past", -60, 30)], now());
            assert_eq!(state, DisplayState::NoMeetings);
        }

        #[test]
        fn serializes_with_state_tag() {
            let json = serde_json::to_value(DisplayState::NoMeetings).unwrap();
            insta::assert_json_snapshot!(json, @r#"
            {
              "state": "no_meetings"
            }
            "#);
        }
    }

    mod agenda {
        use super::*;

        #[test]
        fn caps_and_counts_hidden() {
            let meetings: Vec<_> = (0..7).map(|i| meeting(&format!("m{i}"), i * 60, 30)).collect();
            let agenda = Agenda::build(&meetings, now(), 5);
            assert_eq!(agenda.meetings.len(), 5);
            assert_eq!(agenda.hidden, 2);
            assert_eq!(agenda.meetings[0].id, "m0");
        }

        #[test]
        fn skips_ended() {
            let meetings = vec![meeting("past", -60, 30), meeting("next", 15, 30)];
            let agenda = Agenda::build(&meetings, now(), 5);
            assert_eq!(agenda.meetings.len(), 1);
            assert_eq!(agenda.hidden, 0);
        }

        #[test]
        fn zero_max_hides_everything() {
            let agenda = Agenda::build(&[meeting("a", 5, 30)], now(), 0);
            assert!(agenda.is_empty());
            assert_eq!(agenda.hidden, 1);
        }
    }
}
