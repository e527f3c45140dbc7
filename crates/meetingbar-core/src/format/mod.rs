//! Tray text rendering.
//!
//! Templates support these placeholders:
//! - `{title}`: the meeting title, truncated to `max_title_length`
//! - `{time_left}`: time until the meeting ends
//! - `{time_until}`: time until the meeting starts
//! - `{start_time}` / `{end_time}`: local `HH:MM`
//!
//! # Example
//!
//! ```rust
//! use meetingbar_core::format::DisplayTemplates;
//! use meetingbar_core::{DisplayState, Meeting};
//! use chrono::{Duration, Utc};
//!
//! let now = Utc::now();
//! let meeting = Meeting::new("1", "Standup", now + Duration::minutes(15), now + Duration::minutes(45), "primary");
//! let state = DisplayState::resolve(&[meeting], now);
//! assert_eq!(DisplayTemplates::default().render(&state, now), "Standup in 15m");
//! ```

use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::display::{Agenda, DisplayState};
use crate::event::Meeting;
use crate::time::{format_clock, format_duration};

/// Default template while a meeting is running.
pub const DEFAULT_CURRENT_FORMAT: &str = "{title} {time_left} left";
/// Default template for the next meeting.
pub const DEFAULT_UPCOMING_FORMAT: &str = "{title} in {time_until}";
/// Default text when nothing is scheduled.
pub const DEFAULT_NO_MEETING_TEXT: &str = "No meetings";
/// Default maximum title length in characters.
pub const DEFAULT_MAX_TITLE_LENGTH: usize = 25;

static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(title|time_left|time_until|start_time|end_time)\}")
        .expect("Invalid placeholder regex")
});

/// Templates and limits for tray text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayTemplates {
    pub current_format: String,
    pub upcoming_format: String,
    pub no_meeting_text: String,
    pub max_title_length: usize,
}

impl Default for DisplayTemplates {
    fn default() -> Self {
        Self {
            current_format: DEFAULT_CURRENT_FORMAT.to_string(),
            upcoming_format: DEFAULT_UPCOMING_FORMAT.to_string(),
            no_meeting_text: DEFAULT_NO_MEETING_TEXT.to_string(),
            max_title_length: DEFAULT_MAX_TITLE_LENGTH,
        }
    }
}

impl DisplayTemplates {
    /// Sets the template used while a meeting is running.
    #[must_use]
    pub fn with_current_format(mut self, format: impl Into<String>) -> Self {
        self.current_format = format.into();
        self
    }

    /// Sets the template used for the next meeting.
    #[must_use]
    pub fn with_upcoming_format(mut self, format: impl Into<String>) -> Self {
        self.upcoming_format = format.into();
        self
    }

    #[must_use]
    pub fn with_no_meeting_text(mut self, text: impl Into<String>) -> Self {
        self.no_meeting_text = text.into();
        self
    }

    #[must_use]
    pub fn with_max_title_length(mut self, len: usize) -> Self {
        self.max_title_length = len;
        self
    }

    /// Renders the tray text for a display state.
    pub fn render(&self, state: &DisplayState, now: DateTime<Utc>) -> String {
        match state {
            DisplayState::NoMeetings => self.no_meeting_text.clone(),
            DisplayState::InMeeting(m) => self.render_meeting(&self.current_format, m, now),
            DisplayState::Upcoming(m) => self.render_meeting(&self.upcoming_format, m, now),
        }
    }

    /// Substitutes every placeholder of `template` for one meeting.
    ///
    /// Substituted values are never rescanned, so a title containing
    /// `{time_left}` is shown as written.
    pub fn render_meeting(&self, template: &str, meeting: &Meeting, now: DateTime<Utc>) -> String {
        PLACEHOLDER_REGEX
            .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
                "title" => self.title(&meeting.title).into_owned(),
                "time_left" => format_duration(meeting.time_until_end(now)),
                "time_until" => format_duration(meeting.time_until_start(now)),
                "start_time" => format_clock(meeting.start),
                _ => format_clock(meeting.end),
            })
            .into_owned()
    }

    /// Truncates a title to the configured length.
    pub fn title<'a>(&self, title: &'a str) -> Cow<'a, str> {
        ellipsis(title, self.max_title_length)
    }

    /// Renders one line per agenda entry, plus an "and N more" trailer.
    pub fn agenda_lines(&self, agenda: &Agenda, now: DateTime<Utc>) -> Vec<String> {
        let mut lines: Vec<String> = agenda
            .meetings
            .iter()
            .map(|m| self.agenda_line(m, now))
            .collect();
        if agenda.hidden > 0 {
            lines.push(format!("and {} more", agenda.hidden));
        }
        lines
    }

    fn agenda_line(&self, meeting: &Meeting, now: DateTime<Utc>) -> String {
        let marker = if meeting.is_ongoing_at(now) { "▶" } else { "•" };
        let mut line = format!(
            "{} {}-{} {}",
            marker,
            format_clock(meeting.start),
            format_clock(meeting.end),
            self.title(&meeting.title)
        );
        if let Some(link) = &meeting.link {
            line.push_str(&format!(" [{}]", link.kind.display_name()));
        }
        line
    }
}

/// Truncates a string with ellipsis if it exceeds the given length.
///
/// Lengths are counted in characters. Limits of three or fewer cut without
/// an ellipsis.
pub fn ellipsis(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_len {
        return Cow::Borrowed(s);
    }
    if max_len <= 3 {
        return Cow::Owned(s.chars().take(max_len).collect());
    }

    let truncated: String = s.chars().take(max_len - 3).collect();
    Cow::Owned(format!("{}...", truncated))
}

#[cfg(test)]
mod golden_tests;
