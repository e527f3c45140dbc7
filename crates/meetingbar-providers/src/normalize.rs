//! RawEvent to Meeting conversion.
//!
//! Each raw event yields zero or one [`Meeting`]:
//! 1. Cancelled events and events without a start are rejected
//! 2. Times are resolved to instants, repairing a missing or inverted end
//! 3. The primary conference link is picked from conference data, location,
//!    then description

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use meetingbar_core::{Meeting, MeetingLink, ProviderKind, primary_link_in};
use tracing::debug;

use crate::raw_event::{RawConferenceData, RawEvent, RawEventTime};

/// Length in minutes given to meetings whose end is missing or not after the start.
pub const DEFAULT_MEETING_MINUTES: i64 = 60;

/// Why a raw event produced no meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Cancelled,
    MissingStart,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::MissingStart => "missing_start",
        }
    }
}

/// Result of normalizing a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    pub meetings: Vec<Meeting>,
    /// Number of raw events that were rejected.
    pub rejected: usize,
}

/// Converts a [`RawEvent`] to a [`Meeting`], or explains why it cannot.
pub fn try_normalize(raw: &RawEvent) -> Result<Meeting, Rejection> {
    if raw.is_cancelled() {
        return Err(Rejection::Cancelled);
    }
    let start_raw = raw.start.ok_or(Rejection::MissingStart)?;

    let start = resolve_instant(start_raw);
    let end = match raw.end.map(resolve_instant) {
        Some(end) if end > start => end,
        // Date-only events without an end span the whole day.
        None if start_raw.is_all_day() => start + Duration::hours(24),
        _ => start + Duration::minutes(DEFAULT_MEETING_MINUTES),
    };

    let mut meeting = Meeting::new(&raw.id, raw.effective_title(), start, end, &raw.calendar_id)
        .with_account(&raw.account_id)
        .with_all_day(start_raw.is_all_day());

    if let Some(link) = resolve_link(raw) {
        meeting = meeting.with_link(link);
    }

    Ok(meeting)
}

/// Converts a [`RawEvent`] to a [`Meeting`].
///
/// Returns `None` for cancelled events and events without a start.
pub fn normalize_event(raw: &RawEvent) -> Option<Meeting> {
    match try_normalize(raw) {
        Ok(meeting) => Some(meeting),
        Err(reason) => {
            debug!(
                event_id = %raw.id,
                calendar_id = %raw.calendar_id,
                reason = reason.as_str(),
                "Skipping raw event"
            );
            None
        }
    }
}

/// Normalizes a batch of raw events, counting rejections.
pub fn normalize_events(raw_events: &[RawEvent]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for raw in raw_events {
        match normalize_event(raw) {
            Some(meeting) => batch.meetings.push(meeting),
            None => batch.rejected += 1,
        }
    }
    batch
}

/// Resolves a raw time to an instant; dates become local midnight.
fn resolve_instant(time: RawEventTime) -> DateTime<Utc> {
    match time {
        RawEventTime::DateTime(dt) => dt,
        RawEventTime::Date(date) => local_midnight(date),
    }
}

fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// Picks the join link for an event, first match wins.
fn resolve_link(raw: &RawEvent) -> Option<MeetingLink> {
    if let Some(link) = raw.conference_data.as_ref().and_then(conference_link) {
        return Some(link);
    }
    if let Some(link) = raw.location.as_deref().and_then(|l| primary_link_in(&[l])) {
        return Some(link);
    }
    raw.description
        .as_deref()
        .and_then(|d| primary_link_in(&[d]))
}

/// A native Google Meet entry point, if the calendar service attached one.
fn conference_link(conf: &RawConferenceData) -> Option<MeetingLink> {
    conf.entry_points
        .iter()
        .filter(|ep| ep.is_video())
        .filter_map(|ep| ep.uri.as_deref())
        .find(|uri| uri.to_ascii_lowercase().contains("meet.google.com"))
        .map(|uri| MeetingLink::new(ProviderKind::GoogleMeet, uri))
}
