//! iCalendar parsing.
//!
//! Both backends store or serve RFC 5545 data; this module turns it into
//! [`RawEvent`]s. Recurrence rules are not expanded: only the instances the
//! source lists explicitly are returned.

use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike,
};
use tracing::{debug, trace};

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::{RawEvent, RawEventTime};

/// Parses ICS content and extracts its events.
///
/// Events without a UID are skipped. Events without a usable start are
/// returned with `start: None` so the normalizer can reject and count them.
///
/// # Errors
///
/// Returns a `ParseError` if the content is not an iCalendar document.
pub fn parse_ics_content(ics: &str, calendar_id: &str) -> ProviderResult<Vec<RawEvent>> {
    let calendar = ics
        .parse::<Calendar>()
        .map_err(|e| ProviderError::parse(format!("invalid iCalendar data: {}", e)))?;

    let events: Vec<RawEvent> = calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => parse_event(event, calendar_id),
            _ => None,
        })
        .collect();

    debug!(calendar_id, count = events.len(), "Parsed ICS content");
    Ok(events)
}

/// Reads the calendar display name (`X-WR-CALNAME`), if present.
pub fn calendar_name(ics: &str) -> Option<String> {
    ics.lines()
        .find_map(|line| line.strip_prefix("X-WR-CALNAME:"))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Parses a single VEVENT component.
fn parse_event(event: &Event, calendar_id: &str) -> Option<RawEvent> {
    let uid = event.get_uid()?;

    // RECURRENCE-ID distinguishes instances of one series sharing a UID.
    let id = match event.property_value("RECURRENCE-ID") {
        Some(rid) => format!("{uid}_{rid}"),
        None => uid.to_string(),
    };

    let start = event.get_start().map(convert_date_time);
    let end = event.get_end().map(convert_date_time);

    let mut raw = RawEvent {
        id,
        start,
        end,
        summary: event.get_summary().map(str::to_string),
        description: event.get_description().map(str::to_string),
        location: event.get_location().map(str::to_string),
        status: event.get_status().map(|s| format!("{:?}", s)),
        conference_data: None,
        calendar_id: calendar_id.to_string(),
        account_id: String::new(),
    };

    // An explicit URL property is appended to the location so link
    // extraction sees it.
    if let Some(url) = event.property_value("URL") {
        raw.location = Some(match raw.location.take() {
            Some(loc) => format!("{loc} {url}"),
            None => url.to_string(),
        });
    }

    trace!(uid = %raw.id, summary = ?raw.summary, start = ?raw.start, "Parsed VEVENT");
    Some(raw)
}

/// Converts an icalendar time to a [`RawEventTime`].
///
/// Floating times and times with an unknown TZID are read as local
/// wall-clock time.
fn convert_date_time(dt: DatePerhapsTime) -> RawEventTime {
    match dt {
        DatePerhapsTime::Date(date) => RawEventTime::Date(date),
        DatePerhapsTime::DateTime(cdt) => {
            let utc = match cdt {
                CalendarDateTime::Utc(dt) => dt,
                CalendarDateTime::Floating(naive) => local_to_utc(naive),
                CalendarDateTime::WithTimezone { date_time, tzid } => {
                    if tzid.eq_ignore_ascii_case("UTC") || tzid.eq_ignore_ascii_case("Etc/UTC") {
                        Utc.from_utc_datetime(&date_time)
                    } else if let Ok(tz) = tzid.parse::<Tz>() {
                        zoned_to_utc(tz, date_time)
                    } else {
                        debug!(%tzid, "Unknown TZID, reading as local time");
                        local_to_utc(date_time)
                    }
                }
            };
            RawEventTime::DateTime(utc)
        }
    }
}

fn zoned_to_utc(tz: Tz, naive: NaiveDateTime) -> chrono::DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| local_to_utc(naive))
}

fn local_to_utc(naive: NaiveDateTime) -> chrono::DateTime<Utc> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A calendar with one timed event, one all-day event and one cancelled event.
    pub fn work_calendar() -> &'static str {
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//meetingbar//test//EN\r\n\
         X-WR-CALNAME:Work\r\n\
         BEGIN:VEVENT\r\n\
         UID:standup@example.com\r\n\
         DTSTART:20250205T100000Z\r\n\
         DTEND:20250205T103000Z\r\n\
         SUMMARY:Team Standup\r\n\
         LOCATION:https://meet.google.com/abc-defg-hij\r\n\
         STATUS:CONFIRMED\r\n\
         END:VEVENT\r\n\
         BEGIN:VEVENT\r\n\
         UID:holiday@example.com\r\n\
         DTSTART;VALUE=DATE:20250205\r\n\
         DTEND;VALUE=DATE:20250206\r\n\
         SUMMARY:Company Holiday\r\n\
         END:VEVENT\r\n\
         BEGIN:VEVENT\r\n\
         UID:retro@example.com\r\n\
         DTSTART:20250205T150000Z\r\n\
         DTEND:20250205T160000Z\r\n\
         SUMMARY:Retro\r\n\
         STATUS:CANCELLED\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_timed_event() {
        let events = parse_ics_content(fixtures::work_calendar(), "work").unwrap();
        assert_eq!(events.len(), 3);

        let standup = &events[0];
        assert_eq!(standup.id, "standup@example.com");
        assert_eq!(standup.summary.as_deref(), Some("Team Standup"));
        assert_eq!(standup.calendar_id, "work");
        assert_eq!(
            standup.start,
            Some(RawEventTime::DateTime(
                Utc.with_ymd_and_hms(2025, 2, 5, 10, 0, 0).unwrap()
            ))
        );
        assert!(!standup.is_cancelled());
    }

    #[test]
    fn parses_all_day_event() {
        let events = parse_ics_content(fixtures::work_calendar(), "work").unwrap();
        let holiday = &events[1];
        assert!(holiday.is_all_day());
        assert_eq!(
            holiday.start,
            Some(RawEventTime::Date(NaiveDate::from_ymd_opt(2025, 2, 5).unwrap()))
        );
    }

    #[test]
    fn keeps_cancelled_status() {
        let events = parse_ics_content(fixtures::work_calendar(), "work").unwrap();
        assert!(events[2].is_cancelled());
    }

    #[test]
    fn url_property_joins_location() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   VERSION:2.0\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:u1\r\n\
                   DTSTART:20250205T100000Z\r\n\
                   LOCATION:Room 4\r\n\
                   URL:https://zoom.us/j/123\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";
        let events = parse_ics_content(ics, "c").unwrap();
        assert_eq!(events[0].location.as_deref(), Some("Room 4 https://zoom.us/j/123"));
        assert!(events[0].end.is_none());
    }

    fn single_start(dtstart: &str) -> Option<RawEventTime> {
        let ics = format!(
            "BEGIN:VCALENDAR\r\n\
             VERSION:2.0\r\n\
             BEGIN:VEVENT\r\n\
             UID:u1\r\n\
             {dtstart}\r\n\
             END:VEVENT\r\n\
             END:VCALENDAR\r\n"
        );
        parse_ics_content(&ics, "c").unwrap().remove(0).start
    }

    #[test]
    fn tzid_is_resolved_in_its_zone() {
        assert_eq!(
            single_start("DTSTART;TZID=America/New_York:20250205T100000"),
            Some(RawEventTime::DateTime(
                Utc.with_ymd_and_hms(2025, 2, 5, 15, 0, 0).unwrap()
            ))
        );
        // Summer time
        assert_eq!(
            single_start("DTSTART;TZID=Europe/Paris:20250705T100000"),
            Some(RawEventTime::DateTime(
                Utc.with_ymd_and_hms(2025, 7, 5, 8, 0, 0).unwrap()
            ))
        );
    }

    #[test]
    fn unknown_tzid_is_read_as_local() {
        let naive = NaiveDate::from_ymd_opt(2025, 2, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(
            single_start("DTSTART;TZID=Not/A_Zone:20250205T100000"),
            Some(RawEventTime::DateTime(local_to_utc(naive)))
        );
    }

    #[test]
    fn reads_calendar_name() {
        assert_eq!(
            calendar_name(fixtures::work_calendar()).as_deref(),
            Some("Work")
        );
        assert_eq!(calendar_name("BEGIN:VCALENDAR\r\nEND:VCALENDAR"), None);
    }
}
