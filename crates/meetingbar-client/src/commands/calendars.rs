//! `meetingbar calendars`: list calendars per source.

use meetingbar_core::CalendarDescriptor;
use meetingbar_engine::SourceCalendars;
use serde::Serialize;
use tracing::warn;

use super::{engine, to_json};
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// One calendar as shown by the command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEntry {
    pub source: String,
    pub id: String,
    pub name: String,
    /// Whether the calendar contributes meetings under the current config.
    pub selected: bool,
}

impl CalendarEntry {
    fn new(source: &str, calendar: &CalendarDescriptor, enabled_calendars: &[String]) -> Self {
        let selected = if enabled_calendars.is_empty() {
            calendar.enabled
        } else {
            enabled_calendars.contains(&calendar.id)
        };
        Self {
            source: source.to_string(),
            id: calendar.id.clone(),
            name: calendar.display_name.clone(),
            selected,
        }
    }

    fn to_line(&self) -> String {
        let marker = if self.selected { "[x]" } else { "[ ]" };
        if self.name == self.id {
            format!("{marker} {}", self.id)
        } else {
            format!("{marker} {} ({})", self.id, self.name)
        }
    }
}

/// Flattens per-source listings. Sources that failed to list are logged and skipped.
pub fn entries(listings: &[SourceCalendars], enabled_calendars: &[String]) -> Vec<CalendarEntry> {
    let mut entries = Vec::new();
    for listing in listings {
        match &listing.calendars {
            Ok(calendars) => entries.extend(
                calendars
                    .iter()
                    .map(|c| CalendarEntry::new(&listing.source, c, enabled_calendars)),
            ),
            Err(e) => warn!(source = %listing.source, error = %e, "Failed to list calendars"),
        }
    }
    entries
}

/// Renders entries grouped under their source name.
pub fn to_text(entries: &[CalendarEntry]) -> String {
    let mut out = String::new();
    let mut current: Option<&str> = None;
    for entry in entries {
        if current != Some(entry.source.as_str()) {
            out.push_str(&entry.source);
            out.push_str(":\n");
            current = Some(entry.source.as_str());
        }
        out.push_str("  ");
        out.push_str(&entry.to_line());
        out.push('\n');
    }
    out
}

pub async fn run(config: &ClientConfig, json: bool) -> ClientResult<()> {
    let engine = engine(config);
    let listings = engine.list_calendars().await;
    let entries = entries(&listings, &config.enabled_calendars);

    if json {
        println!("{}", to_json(&entries)?);
    } else if entries.is_empty() {
        println!("No calendars found.");
    } else {
        print!("{}", to_text(&entries));
    }

    // Every source failing to list is a failure of the command.
    if listings.iter().all(|l| l.calendars.is_err())
        && let Some(Err(e)) = listings.into_iter().next().map(|l| l.calendars)
    {
        return Err(e.into());
    }
    Ok(())
}
