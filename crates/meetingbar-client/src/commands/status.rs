//! `meetingbar status`: one refresh, then the tray text and agenda.

use chrono::{DateTime, Utc};
use meetingbar_engine::{EngineConfig, EngineError, Snapshot};
use serde::Serialize;

use super::{engine, to_json};
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// What `status` prints.
#[derive(Debug, Serialize)]
pub struct StatusReport<'a> {
    /// Rendered tray text.
    pub text: String,
    /// Agenda lines.
    pub agenda: Vec<String>,
    #[serde(flatten)]
    pub snapshot: &'a Snapshot,
}

impl<'a> StatusReport<'a> {
    pub fn new(snapshot: &'a Snapshot, config: &EngineConfig, now: DateTime<Utc>) -> Self {
        let templates = &config.templates;
        let text = templates.render(&snapshot.display_state(now), now);
        let agenda = templates.agenda_lines(&snapshot.agenda(now, config.max_meetings), now);
        Self {
            text,
            agenda,
            snapshot,
        }
    }

    /// Plain-text output: the tray text, then the agenda after a blank line.
    pub fn to_text(&self) -> String {
        let mut out = self.text.clone();
        out.push('\n');
        if !self.agenda.is_empty() {
            out.push('\n');
            for line in &self.agenda {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

/// Runs one refresh cycle and prints the result.
///
/// The status is printed even when every source failed; the command then
/// exits with an error.
pub async fn run(config: &ClientConfig, json: bool) -> ClientResult<()> {
    let engine = engine(config);
    engine.refresh_now().await;

    let snapshot = engine.current_state();
    let report = StatusReport::new(&snapshot, &engine.config(), engine.now());
    if json {
        println!("{}", to_json(&report)?);
    } else {
        print!("{}", report.to_text());
    }

    if snapshot.all_failed() {
        return Err(
            EngineError::all_sources_failed(snapshot.failed_sources, snapshot.total_sources).into(),
        );
    }
    Ok(())
}
