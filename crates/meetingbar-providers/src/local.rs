//! Local desktop calendar store.
//!
//! The desktop calendar service keeps one iCalendar file per calendar on
//! disk. Two layouts are recognised under the store directory:
//!
//! ```text
//! <dir>/<calendar-id>.ics
//! <dir>/<calendar-id>/calendar.ics
//! ```

use std::path::{Path, PathBuf};

use meetingbar_core::{CalendarDescriptor, TimeWindow};
use tracing::{debug, warn};

use crate::backend::{BackendKind, LOCAL_ACCOUNT_ID};
use crate::error::{ProviderError, ProviderResult};
use crate::ics::{calendar_name, parse_ics_content};
use crate::raw_event::RawEvent;
use crate::source::{BoxFuture, CalendarScope, CalendarSource};

const STORE_FILE_NAME: &str = "calendar.ics";

/// Reads calendars from an on-disk iCalendar store.
#[derive(Debug, Clone)]
pub struct LocalStoreSource {
    dir: PathBuf,
}

/// A calendar file found in the store.
#[derive(Debug, Clone)]
struct StoredCalendar {
    descriptor: CalendarDescriptor,
    path: PathBuf,
}

impl LocalStoreSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn discover(&self) -> ProviderResult<Vec<StoredCalendar>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            ProviderError::unavailable(format!(
                "cannot read calendar store {}",
                self.dir.display()
            ))
            .with_source(e)
            .with_provider(self.name())
        })?;

        let mut found = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read calendar store entry");
                    continue;
                }
            };
            let path = entry.path();
            let Some((id, file)) = calendar_file(&path) else {
                continue;
            };
            if !tokio::fs::try_exists(&file).await.unwrap_or(false) {
                continue;
            }

            // The display name lives inside the file; an unreadable file still
            // gets listed so the failure surfaces when its events are fetched.
            let name = match tokio::fs::read_to_string(&file).await {
                Ok(content) => calendar_name(&content).unwrap_or_else(|| id.clone()),
                Err(_) => id.clone(),
            };
            found.push(StoredCalendar {
                descriptor: CalendarDescriptor::new(&id, name, LOCAL_ACCOUNT_ID),
                path: file,
            });
        }

        found.sort_by(|a, b| a.descriptor.id.cmp(&b.descriptor.id));
        debug!(dir = %self.dir.display(), count = found.len(), "Discovered local calendars");
        Ok(found)
    }
}

/// Maps a store entry to `(calendar id, ics file)`.
fn calendar_file(path: &Path) -> Option<(String, PathBuf)> {
    if path.is_dir() {
        let id = path.file_name()?.to_str()?.to_string();
        return Some((id, path.join(STORE_FILE_NAME)));
    }
    let is_ics = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ics"));
    if is_ics {
        let id = path.file_stem()?.to_str()?.to_string();
        return Some((id, path.to_path_buf()));
    }
    None
}

impl CalendarSource for LocalStoreSource {
    fn name(&self) -> &str {
        BackendKind::LocalDesktopBus.as_str()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::LocalDesktopBus
    }

    fn list_calendars(
        &self,
        scope: CalendarScope,
    ) -> BoxFuture<'_, ProviderResult<Vec<CalendarDescriptor>>> {
        Box::pin(async move {
            let calendars = self
                .discover()
                .await?
                .into_iter()
                .map(|c| c.descriptor)
                .collect();
            Ok(scope.apply(calendars))
        })
    }

    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
        Box::pin(async move {
            let stored = self
                .discover()
                .await?
                .into_iter()
                .find(|c| c.descriptor.id == calendar_id)
                .ok_or_else(|| {
                    ProviderError::not_found(format!("no local calendar '{calendar_id}'"))
                        .with_provider(self.name())
                })?;

            let content = tokio::fs::read_to_string(&stored.path)
                .await
                .map_err(|e| {
                    ProviderError::from_io(format!("cannot read {}", stored.path.display()), e)
                        .with_provider(self.name())
                })?;

            let events = parse_ics_content(&content, calendar_id)
                .map_err(|e| e.with_provider(self.name()))?
                .into_iter()
                .filter(|ev| ev.may_overlap(&window))
                .map(|ev| ev.with_account(LOCAL_ACCOUNT_ID))
                .collect();
            Ok(events)
        })
    }
}
