//! Backend selection.
//!
//! Exactly one backend is active at a time. [`build_source`] turns the
//! `[source]` settings into a boxed [`CalendarSource`] once at startup (and
//! again on configuration reload).

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::local::LocalStoreSource;
use crate::source::{CalendarSource, FailingSource};

/// Account identifier used for the local desktop store.
pub const LOCAL_ACCOUNT_ID: &str = "local";

/// The kind of calendar backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Remote calendar service, read through per-calendar iCalendar feeds.
    #[default]
    #[serde(alias = "remote", alias = "google")]
    RemoteApi,
    /// The desktop calendar service's local store.
    #[serde(alias = "local", alias = "gnome")]
    LocalDesktopBus,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RemoteApi => "remote",
            Self::LocalDesktopBus => "local",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote calendar feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCalendar {
    /// Calendar identifier, unique within the account.
    pub id: String,
    /// Display name; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
    /// iCalendar feed URL (`https://` or `webcal://`).
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub color: Option<String>,
}

fn default_true() -> bool {
    true
}

impl RemoteCalendar {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            url: url.into(),
            enabled: true,
            color: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Settings for building a calendar source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Which backend to use.
    pub backend: BackendKind,
    /// Account identifier attached to every meeting from this source.
    pub account_id: String,
    /// Remote calendar feeds (remote backend only).
    pub calendars: Vec<RemoteCalendar>,
    /// Directory of the local calendar store (local backend only).
    pub local_dir: Option<PathBuf>,
    /// HTTP timeout in seconds (remote backend only).
    pub timeout_secs: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            account_id: "default".to_string(),
            calendars: Vec::new(),
            local_dir: None,
            timeout_secs: 30,
        }
    }
}

impl SourceSettings {
    #[must_use]
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    #[must_use]
    pub fn with_calendar(mut self, calendar: RemoteCalendar) -> Self {
        self.calendars.push(calendar);
        self
    }

    #[must_use]
    pub fn with_local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = Some(dir.into());
        self
    }

    /// The local store directory, falling back to the desktop default.
    pub fn resolved_local_dir(&self) -> Option<PathBuf> {
        self.local_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("evolution").join("calendar")))
    }

    /// Checks the settings without building a source.
    pub fn validate(&self) -> ProviderResult<()> {
        match self.backend {
            BackendKind::RemoteApi => {
                if self.calendars.is_empty() {
                    return Err(ProviderError::config_invalid(
                        "remote backend has no calendars configured",
                    ));
                }
                if let Some(cal) = self.calendars.iter().find(|c| !is_feed_url(&c.url)) {
                    return Err(ProviderError::config_invalid(format!(
                        "calendar '{}' has an invalid feed URL: {}",
                        cal.id, cal.url
                    )));
                }
                Ok(())
            }
            BackendKind::LocalDesktopBus => {
                if self.resolved_local_dir().is_none() {
                    return Err(ProviderError::config_invalid(
                        "no local calendar directory configured",
                    ));
                }
                Ok(())
            }
        }
    }
}

fn is_feed_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    ["https://", "http://", "webcal://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len())
}

/// Builds the calendar source for the configured backend.
///
/// # Errors
///
/// Returns `ConfigInvalid` when the settings cannot produce a source.
pub fn build_source(settings: &SourceSettings) -> ProviderResult<Box<dyn CalendarSource>> {
    settings.validate()?;

    match settings.backend {
        BackendKind::RemoteApi => build_remote(settings),
        BackendKind::LocalDesktopBus => {
            let dir = settings
                .resolved_local_dir()
                .ok_or_else(|| ProviderError::config_invalid("no local calendar directory"))?;
            info!(dir = %dir.display(), "Using local calendar store");
            Ok(Box::new(LocalStoreSource::new(dir)))
        }
    }
}

/// Like [`build_source`], but never fails: an invalid configuration yields a
/// source that reports the problem on every call.
pub fn build_source_or_failing(settings: &SourceSettings) -> Box<dyn CalendarSource> {
    match build_source(settings) {
        Ok(source) => source,
        Err(e) => {
            warn!(backend = %settings.backend, error = %e, "Calendar source unavailable");
            Box::new(FailingSource::new(
                settings.backend.as_str(),
                settings.backend,
                e,
            ))
        }
    }
}

#[cfg(feature = "remote")]
fn build_remote(settings: &SourceSettings) -> ProviderResult<Box<dyn CalendarSource>> {
    let source = crate::remote::RemoteFeedSource::new(
        settings.account_id.clone(),
        settings.calendars.clone(),
        std::time::Duration::from_secs(settings.timeout_secs.max(1)),
    )?;
    info!(calendars = settings.calendars.len(), "Using remote calendar feeds");
    Ok(Box::new(source))
}

#[cfg(not(feature = "remote"))]
fn build_remote(_settings: &SourceSettings) -> ProviderResult<Box<dyn CalendarSource>> {
    Err(ProviderError::config_invalid(
        "remote backend support was not compiled in (enable the `remote` feature)",
    ))
}
