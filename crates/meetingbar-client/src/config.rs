//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/meetingbar/config.toml` by default. Every table is optional;
//! missing keys take their defaults.
//!
//! ```toml
//! enabled_calendars = ["work"]
//!
//! [source]
//! backend = "remote"
//!
//! [[source.calendars]]
//! id = "work"
//! url = "https://calendar.example.com/work.ics"
//!
//! [refresh]
//! interval_minutes = 5
//!
//! [notifications]
//! lead_minutes = 5
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use meetingbar_core::DisplayTemplates;
use meetingbar_core::time::DEFAULT_LOOKAHEAD_HOURS;
use meetingbar_engine::{EngineConfig, NotifyConfig};
use meetingbar_providers::SourceSettings;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Configuration for the meetingbar client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Calendar IDs to show; empty means every calendar the source enables.
    pub enabled_calendars: Vec<String>,

    /// Calendar backend settings.
    pub source: SourceSettings,

    /// Refresh settings.
    pub refresh: RefreshSettings,

    /// Notification settings.
    pub notifications: NotificationSettings,

    /// Display settings.
    pub display: DisplaySettings,
}

/// Refresh cycle settings.
///
/// Durations are signed so that out-of-range values parse and are replaced
/// with defaults when the engine starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    /// Minutes between refresh cycles.
    pub interval_minutes: i64,
    /// Refresh as soon as the engine starts.
    pub auto_refresh_startup: bool,
    /// How many hours ahead meetings are fetched.
    pub lookahead_hours: i64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_minutes: 5,
            auto_refresh_startup: true,
            lookahead_hours: DEFAULT_LOOKAHEAD_HOURS,
        }
    }
}

/// Reminder notification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Enable desktop notifications.
    pub enabled: bool,
    /// Minutes before the start at which the reminder fires.
    pub lead_minutes: i64,
    /// Seconds between reminder checks.
    pub check_interval_secs: i64,
    /// Application name shown by the notification daemon.
    pub app_name: String,
    /// Notification timeout in seconds.
    pub timeout_secs: u32,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            lead_minutes: 5,
            check_interval_secs: 60,
            app_name: "MeetingBar".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Tray text and agenda settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Number of meetings in the agenda.
    pub max_meetings: i64,
    /// Maximum title length (truncated with ellipsis).
    pub max_title_length: i64,
    /// Template while a meeting is running.
    pub current_format: String,
    /// Template for the next meeting.
    pub upcoming_format: String,
    /// Text to show when there are no meetings.
    pub no_meeting_text: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        let templates = DisplayTemplates::default();
        Self {
            max_meetings: 5,
            max_title_length: templates.max_title_length as i64,
            current_format: templates.current_format,
            upcoming_format: templates.upcoming_format,
            no_meeting_text: templates.no_meeting_text,
        }
    }
}

impl ClientConfig {
    /// Loads the configuration from `path`, or from the default location.
    ///
    /// A missing file at the default location yields the default
    /// configuration; a missing explicit path is an error.
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        if let Some(path) = path {
            return Self::load_from(path);
        }
        let path = Self::default_path();
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Loads the configuration from a specific file.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ClientError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ClientError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meetingbar")
    }

    /// The file `load` reads for the given override.
    pub fn resolve_path(path: Option<&Path>) -> PathBuf {
        path.map_or_else(Self::default_path, Path::to_path_buf)
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> ClientResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ClientError::config(format!("failed to serialize config: {e}")))
    }

    /// Converts to engine settings.
    ///
    /// Negative durations and counts become zero, which the engine replaces
    /// with defaults.
    pub fn to_engine_config(&self) -> EngineConfig {
        let templates = DisplayTemplates::default()
            .with_current_format(self.display.current_format.clone())
            .with_upcoming_format(self.display.upcoming_format.clone())
            .with_no_meeting_text(self.display.no_meeting_text.clone())
            .with_max_title_length(count(self.display.max_title_length));

        let notify = NotifyConfig::default()
            .with_enabled(self.notifications.enabled)
            .with_lead_time(seconds(self.notifications.lead_minutes.saturating_mul(60)))
            .with_check_interval(seconds(self.notifications.check_interval_secs))
            .with_app_name(self.notifications.app_name.clone())
            .with_timeout(self.notifications.timeout_secs);

        let mut config = EngineConfig::default()
            .with_refresh_interval(seconds(self.refresh.interval_minutes.saturating_mul(60)))
            .with_auto_refresh_startup(self.refresh.auto_refresh_startup)
            .with_enabled_calendars(self.enabled_calendars.clone())
            .with_max_meetings(count(self.display.max_meetings))
            .with_templates(templates)
            .with_notify(notify)
            .with_source(self.source.clone());
        config.lookahead = chrono::Duration::try_hours(self.refresh.lookahead_hours)
            .unwrap_or_else(chrono::Duration::zero);
        config
    }
}

fn seconds(secs: i64) -> Duration {
    Duration::from_secs(u64::try_from(secs).unwrap_or(0))
}

fn count(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}
