//! Engine configuration.

use std::time::Duration;

use meetingbar_core::DisplayTemplates;
use meetingbar_core::time::DEFAULT_LOOKAHEAD_HOURS;
use meetingbar_providers::SourceSettings;
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::notify::NotifyConfig;

/// Default time between refresh cycles.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default number of meetings in the agenda listing.
pub const DEFAULT_MAX_MEETINGS: usize = 5;

/// Longest accepted lookahead.
pub const MAX_LOOKAHEAD_DAYS: i64 = 366;

fn lookahead_in_range(lookahead: chrono::Duration) -> bool {
    lookahead > chrono::Duration::zero() && lookahead <= chrono::Duration::days(MAX_LOOKAHEAD_DAYS)
}

/// Engine configuration, read once per refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Time between refresh cycles.
    pub refresh_interval: Duration,
    /// Run a cycle as soon as the engine starts.
    pub auto_refresh_startup: bool,
    /// How far ahead of now meetings are fetched.
    pub lookahead: chrono::Duration,
    /// Calendar IDs to aggregate; empty means every enabled calendar.
    pub enabled_calendars: Vec<String>,
    /// Maximum number of meetings in the agenda listing.
    pub max_meetings: usize,
    /// Tray text templates.
    pub templates: DisplayTemplates,
    /// Reminder settings.
    pub notify: NotifyConfig,
    /// Calendar backend settings.
    pub source: SourceSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            auto_refresh_startup: true,
            lookahead: chrono::Duration::hours(DEFAULT_LOOKAHEAD_HOURS),
            enabled_calendars: Vec::new(),
            max_meetings: DEFAULT_MAX_MEETINGS,
            templates: DisplayTemplates::default(),
            notify: NotifyConfig::default(),
            source: SourceSettings::default(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    #[must_use]
    pub fn with_auto_refresh_startup(mut self, enabled: bool) -> Self {
        self.auto_refresh_startup = enabled;
        self
    }

    #[must_use]
    pub fn with_enabled_calendars(mut self, ids: Vec<String>) -> Self {
        self.enabled_calendars = ids;
        self
    }

    #[must_use]
    pub fn with_max_meetings(mut self, max: usize) -> Self {
        self.max_meetings = max;
        self
    }

    #[must_use]
    pub fn with_templates(mut self, templates: DisplayTemplates) -> Self {
        self.templates = templates;
        self
    }

    #[must_use]
    pub fn with_notify(mut self, notify: NotifyConfig) -> Self {
        self.notify = notify;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: SourceSettings) -> Self {
        self.source = source;
        self
    }

    /// Lists values that are out of range. Each one has a default fallback.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.refresh_interval.is_zero() {
            problems.push("refresh interval must be positive".to_string());
        }
        if self.notify.lead_time.is_zero() {
            problems.push("notification lead time must be positive".to_string());
        }
        if self.notify.check_interval.is_zero() {
            problems.push("notification check interval must be positive".to_string());
        }
        if !lookahead_in_range(self.lookahead) {
            problems.push(format!(
                "lookahead must be positive and at most {MAX_LOOKAHEAD_DAYS} days"
            ));
        }
        if self.max_meetings == 0 {
            problems.push("max meetings must be at least 1".to_string());
        }
        if self.templates.max_title_length == 0 {
            problems.push("max title length must be at least 1".to_string());
        }
        problems
    }

    /// Replaces out-of-range values with their defaults, logging each one.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if self.refresh_interval.is_zero() {
            warn!(
                default_secs = defaults.refresh_interval.as_secs(),
                "Invalid refresh interval, using default"
            );
            self.refresh_interval = defaults.refresh_interval;
        }
        if self.notify.lead_time.is_zero() {
            warn!(
                default_secs = defaults.notify.lead_time.as_secs(),
                "Invalid notification lead time, using default"
            );
            self.notify.lead_time = defaults.notify.lead_time;
        }
        if self.notify.check_interval.is_zero() {
            warn!(
                default_secs = defaults.notify.check_interval.as_secs(),
                "Invalid notification check interval, using default"
            );
            self.notify.check_interval = defaults.notify.check_interval;
        }
        if !lookahead_in_range(self.lookahead) {
            warn!(
                lookahead_secs = self.lookahead.num_seconds(),
                "Invalid lookahead, using default"
            );
            self.lookahead = defaults.lookahead;
        }
        if self.max_meetings == 0 {
            warn!(
                default = defaults.max_meetings,
                "Invalid max meetings, using default"
            );
            self.max_meetings = defaults.max_meetings;
        }
        if self.templates.max_title_length == 0 {
            warn!(
                default = defaults.templates.max_title_length,
                "Invalid max title length, using default"
            );
            self.templates.max_title_length = defaults.templates.max_title_length;
        }

        self
    }

    /// Checks the whole configuration, including the calendar source.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> EngineResult<()> {
        if let Some(problem) = self.problems().into_iter().next() {
            return Err(EngineError::config(problem));
        }
        self.source.validate()?;
        Ok(())
    }
}
