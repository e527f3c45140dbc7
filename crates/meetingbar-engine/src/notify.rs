//! Meeting reminders.
//!
//! A reminder fires once per meeting when its start enters the lead window.
//! Which meetings already fired is tracked in a [`NotifiedSet`] keyed by
//! meeting ID; the set is pruned against every published sequence so an ID
//! that disappears and comes back is a fresh candidate.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use meetingbar_core::{Meeting, format_clock};
use notify_rust::Notification;
#[cfg(target_os = "linux")]
use notify_rust::Urgency;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::engine::Snapshot;
use crate::error::{EngineError, EngineResult};

/// Default time before a meeting starts at which its reminder fires.
pub const DEFAULT_LEAD_TIME: Duration = Duration::from_secs(5 * 60);

/// Default interval of the reminder check between refreshes.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Summary line of every reminder.
pub const REMINDER_SUMMARY: &str = "Upcoming Meeting";

/// Reminder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    /// Whether reminders fire at all.
    pub enabled: bool,
    /// How long before the start a reminder fires.
    pub lead_time: Duration,
    /// How often the watcher re-checks the last snapshot.
    pub check_interval: Duration,
    /// Application name shown by the notification daemon.
    pub app_name: String,
    /// Notification timeout in seconds.
    pub timeout_secs: u32,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lead_time: DEFAULT_LEAD_TIME,
            check_interval: DEFAULT_CHECK_INTERVAL,
            app_name: "MeetingBar".to_string(),
            timeout_secs: 10,
        }
    }
}

impl NotifyConfig {
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_lead_time(mut self, lead_time: Duration) -> Self {
        self.lead_time = lead_time;
        self
    }

    #[must_use]
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    #[must_use]
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, secs: u32) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn lead(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.lead_time).unwrap_or_else(|_| chrono::Duration::zero())
    }
}

/// A reminder for one meeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub meeting: Meeting,
    /// The configured lead time when the reminder fired.
    pub lead_time: Duration,
    /// Time left until the start when the reminder fired.
    pub time_until: chrono::Duration,
}

impl Reminder {
    /// The notification summary line.
    pub fn summary(&self) -> &'static str {
        REMINDER_SUMMARY
    }

    /// The notification body.
    pub fn body(&self) -> String {
        let when = if self.time_until < chrono::Duration::minutes(1) {
            "starting now".to_string()
        } else if self.time_until < chrono::Duration::hours(1) {
            format!("in {} minutes", self.time_until.num_minutes())
        } else {
            format!("at {}", format_clock(self.meeting.start))
        };

        let mut body = format!("{} {}", self.meeting.title, when);
        if let Some(link) = &self.meeting.link {
            body.push_str(&format!("\nJoin: {}", link.kind.display_name()));
        }
        body
    }
}

/// IDs of meetings whose reminder already fired.
#[derive(Debug, Clone, Default)]
pub struct NotifiedSet {
    fired: HashMap<String, DateTime<Utc>>,
}

impl NotifiedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, meeting_id: &str) -> bool {
        self.fired.contains_key(meeting_id)
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }

    /// Marks a meeting as fired. Returns false if it already was.
    pub fn mark(&mut self, meeting_id: impl Into<String>, at: DateTime<Utc>) -> bool {
        let id = meeting_id.into();
        if self.fired.contains_key(&id) {
            return false;
        }
        self.fired.insert(id, at);
        true
    }

    /// Drops IDs absent from `meetings` or whose meeting has ended.
    ///
    /// Returns the number of IDs dropped.
    pub fn prune(&mut self, meetings: &[Meeting], now: DateTime<Utc>) -> usize {
        let before = self.fired.len();
        self.fired.retain(|id, _| {
            meetings
                .iter()
                .any(|m| &m.id == id && !m.has_ended_at(now))
        });
        before - self.fired.len()
    }

    /// Marks and returns the reminders due at `now`, then prunes.
    ///
    /// A meeting is due when `0 < start - now <= lead_time`. When reminders
    /// are disabled nothing is due but pruning still happens.
    pub fn take_due(
        &mut self,
        meetings: &[Meeting],
        now: DateTime<Utc>,
        config: &NotifyConfig,
    ) -> Vec<Reminder> {
        let mut due = Vec::new();
        if config.enabled {
            let lead = config.lead();
            for meeting in meetings.iter().filter(|m| !m.is_all_day) {
                let until = meeting.time_until_start(now);
                if until <= chrono::Duration::zero() || until > lead {
                    continue;
                }
                if self.mark(&meeting.id, now) {
                    due.push(Reminder {
                        meeting: meeting.clone(),
                        lead_time: config.lead_time,
                        time_until: until,
                    });
                }
            }
        }

        let pruned = self.prune(meetings, now);
        if pruned > 0 {
            debug!(pruned, "Pruned notified meetings");
        }
        due
    }
}

/// Receives reminders.
///
/// Delivery failures are logged by the caller and never retried.
pub trait ReminderSink: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        "callback"
    }

    /// Delivers one reminder.
    fn deliver(&self, reminder: &Reminder) -> EngineResult<()>;
}

/// Adapts a closure into a [`ReminderSink`].
pub struct FnSink<F>(pub F);

impl<F> ReminderSink for FnSink<F>
where
    F: Fn(&Reminder) + Send + Sync,
{
    fn deliver(&self, reminder: &Reminder) -> EngineResult<()> {
        (self.0)(reminder);
        Ok(())
    }
}

/// Shows reminders as desktop notifications.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    config: NotifyConfig,
}

impl DesktopNotifier {
    pub fn new(config: NotifyConfig) -> Self {
        Self { config }
    }
}

impl ReminderSink for DesktopNotifier {
    fn name(&self) -> &str {
        "desktop"
    }

    fn deliver(&self, reminder: &Reminder) -> EngineResult<()> {
        let body = reminder.body();
        debug!(title = %reminder.meeting.title, "Sending notification");

        let mut notification = Notification::new();
        notification
            .appname(&self.config.app_name)
            .summary(reminder.summary())
            .body(&body)
            .timeout(Duration::from_secs(u64::from(self.config.timeout_secs)));

        #[cfg(target_os = "linux")]
        notification.urgency(Urgency::Normal);

        notification
            .show()
            .map(|_| info!(title = %reminder.meeting.title, "Notification sent"))
            .map_err(|e| EngineError::notification(e.to_string()))
    }
}

/// Fires reminders against published meeting sequences.
///
/// The refresh cycle and the periodic watcher share one instance, so a
/// meeting is reminded once no matter which of them sees it first.
#[derive(Default)]
pub struct NotificationScheduler {
    notified: Mutex<NotifiedSet>,
    sinks: RwLock<Vec<Arc<dyn ReminderSink>>>,
}

impl NotificationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sink that receives every reminder from now on.
    pub fn add_sink(&self, sink: Arc<dyn ReminderSink>) {
        self.sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    /// Number of meetings currently marked as reminded.
    pub async fn notified_count(&self) -> usize {
        self.notified.lock().await.len()
    }

    /// Fires due reminders to every sink and returns them.
    pub async fn check(
        &self,
        meetings: &[Meeting],
        now: DateTime<Utc>,
        config: &NotifyConfig,
    ) -> Vec<Reminder> {
        let due = self.notified.lock().await.take_due(meetings, now, config);
        self.deliver(&due);
        due
    }

    /// Like [`NotificationScheduler::check`], for the snapshot `latest` returns.
    ///
    /// `latest` runs with the notified set locked. A snapshot it publishes is
    /// therefore never pruned against an older one by a concurrent check.
    pub async fn check_latest<F>(
        &self,
        now: DateTime<Utc>,
        config: &NotifyConfig,
        latest: F,
    ) -> Vec<Reminder>
    where
        F: FnOnce() -> Arc<Snapshot>,
    {
        let due = {
            let mut notified = self.notified.lock().await;
            let snapshot = latest();
            notified.take_due(&snapshot.meetings, now, config)
        };
        self.deliver(&due);
        due
    }

    /// Sinks run outside the notified-set lock.
    fn deliver(&self, due: &[Reminder]) {
        if due.is_empty() {
            return;
        }
        let sinks = self
            .sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for reminder in due {
            info!(
                meeting_id = %reminder.meeting.id,
                title = %reminder.meeting.title,
                minutes = reminder.time_until.num_minutes(),
                "Reminder due"
            );
            for sink in &sinks {
                if let Err(e) = sink.deliver(reminder) {
                    error!(sink = sink.name(), error = %e, "Failed to deliver reminder");
                }
            }
        }
    }
}
