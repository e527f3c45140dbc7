//! The engine handle.
//!
//! [`Engine`] owns the configuration, the calendar sources, the published
//! [`Snapshot`] and the reminder bookkeeping. It is cheap to clone; every
//! clone shares the same state.
//!
//! ```text
//! refresh_now()
//!   └─ aggregate ─ resolve ─ publish ─ notify
//!                               │
//!                    current_state() / subscribe()
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use meetingbar_core::{Agenda, DisplayState, Meeting, MeetingLink, TimeWindow};
use meetingbar_providers::{CalendarSource, build_source_or_failing};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::aggregator::{AggregateOutcome, Aggregator, SourceCalendars};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::notify::{FnSink, NotificationScheduler, Reminder, ReminderSink};

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The published result of a refresh cycle.
///
/// Snapshots are immutable; each cycle replaces the whole value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Meetings sorted by start, then title, then ID.
    pub meetings: Vec<Meeting>,
    /// Display state resolved when the snapshot was published.
    pub state: DisplayState,
    /// When the cycle ran; `None` before the first cycle.
    pub refreshed_at: Option<DateTime<Utc>>,
    pub total_sources: usize,
    pub failed_sources: usize,
    pub failed_calendars: usize,
}

impl Snapshot {
    fn from_outcome(outcome: AggregateOutcome, now: DateTime<Utc>) -> Self {
        Self {
            state: DisplayState::resolve(&outcome.meetings, now),
            meetings: outcome.meetings,
            refreshed_at: Some(now),
            total_sources: outcome.total_sources,
            failed_sources: outcome.failed_sources,
            failed_calendars: outcome.failed_calendars,
        }
    }

    /// True when there was at least one source and every source failed.
    pub fn all_failed(&self) -> bool {
        self.total_sources > 0 && self.failed_sources == self.total_sources
    }

    /// Re-resolves the display state for a later instant.
    pub fn display_state(&self, now: DateTime<Utc>) -> DisplayState {
        DisplayState::resolve(&self.meetings, now)
    }

    /// The agenda listing at `now`.
    pub fn agenda(&self, now: DateTime<Utc>, max: usize) -> Agenda {
        Agenda::build(&self.meetings, now, max)
    }

    /// The meeting a join request refers to.
    ///
    /// With an ID, that meeting; without one, the canonical meeting at `now`
    /// when it has a link, otherwise the next meeting that has one.
    pub fn join_target(&self, meeting_id: Option<&str>, now: DateTime<Utc>) -> Option<&Meeting> {
        if let Some(id) = meeting_id {
            return self.meetings.iter().find(|m| m.id == id);
        }
        let canonical = self.display_state(now).meeting().map(|m| m.id.clone());
        canonical
            .and_then(|id| self.meetings.iter().find(|m| m.id == id && m.link.is_some()))
            .or_else(|| {
                self.meetings
                    .iter()
                    .find(|m| !m.has_ended_at(now) && m.link.is_some())
            })
    }

    /// Like [`Snapshot::join_target`], but also requires a link.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoMeeting`] when nothing matches or the meeting has no link.
    pub fn join_link(
        &self,
        meeting_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> EngineResult<(&Meeting, &MeetingLink)> {
        let meeting = self
            .join_target(meeting_id, now)
            .ok_or_else(|| match meeting_id {
                Some(id) => EngineError::no_meeting(format!("no meeting with id '{id}'")),
                None => EngineError::no_meeting("no upcoming meeting has a link"),
            })?;
        let link = meeting.link.as_ref().ok_or_else(|| {
            EngineError::no_meeting(format!("meeting '{}' has no link", meeting.title))
        })?;
        Ok((meeting, link))
    }
}

/// What a call to [`Engine::refresh_now`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A cycle ran and published a new snapshot.
    Completed,
    /// Another cycle was running; this request was dropped.
    AlreadyInFlight,
}

struct Inner {
    config: RwLock<Arc<EngineConfig>>,
    aggregator: RwLock<Arc<Aggregator>>,
    /// Whether sources come from `config.source` and follow reloads.
    owns_sources: bool,
    snapshot: RwLock<Arc<Snapshot>>,
    updates: watch::Sender<Arc<Snapshot>>,
    in_flight: AtomicBool,
    notifier: NotificationScheduler,
    clock: Clock,
}

/// Clears the in-flight flag when a cycle ends or is cancelled.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Builds an [`Engine`].
pub struct EngineBuilder {
    config: EngineConfig,
    sources: Option<Vec<Arc<dyn CalendarSource>>>,
    clock: Option<Clock>,
}

impl EngineBuilder {
    /// Uses these sources instead of building one from `config.source`.
    #[must_use]
    pub fn sources(mut self, sources: Vec<Arc<dyn CalendarSource>>) -> Self {
        self.sources = Some(sources);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Engine {
        let config = self.config.sanitized();
        let owns_sources = self.sources.is_none();
        let aggregator = match self.sources {
            Some(sources) => Aggregator::new(sources),
            None => Aggregator::single(build_source_or_failing(&config.source)),
        };
        let clock: Clock = match self.clock {
            Some(clock) => clock,
            None => Arc::new(Utc::now),
        };
        let empty = Arc::new(Snapshot::default());
        let (updates, _) = watch::channel(empty.clone());

        Engine {
            inner: Arc::new(Inner {
                config: RwLock::new(Arc::new(config)),
                aggregator: RwLock::new(Arc::new(aggregator)),
                owns_sources,
                snapshot: RwLock::new(empty),
                updates,
                in_flight: AtomicBool::new(false),
                notifier: NotificationScheduler::new(),
                clock,
            }),
        }
    }
}

/// Shared handle to the meeting engine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl Engine {
    /// An engine reading from the source described by `config.source`.
    pub fn new(config: EngineConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder {
            config,
            sources: None,
            clock: None,
        }
    }

    /// The current time according to the engine clock.
    pub fn now(&self) -> DateTime<Utc> {
        (self.inner.clock)()
    }

    /// The configuration in effect.
    pub fn config(&self) -> Arc<EngineConfig> {
        self.inner
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn aggregator(&self) -> Arc<Aggregator> {
        self.inner
            .aggregator
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The latest published snapshot. Never blocks on a running cycle.
    pub fn current_state(&self) -> Arc<Snapshot> {
        self.inner
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receives every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.inner.updates.subscribe()
    }

    /// Registers a callback invoked once per meeting entering its lead window.
    pub fn on_reminder_due<F>(&self, callback: F)
    where
        F: Fn(&Reminder) + Send + Sync + 'static,
    {
        self.inner.notifier.add_sink(Arc::new(FnSink(callback)));
    }

    /// Registers a reminder sink.
    pub fn add_reminder_sink(&self, sink: Arc<dyn ReminderSink>) {
        self.inner.notifier.add_sink(sink);
    }

    /// Runs one refresh cycle unless one is already running.
    ///
    /// Dropping the returned future cancels the cycle; nothing is published.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.inner.in_flight) else {
            debug!("Refresh already in flight, dropping request");
            return RefreshOutcome::AlreadyInFlight;
        };
        self.run_cycle().await;
        RefreshOutcome::Completed
    }

    async fn run_cycle(&self) {
        let config = self.config();
        let aggregator = self.aggregator();
        let started = self.now();
        let window = TimeWindow::from_now(started, config.lookahead);

        let outcome = aggregator
            .aggregate(window, &config.enabled_calendars)
            .await;
        if outcome.all_failed() {
            error!(
                failed = outcome.failed_sources,
                total = outcome.total_sources,
                "All calendar sources failed"
            );
        } else if outcome.is_partial() {
            warn!(
                failed_calendars = outcome.failed_calendars,
                total_calendars = outcome.total_calendars,
                "Some calendars failed to refresh"
            );
        }

        let now = self.now();
        let snapshot = Arc::new(Snapshot::from_outcome(outcome, now));
        self.inner
            .notifier
            .check_latest(now, &config.notify, || {
                self.publish(snapshot.clone());
                snapshot
            })
            .await;
    }

    fn publish(&self, snapshot: Arc<Snapshot>) {
        info!(
            meetings = snapshot.meetings.len(),
            state = snapshot.state.label(),
            "Published snapshot"
        );
        *self
            .inner
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        self.inner.updates.send_replace(snapshot);
    }

    /// Re-checks reminders against the latest snapshot.
    pub async fn check_reminders(&self) -> Vec<Reminder> {
        let config = self.config();
        self.inner
            .notifier
            .check_latest(self.now(), &config.notify, || self.current_state())
            .await
    }

    /// Swaps the configuration; takes effect on the next cycle.
    ///
    /// When the engine built its own source and the source settings changed,
    /// the source is rebuilt.
    pub fn reload_config(&self, config: EngineConfig) {
        let config = config.sanitized();
        let previous = self.config();

        if self.inner.owns_sources && previous.source != config.source {
            info!(backend = %config.source.backend, "Calendar source changed, rebuilding");
            let aggregator = Aggregator::single(build_source_or_failing(&config.source));
            *self
                .inner
                .aggregator
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Arc::new(aggregator);
        }

        *self
            .inner
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
        info!("Configuration reloaded");
    }

    /// Lists the calendars of every source.
    pub async fn list_calendars(&self) -> Vec<SourceCalendars> {
        self.aggregator().list_calendars().await
    }
}
