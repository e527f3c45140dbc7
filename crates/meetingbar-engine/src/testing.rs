//! In-memory calendar source for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use meetingbar_core::{CalendarDescriptor, TimeWindow};
use meetingbar_providers::{
    BackendKind, BoxFuture, CalendarScope, CalendarSource, ProviderError, ProviderErrorCode,
    ProviderResult, RawEvent, RawEventTime,
};
use tokio::sync::Semaphore;

/// Fixed "now" used across engine tests.
pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 5, 9, 0, 0).unwrap()
}

/// An event starting `start_mins` after [`now`] and lasting `len_mins`.
pub(crate) fn timed_event(id: &str, title: &str, start_mins: i64, len_mins: i64) -> RawEvent {
    let start = now() + Duration::minutes(start_mins);
    RawEvent::new(
        id,
        RawEventTime::DateTime(start),
        RawEventTime::DateTime(start + Duration::minutes(len_mins)),
        "work",
    )
    .with_summary(title)
}

pub(crate) struct FakeSource {
    name: String,
    calendars: Vec<CalendarDescriptor>,
    events: Mutex<HashMap<String, Vec<RawEvent>>>,
    failing: HashMap<String, (ProviderErrorCode, String)>,
    gate: Option<Arc<Semaphore>>,
    fetches: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calendars: Vec::new(),
            events: Mutex::new(HashMap::new()),
            failing: HashMap::new(),
            gate: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_calendar(mut self, id: &str) -> Self {
        self.calendars
            .push(CalendarDescriptor::new(id, id, &self.name));
        self
    }

    pub(crate) fn with_disabled_calendar(mut self, id: &str) -> Self {
        self.calendars
            .push(CalendarDescriptor::new(id, id, &self.name).with_enabled(false));
        self
    }

    pub(crate) fn with_events(self, calendar_id: &str, events: Vec<RawEvent>) -> Self {
        self.set_events(calendar_id, events);
        self
    }

    pub(crate) fn with_failing_calendar(mut self, id: &str, error: ProviderError) -> Self {
        self.failing
            .insert(id.to_string(), (error.code(), error.message().to_string()));
        self
    }

    /// Every `list_events` call waits for a permit from `gate`.
    pub(crate) fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn set_events(&self, calendar_id: &str, events: Vec<RawEvent>) {
        let events = events
            .into_iter()
            .map(|mut e| {
                e.calendar_id = calendar_id.to_string();
                e
            })
            .collect();
        self.events
            .lock()
            .unwrap()
            .insert(calendar_id.to_string(), events);
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl CalendarSource for FakeSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        BackendKind::LocalDesktopBus
    }

    fn list_calendars(
        &self,
        scope: CalendarScope,
    ) -> BoxFuture<'_, ProviderResult<Vec<CalendarDescriptor>>> {
        let calendars = scope.apply(self.calendars.clone());
        Box::pin(async move { Ok(calendars) })
    }

    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        _window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            if let Some((code, message)) = self.failing.get(calendar_id) {
                return Err(ProviderError::new(*code, message.clone()).with_provider(&self.name));
            }
            Ok(self
                .events
                .lock()
                .unwrap()
                .get(calendar_id)
                .cloned()
                .unwrap_or_default())
        })
    }
}
