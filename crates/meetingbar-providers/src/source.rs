//! CalendarSource trait definition.
//!
//! A [`CalendarSource`] is one configured backend. It lists the calendars it
//! can see and the raw events of one calendar inside a time window. Sources
//! never normalize: the aggregator does that for every source alike.

use std::future::Future;
use std::pin::Pin;

use meetingbar_core::{CalendarDescriptor, TimeWindow};

use crate::backend::BackendKind;
use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::RawEvent;

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe so a source can be stored as
/// `Box<dyn CalendarSource>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Which calendars [`CalendarSource::list_calendars`] should report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarScope {
    /// Every calendar the source knows about.
    #[default]
    All,
    /// Only calendars marked enabled by the source.
    Enabled,
}

impl CalendarScope {
    /// Applies this scope to a list of calendars.
    pub fn apply(self, calendars: Vec<CalendarDescriptor>) -> Vec<CalendarDescriptor> {
        match self {
            Self::All => calendars,
            Self::Enabled => calendars.into_iter().filter(|c| c.enabled).collect(),
        }
    }
}

/// The abstraction over calendar backends.
///
/// # Errors
///
/// - `list_calendars` fails with `SourceUnavailable` when the backend cannot
///   be reached.
/// - `list_events` fails with `SourceUnavailable`, `PermissionDenied`, or
///   `NotFound` for an unknown calendar.
pub trait CalendarSource: Send + Sync {
    /// Returns the name of this source (used in logs and errors).
    fn name(&self) -> &str;

    /// Returns the backend kind.
    fn kind(&self) -> BackendKind;

    /// Lists calendars visible to this source.
    fn list_calendars(
        &self,
        scope: CalendarScope,
    ) -> BoxFuture<'_, ProviderResult<Vec<CalendarDescriptor>>>;

    /// Lists raw events of one calendar overlapping `window`.
    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>>;
}

/// A source that always fails with the same error.
///
/// Stands in for a backend that could not be constructed so the rest of the
/// engine keeps running and reports the failure every cycle.
#[derive(Debug)]
pub struct FailingSource {
    name: String,
    kind: BackendKind,
    error: ProviderError,
}

impl FailingSource {
    pub fn new(name: impl Into<String>, kind: BackendKind, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            kind,
            error,
        }
    }

    fn error(&self) -> ProviderError {
        ProviderError::new(self.error.code(), self.error.message()).with_provider(&self.name)
    }
}

impl CalendarSource for FailingSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn list_calendars(
        &self,
        _scope: CalendarScope,
    ) -> BoxFuture<'_, ProviderResult<Vec<CalendarDescriptor>>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn list_events<'a>(
        &'a self,
        _calendar_id: &'a str,
        _window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }
}
