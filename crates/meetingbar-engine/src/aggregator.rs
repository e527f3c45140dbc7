//! Multi-source aggregation.
//!
//! Every enabled calendar of every source is fetched concurrently. A failing
//! calendar or source is logged and skipped; the rest of the batch goes on.
//! The merged result is normalized, filtered, and sorted into the one
//! sequence the rest of the engine works from.

use std::sync::Arc;

use futures_util::future::join_all;
use meetingbar_core::{CalendarDescriptor, Meeting, TimeWindow};
use meetingbar_providers::{
    CalendarScope, CalendarSource, ProviderResult, RawEvent, normalize_events,
};
use tracing::{debug, warn};

/// Result of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateOutcome {
    /// Meetings sorted by start, then title, then ID.
    pub meetings: Vec<Meeting>,
    pub total_sources: usize,
    pub failed_sources: usize,
    pub total_calendars: usize,
    pub failed_calendars: usize,
    /// Raw events dropped by normalization.
    pub rejected: usize,
}

impl AggregateOutcome {
    /// True when there was at least one source and every source failed.
    pub fn all_failed(&self) -> bool {
        self.total_sources > 0 && self.failed_sources == self.total_sources
    }

    /// True when some, but not all, calendars failed.
    pub fn is_partial(&self) -> bool {
        self.failed_calendars > 0 && !self.all_failed()
    }
}

/// Calendars reported by one source.
#[derive(Debug)]
pub struct SourceCalendars {
    pub source: String,
    pub calendars: ProviderResult<Vec<CalendarDescriptor>>,
}

#[derive(Debug, Default)]
struct SourceReport {
    events: Vec<RawEvent>,
    total_calendars: usize,
    failed_calendars: usize,
    failed: bool,
}

/// Fetches and merges meetings from a set of calendar sources.
#[derive(Clone, Default)]
pub struct Aggregator {
    sources: Vec<Arc<dyn CalendarSource>>,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn CalendarSource>>) -> Self {
        Self { sources }
    }

    /// An aggregator over a single source.
    pub fn single(source: Box<dyn CalendarSource>) -> Self {
        Self::new(vec![Arc::from(source)])
    }

    pub fn sources(&self) -> &[Arc<dyn CalendarSource>] {
        &self.sources
    }

    /// Lists every calendar of every source, enabled or not.
    pub async fn list_calendars(&self) -> Vec<SourceCalendars> {
        join_all(self.sources.iter().map(|source| async move {
            SourceCalendars {
                source: source.name().to_string(),
                calendars: source.list_calendars(CalendarScope::All).await,
            }
        }))
        .await
    }

    /// Aggregates meetings overlapping `window`.
    ///
    /// `enabled_calendars` restricts the calendars fetched; when empty, every
    /// calendar the source reports as enabled is used.
    pub async fn aggregate(
        &self,
        window: TimeWindow,
        enabled_calendars: &[String],
    ) -> AggregateOutcome {
        let reports = join_all(
            self.sources
                .iter()
                .map(|source| collect_source(source.as_ref(), window, enabled_calendars)),
        )
        .await;

        let mut outcome = AggregateOutcome {
            total_sources: self.sources.len(),
            ..Default::default()
        };
        let mut raw_events = Vec::new();
        for report in reports {
            outcome.total_calendars += report.total_calendars;
            outcome.failed_calendars += report.failed_calendars;
            if report.failed {
                outcome.failed_sources += 1;
            }
            raw_events.extend(report.events);
        }

        let batch = normalize_events(&raw_events);
        outcome.rejected = batch.rejected;
        outcome.meetings = batch
            .meetings
            .into_iter()
            .filter(|m| !m.is_all_day && !m.has_ended_at(window.start))
            .collect();
        sort_meetings(&mut outcome.meetings);

        debug!(
            meetings = outcome.meetings.len(),
            rejected = outcome.rejected,
            failed_sources = outcome.failed_sources,
            failed_calendars = outcome.failed_calendars,
            "Aggregation complete"
        );
        outcome
    }
}

/// Sorts by start, then title, then ID.
pub fn sort_meetings(meetings: &mut [Meeting]) {
    meetings.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.id.cmp(&b.id))
    });
}

async fn collect_source(
    source: &dyn CalendarSource,
    window: TimeWindow,
    enabled_calendars: &[String],
) -> SourceReport {
    // An explicit list may name calendars the source has switched off.
    let scope = if enabled_calendars.is_empty() {
        CalendarScope::Enabled
    } else {
        CalendarScope::All
    };

    let calendars = match source.list_calendars(scope).await {
        Ok(calendars) => calendars,
        Err(e) => {
            warn!(source = source.name(), error = %e, "Failed to list calendars");
            return SourceReport {
                failed: true,
                ..Default::default()
            };
        }
    };

    let calendars: Vec<CalendarDescriptor> = calendars
        .into_iter()
        .filter(|c| enabled_calendars.is_empty() || enabled_calendars.contains(&c.id))
        .collect();

    let results = join_all(
        calendars
            .iter()
            .map(|c| source.list_events(&c.id, window)),
    )
    .await;

    let mut report = SourceReport {
        total_calendars: calendars.len(),
        ..Default::default()
    };
    for (calendar, result) in calendars.iter().zip(results) {
        match result {
            Ok(events) => {
                debug!(
                    source = source.name(),
                    calendar_id = %calendar.id,
                    count = events.len(),
                    "Fetched events"
                );
                report.events.extend(events);
            }
            Err(e) => {
                warn!(
                    source = source.name(),
                    calendar_id = %calendar.id,
                    error = %e,
                    "Failed to fetch events"
                );
                report.failed_calendars += 1;
            }
        }
    }
    report.failed = report.total_calendars > 0 && report.failed_calendars == report.total_calendars;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSource, now, timed_event};
    use chrono::NaiveDate;
    use meetingbar_core::ProviderKind;
    use meetingbar_providers::{BackendKind, FailingSource, ProviderError, RawEventTime};

    fn window() -> TimeWindow {
        TimeWindow::default_lookahead(now())
    }

    fn aggregator(sources: Vec<Arc<dyn CalendarSource>>) -> Aggregator {
        Aggregator::new(sources)
    }

    mod filtering {
        use super::*;

        #[tokio::test]
        async fn drops_cancelled_all_day_and_ended() {
            let holiday = NaiveDate::from_ymd_opt(2025, 2, 5).unwrap();
            let source = FakeSource::new("fake")
                .with_calendar("work")
                .with_events(
                    "work",
                    vec![
                        timed_event("ok", "Standup", 15, 30),
                        timed_event("gone", "Retro", 30, 30).with_status("CANCELLED"),
                        timed_event("ended", "Early", -60, 30),
                        timed_event("holiday", "Holiday", 0, 0)
                            .with_start(Some(RawEventTime::Date(holiday)))
                            .with_end(None),
                        timed_event("nostart", "Broken", 0, 30).with_start(None),
                    ],
                );
            let outcome = aggregator(vec![Arc::new(source)])
                .aggregate(window(), &[])
                .await;
            let ids: Vec<_> = outcome.meetings.iter().map(|m| m.id.as_str()).collect();
            assert_eq!(ids, vec!["ok"]);
            assert_eq!(outcome.rejected, 2);
        }

        #[tokio::test]
        async fn ongoing_meeting_is_kept() {
            let source = FakeSource::new("fake")
                .with_calendar("work")
                .with_events("work", vec![timed_event("now", "Sync", -10, 30)]);
            let outcome = aggregator(vec![Arc::new(source)])
                .aggregate(window(), &[])
                .await;
            assert_eq!(outcome.meetings.len(), 1);
        }

        #[tokio::test]
        async fn respects_enabled_calendars() {
            let source = FakeSource::new("fake")
                .with_calendar("work")
                .with_disabled_calendar("team")
                .with_calendar("personal")
                .with_events("work", vec![timed_event("a", "Work", 10, 30)])
                .with_events("team", vec![timed_event("b", "Team", 20, 30)])
                .with_events("personal", vec![timed_event("c", "Gym", 30, 30)]);
            let agg = aggregator(vec![Arc::new(source)]);

            let all = agg.aggregate(window(), &[]).await;
            let ids: Vec<_> = all.meetings.iter().map(|m| m.id.as_str()).collect();
            assert_eq!(ids, vec!["a", "c"]);

            let explicit = agg
                .aggregate(window(), &["team".to_string(), "personal".to_string()])
                .await;
            let ids: Vec<_> = explicit.meetings.iter().map(|m| m.id.as_str()).collect();
            assert_eq!(ids, vec!["b", "c"]);
            assert_eq!(explicit.total_calendars, 2);
        }
    }

    mod ordering {
        use super::*;

        #[tokio::test]
        async fn sorts_by_start_then_title_then_id() {
            let source = FakeSource::new("fake")
                .with_calendar("work")
                .with_calendar("team")
                .with_events(
                    "work",
                    vec![
                        timed_event("z", "Beta", 30, 30),
                        timed_event("y", "Alpha", 30, 30),
                        timed_event("x", "Early", 10, 30),
                    ],
                )
                .with_events("team", vec![timed_event("w", "Alpha", 30, 30)]);
            let outcome = aggregator(vec![Arc::new(source)])
                .aggregate(window(), &[])
                .await;
            let ids: Vec<_> = outcome.meetings.iter().map(|m| m.id.as_str()).collect();
            assert_eq!(ids, vec!["x", "w", "y", "z"]);
        }

        #[tokio::test]
        async fn merges_sources() {
            let a = FakeSource::new("a")
                .with_calendar("one")
                .with_events("one", vec![timed_event("a1", "Later", 60, 30)]);
            let b = FakeSource::new("b")
                .with_calendar("two")
                .with_events("two", vec![timed_event("b1", "Sooner", 20, 30)]);
            let outcome = aggregator(vec![Arc::new(a), Arc::new(b)])
                .aggregate(window(), &[])
                .await;
            let ids: Vec<_> = outcome.meetings.iter().map(|m| m.id.as_str()).collect();
            assert_eq!(ids, vec!["b1", "a1"]);
            assert_eq!(outcome.total_sources, 2);
        }

        #[tokio::test]
        async fn conference_link_is_resolved() {
            let source = FakeSource::new("fake").with_calendar("work").with_events(
                "work",
                vec![
                    timed_event("m", "Sync", 10, 30).with_description(
                        "Zoom: https://zoom.us/j/123 or https://teams.microsoft.com/l/meetup-join/abc",
                    ),
                ],
            );
            let outcome = aggregator(vec![Arc::new(source)])
                .aggregate(window(), &[])
                .await;
            let link = outcome.meetings[0].link.as_ref().unwrap();
            assert_eq!(link.kind, ProviderKind::Teams);
        }
    }

    mod failures {
        use super::*;

        #[tokio::test]
        async fn failing_calendar_is_skipped() {
            let source = FakeSource::new("fake")
                .with_calendar("work")
                .with_calendar("broken")
                .with_events("work", vec![timed_event("a", "Standup", 10, 30)])
                .with_failing_calendar("broken", ProviderError::permission_denied("nope"));
            let outcome = aggregator(vec![Arc::new(source)])
                .aggregate(window(), &[])
                .await;
            assert_eq!(outcome.meetings.len(), 1);
            assert_eq!(outcome.failed_calendars, 1);
            assert_eq!(outcome.failed_sources, 0);
            assert!(outcome.is_partial());
            assert!(!outcome.all_failed());
        }

        #[tokio::test]
        async fn failing_source_is_skipped() {
            let good = FakeSource::new("good")
                .with_calendar("work")
                .with_events("work", vec![timed_event("a", "Standup", 10, 30)]);
            let bad = FailingSource::new(
                "bad",
                BackendKind::RemoteApi,
                ProviderError::unavailable("offline"),
            );
            let outcome = aggregator(vec![Arc::new(good), Arc::new(bad)])
                .aggregate(window(), &[])
                .await;
            assert_eq!(outcome.meetings.len(), 1);
            assert_eq!(outcome.failed_sources, 1);
            assert!(!outcome.all_failed());
        }

        #[tokio::test]
        async fn all_sources_failing_is_reported() {
            let bad = FailingSource::new(
                "bad",
                BackendKind::LocalDesktopBus,
                ProviderError::unavailable("no store"),
            );
            let outcome = aggregator(vec![Arc::new(bad)])
                .aggregate(window(), &[])
                .await;
            assert!(outcome.meetings.is_empty());
            assert!(outcome.all_failed());
        }

        #[tokio::test]
        async fn no_sources_is_not_a_failure() {
            let outcome = Aggregator::default().aggregate(window(), &[]).await;
            assert!(outcome.meetings.is_empty());
            assert!(!outcome.all_failed());
        }
    }

    #[tokio::test]
    async fn lists_calendars_per_source() {
        let source = FakeSource::new("fake")
            .with_calendar("work")
            .with_disabled_calendar("team");
        let listing = aggregator(vec![Arc::new(source)]).list_calendars().await;
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].source, "fake");
        assert_eq!(listing[0].calendars.as_ref().unwrap().len(), 2);
    }
}
