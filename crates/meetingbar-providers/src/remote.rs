//! Remote calendar feeds.
//!
//! Each configured calendar is an iCalendar feed URL (the "secret address"
//! calendar services publish). Feeds are fetched over HTTPS on every
//! `list_events` call; there is no local cache.

use std::time::Duration;

use meetingbar_core::{CalendarDescriptor, TimeWindow};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::backend::{BackendKind, RemoteCalendar};
use crate::error::{ProviderError, ProviderResult};
use crate::ics::parse_ics_content;
use crate::raw_event::RawEvent;
use crate::source::{BoxFuture, CalendarScope, CalendarSource};

const USER_AGENT: &str = concat!("meetingbar/", env!("CARGO_PKG_VERSION"));

/// Reads calendars from iCalendar feed URLs.
#[derive(Debug, Clone)]
pub struct RemoteFeedSource {
    client: Client,
    account_id: String,
    calendars: Vec<RemoteCalendar>,
}

impl RemoteFeedSource {
    /// Creates a source for the given feeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        account_id: impl Into<String>,
        calendars: Vec<RemoteCalendar>,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {}", e))
                    .with_provider("remote")
            })?;

        Ok(Self {
            client,
            account_id: account_id.into(),
            calendars,
        })
    }

    async fn fetch(&self, url: &str) -> ProviderResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::unavailable(format!("request failed: {}", e)))?;

        match response.status() {
            status if status.is_success() => response
                .text()
                .await
                .map_err(|e| ProviderError::unavailable(format!("failed to read response: {}", e))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(
                ProviderError::permission_denied("access to calendar feed denied"),
            ),
            StatusCode::NOT_FOUND => Err(ProviderError::not_found("calendar feed not found")),
            status => Err(ProviderError::unavailable(format!(
                "calendar feed returned HTTP {}",
                status
            ))),
        }
    }
}

/// Rewrites `webcal://` to `https://`.
pub fn feed_url(url: &str) -> String {
    match url.get(..9) {
        Some(scheme) if scheme.eq_ignore_ascii_case("webcal://") => {
            format!("https://{}", &url[9..])
        }
        _ => url.to_string(),
    }
}

impl CalendarSource for RemoteFeedSource {
    fn name(&self) -> &str {
        BackendKind::RemoteApi.as_str()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::RemoteApi
    }

    fn list_calendars(
        &self,
        scope: CalendarScope,
    ) -> BoxFuture<'_, ProviderResult<Vec<CalendarDescriptor>>> {
        let calendars = self
            .calendars
            .iter()
            .map(|c| {
                let mut desc = CalendarDescriptor::new(&c.id, c.display_name(), &self.account_id)
                    .with_enabled(c.enabled);
                desc.color = c.color.clone();
                desc
            })
            .collect();
        Box::pin(async move { Ok(scope.apply(calendars)) })
    }

    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
        Box::pin(async move {
            let calendar = self
                .calendars
                .iter()
                .find(|c| c.id == calendar_id)
                .ok_or_else(|| {
                    ProviderError::not_found(format!("no remote calendar '{calendar_id}'"))
                        .with_provider(self.name())
                })?;

            let url = feed_url(&calendar.url);
            debug!(calendar_id, "Fetching calendar feed");
            let body = self
                .fetch(&url)
                .await
                .map_err(|e| e.with_provider(self.name()))?;

            let events = parse_ics_content(&body, calendar_id)
                .map_err(|e| e.with_provider(self.name()))?
                .into_iter()
                .filter(|ev| ev.may_overlap(&window))
                .map(|ev| ev.with_account(&self.account_id))
                .collect();
            Ok(events)
        })
    }
}
