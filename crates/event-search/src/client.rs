//! HTTP client for calendar feeds.
//!
//! [`EventSource`] is the seam between the search orchestration and the
//! network; [`GoogleCalendarClient`] implements it against the Calendar v3
//! events-list endpoint:
//!
//! ```text
//! GET {base}/{calendarId}/events?key=..&timeMin=..&timeMax=..&singleEvents=true&orderBy=startTime
//! ```

use std::time::Duration;

use async_trait::async_trait;
use date_resolver::ResolvedRange;
use reqwest::{Client, Url};

use crate::error::SearchError;
use crate::model::{CalendarEvent, EventsPage};
use crate::registry::CalendarFeed;

/// Default events-list base URL.
pub const GOOGLE_CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3/calendars";

/// Anything that can list the events of one feed in a time window.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch(
        &self,
        feed: &CalendarFeed,
        range: &ResolvedRange,
    ) -> Result<Vec<CalendarEvent>, SearchError>;
}

/// Calendar v3 events-list client authenticated with an API key.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl GoogleCalendarClient {
    /// Build a client.
    ///
    /// `request_timeout` bounds each individual HTTP request.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute http(s) URL, or [`SearchError::Config`] if the HTTP client
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, SearchError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SearchError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Full request URL for `feed` over `range`.
    pub fn events_url(&self, feed: &CalendarFeed, range: &ResolvedRange) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&feed.calendar_id)
                .push("events");
        }
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("timeMin", &range.time_min_param())
            .append_pair("timeMax", &range.time_max_param())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime");
        url
    }
}

#[async_trait]
impl EventSource for GoogleCalendarClient {
    async fn fetch(
        &self,
        feed: &CalendarFeed,
        range: &ResolvedRange,
    ) -> Result<Vec<CalendarEvent>, SearchError> {
        let url = self.events_url(feed, range);
        tracing::debug!(city = %feed.city, calendar = %feed.calendar_id, "fetching feed");

        let resp = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| SearchError::Http {
                city: feed.city.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::FeedStatus {
                city: feed.city.clone(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|source| SearchError::Http {
            city: feed.city.clone(),
            source,
        })?;
        let page: EventsPage = serde_json::from_slice(&body).map_err(|e| SearchError::Decode {
            city: feed.city.clone(),
            reason: e.to_string(),
        })?;

        Ok(page.items)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, SearchError> {
    let invalid = |reason: String| SearchError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" if !url.cannot_be_a_base() => Ok(url),
        scheme => Err(invalid(format!("unsupported scheme '{scheme}'"))),
    }
}
