//! Multi-calendar event search.
//!
//! A search resolves the query's day expression into a time window, fans
//! out one request per selected feed, and merges whatever comes back:
//!
//! 1. resolve `when` for `city` (unresolved → 24 hours from now)
//! 2. select feeds for `city` (all feeds when absent)
//! 3. fetch every feed concurrently, each under its own timeout and all
//!    under an overall deadline; failures are logged and skipped
//! 4. tag events with their city, apply keyword/location filters
//! 5. stable-sort by start instant
//!
//! Only an invalid explicit range fails the whole search.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use date_resolver::{resolve_expression, ResolvedRange, TemporalExpression};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::EventSource;
use crate::config::{SearchConfig, DEFAULT_DEADLINE, DEFAULT_FEED_TIMEOUT};
use crate::error::SearchError;
use crate::model::TaggedEvent;
use crate::registry::{CalendarFeed, CityDirectory};

/// What to look for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Day expression ("tonight", "friday", "3rd May 2025", or a whole message).
    pub when: Option<String>,
    /// Free-text city filter; also selects the timezone.
    pub city: Option<String>,
    /// Case-insensitive match on summary, description or location.
    pub keyword: Option<String>,
    /// Case-insensitive match on location only.
    pub location: Option<String>,
    /// Explicit window; overrides `when`.
    pub range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn when(mut self, expression: impl Into<String>) -> Self {
        self.when = Some(expression.into());
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn range(mut self, time_min: DateTime<Utc>, time_max: DateTime<Utc>) -> Self {
        self.range = Some((time_min, time_max));
        self
    }
}

/// How one feed fared during a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeedStatus {
    Ok { events: usize },
    Failed { reason: String },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedReport {
    pub city: String,
    #[serde(flatten)]
    pub status: FeedStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub range: ResolvedRange,
    /// `false` when the day expression was not understood and the default
    /// 24-hour window was used.
    pub resolved: bool,
    pub events: Vec<TaggedEvent>,
    pub feeds: Vec<FeedReport>,
}

impl SearchResults {
    /// Whether every selected feed answered.
    pub fn is_complete(&self) -> bool {
        self.feeds
            .iter()
            .all(|f| matches!(f.status, FeedStatus::Ok { .. }))
    }
}

/// Fan-out search over the feeds of a [`CityDirectory`].
pub struct EventSearch<S> {
    directory: Arc<CityDirectory>,
    source: S,
    feed_timeout: Duration,
    overall_deadline: Duration,
}

impl<S: EventSource> EventSearch<S> {
    pub fn new(directory: Arc<CityDirectory>, source: S) -> Self {
        Self {
            directory,
            source,
            feed_timeout: DEFAULT_FEED_TIMEOUT,
            overall_deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_timeouts(mut self, feed_timeout: Duration, overall_deadline: Duration) -> Self {
        self.feed_timeout = feed_timeout;
        self.overall_deadline = overall_deadline;
        self
    }

    /// Apply the timeouts from `config`.
    pub fn with_config(self, config: &SearchConfig) -> Self {
        self.with_timeouts(config.feed_timeout, config.overall_deadline)
    }

    pub fn directory(&self) -> &CityDirectory {
        &self.directory
    }

    /// Resolve the window a query covers.
    ///
    /// Returns the range and whether it came from the query (explicit range
    /// or a recognized expression) rather than the fallback window.
    pub fn window(
        &self,
        query: &EventQuery,
        now: DateTime<Utc>,
    ) -> Result<(ResolvedRange, bool), SearchError> {
        let zone = self.directory.zone_for_city(query.city.as_deref());

        if let Some((time_min, time_max)) = query.range {
            return Ok((ResolvedRange::new(time_min, time_max, zone)?, true));
        }

        let resolved = query
            .when
            .as_deref()
            .map(TemporalExpression::parse)
            .and_then(|expr| resolve_expression(&expr, zone, now));
        Ok(match resolved {
            Some(range) => (range, true),
            None => (ResolvedRange::fallback(now, zone), false),
        })
    }

    /// Run `query` against every matching feed.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Resolver`] if the query carries an empty or
    /// inverted explicit range. Feed failures are reported per feed in
    /// [`SearchResults::feeds`], never as an error.
    pub async fn search(
        &self,
        query: &EventQuery,
        now: DateTime<Utc>,
    ) -> Result<SearchResults, SearchError> {
        let (range, resolved) = self.window(query, now)?;
        let feeds = self.directory.feeds_for(query.city.as_deref());

        if feeds.is_empty() {
            warn!(city = ?query.city, "no calendar feeds match city");
        }
        debug!(
            time_min = %range.time_min_param(),
            time_max = %range.time_max_param(),
            feeds = feeds.len(),
            resolved,
            "searching feeds"
        );

        let (batches, feed_reports) = self.fetch_all(&feeds, &range).await;

        let keyword = normalize_filter(query.keyword.as_deref());
        let location = normalize_filter(query.location.as_deref());

        let mut events: Vec<TaggedEvent> = batches
            .into_iter()
            .flatten()
            .filter(|e| keyword.as_deref().is_none_or(|k| e.event.mentions(k)))
            .filter(|e| location.as_deref().is_none_or(|l| e.event.located_in(l)))
            .collect();
        events.sort_by_key(|e| (e.starts_at.is_none(), e.starts_at));

        let results = SearchResults {
            range,
            resolved,
            events,
            feeds: feed_reports,
        };
        info!(
            events = results.events.len(),
            feeds = results.feeds.len(),
            complete = results.is_complete(),
            "search finished"
        );
        Ok(results)
    }

    /// Fetch all feeds concurrently.
    ///
    /// Batches come back in feed order regardless of completion order, so
    /// ties in the later stable sort keep registry order.
    async fn fetch_all(
        &self,
        feeds: &[&CalendarFeed],
        range: &ResolvedRange,
    ) -> (Vec<Vec<TaggedEvent>>, Vec<FeedReport>) {
        let mut batches: Vec<Vec<TaggedEvent>> = vec![Vec::new(); feeds.len()];
        let mut statuses: Vec<Option<FeedStatus>> = vec![None; feeds.len()];

        let mut pending: FuturesUnordered<_> = feeds
            .iter()
            .enumerate()
            .map(|(idx, feed)| async move {
                let outcome =
                    tokio::time::timeout(self.feed_timeout, self.source.fetch(feed, range)).await;
                (idx, outcome)
            })
            .collect();

        let deadline = tokio::time::Instant::now() + self.overall_deadline;
        loop {
            let next = tokio::time::timeout_at(deadline, pending.next()).await;
            match next {
                Ok(Some((idx, outcome))) => {
                    let feed = feeds[idx];
                    statuses[idx] = Some(match outcome {
                        Ok(Ok(items)) => {
                            debug!(city = %feed.city, events = items.len(), "feed answered");
                            let zone = self.directory.zone_for_feed(feed);
                            let count = items.len();
                            batches[idx] = items
                                .into_iter()
                                .map(|event| TaggedEvent::new(feed.city.clone(), zone, event))
                                .collect();
                            FeedStatus::Ok { events: count }
                        }
                        Ok(Err(e)) => {
                            warn!(city = %feed.city, error = %e, "feed failed, skipping");
                            FeedStatus::Failed {
                                reason: e.to_string(),
                            }
                        }
                        Err(_) => {
                            warn!(city = %feed.city, timeout = ?self.feed_timeout, "feed timed out, skipping");
                            FeedStatus::TimedOut
                        }
                    });
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        deadline = ?self.overall_deadline,
                        pending = pending.len(),
                        "search deadline reached, returning partial results"
                    );
                    break;
                }
            }
        }

        let reports = feeds
            .iter()
            .zip(statuses)
            .map(|(feed, status)| FeedReport {
                city: feed.city.clone(),
                status: status.unwrap_or(FeedStatus::TimedOut),
            })
            .collect();
        (batches, reports)
    }
}

fn normalize_filter(filter: Option<&str>) -> Option<String> {
    filter
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CalendarEvent, EventTime};
    use crate::registry::CalendarRegistry;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use date_resolver::TimeZoneMap;
    use std::collections::HashMap;

    enum Behaviour {
        Events(Vec<CalendarEvent>),
        Fail,
        Hang,
    }

    /// In-memory feed source keyed by city.
    struct FakeSource {
        feeds: HashMap<String, Behaviour>,
    }

    #[async_trait]
    impl EventSource for FakeSource {
        async fn fetch(
            &self,
            feed: &CalendarFeed,
            _range: &ResolvedRange,
        ) -> Result<Vec<CalendarEvent>, SearchError> {
            match self.feeds.get(&feed.city) {
                Some(Behaviour::Events(events)) => Ok(events.clone()),
                Some(Behaviour::Fail) | None => Err(SearchError::FeedStatus {
                    city: feed.city.clone(),
                    status: 500,
                }),
                Some(Behaviour::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn event(summary: &str, start: &str, location: &str) -> CalendarEvent {
        CalendarEvent {
            id: summary.to_lowercase(),
            summary: Some(summary.into()),
            location: Some(location.into()),
            start: EventTime {
                date_time: Some(start.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn directory() -> Arc<CityDirectory> {
        let calendars = CalendarRegistry::from_pairs([
            ("sydney", "syd"),
            ("melbourne", "mel"),
            ("perth", "per"),
        ])
        .unwrap();
        Arc::new(CityDirectory::new(TimeZoneMap::australia(), calendars).unwrap())
    }

    fn search(feeds: Vec<(&str, Behaviour)>) -> EventSearch<FakeSource> {
        let source = FakeSource {
            feeds: feeds
                .into_iter()
                .map(|(city, b)| (city.to_string(), b))
                .collect(),
        };
        EventSearch::new(directory(), source)
            .with_timeouts(Duration::from_millis(200), Duration::from_secs(2))
    }

    /// Tuesday 2025-06-10 18:00 AEST.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap()
    }

    fn summaries(results: &SearchResults) -> Vec<&str> {
        results.events.iter().map(|e| e.event.title()).collect()
    }

    #[tokio::test]
    async fn test_merges_and_sorts_by_start() {
        let s = search(vec![
            (
                "sydney",
                Behaviour::Events(vec![
                    event("Late Salsa", "2025-06-11T21:00:00+10:00", "Surry Hills"),
                    event("Early Bachata", "2025-06-11T18:00:00+10:00", "Newtown"),
                ]),
            ),
            (
                "melbourne",
                Behaviour::Events(vec![event(
                    "Melbourne Zouk",
                    "2025-06-11T19:00:00+10:00",
                    "Fitzroy",
                )]),
            ),
            ("perth", Behaviour::Events(vec![])),
        ]);

        let results = s.search(&EventQuery::new().when("wednesday"), now()).await.unwrap();
        assert!(results.resolved);
        assert!(results.is_complete());
        assert_eq!(
            summaries(&results),
            vec!["Early Bachata", "Melbourne Zouk", "Late Salsa"]
        );
        assert_eq!(results.events[1].city, "melbourne");
    }

    #[tokio::test]
    async fn test_city_selects_feed_and_timezone() {
        let s = search(vec![
            (
                "perth",
                Behaviour::Events(vec![event("Perth Social", "2025-06-13T19:00:00+08:00", "")]),
            ),
            ("sydney", Behaviour::Fail),
        ]);

        let results = s
            .search(&EventQuery::new().when("friday").city("Perth"), now())
            .await
            .unwrap();
        assert_eq!(results.feeds.len(), 1);
        assert_eq!(results.range.timezone(), chrono_tz::Australia::Perth);
        assert_eq!(results.range.time_min_param(), "2025-06-12T16:00:00.000Z");
        assert_eq!(summaries(&results), vec!["Perth Social"]);
    }

    #[tokio::test]
    async fn test_failed_feed_is_skipped() {
        let s = search(vec![
            ("sydney", Behaviour::Fail),
            (
                "melbourne",
                Behaviour::Events(vec![event("Zouk", "2025-06-10T19:00:00+10:00", "")]),
            ),
            ("perth", Behaviour::Events(vec![])),
        ]);

        let results = s.search(&EventQuery::new().when("tonight"), now()).await.unwrap();
        assert_eq!(summaries(&results), vec!["Zouk"]);
        assert!(!results.is_complete());
        assert!(matches!(
            results.feeds[0].status,
            FeedStatus::Failed { .. }
        ));
        assert_eq!(results.feeds[1].status, FeedStatus::Ok { events: 1 });
    }

    #[tokio::test]
    async fn test_slow_feed_times_out_without_blocking_others() {
        let s = search(vec![
            ("sydney", Behaviour::Hang),
            (
                "melbourne",
                Behaviour::Events(vec![event("Zouk", "2025-06-10T19:00:00+10:00", "")]),
            ),
            ("perth", Behaviour::Events(vec![])),
        ]);

        let results = s.search(&EventQuery::new(), now()).await.unwrap();
        assert_eq!(results.feeds[0].status, FeedStatus::TimedOut);
        assert_eq!(summaries(&results), vec!["Zouk"]);
    }

    #[tokio::test]
    async fn test_overall_deadline_returns_partial_results() {
        let s = search(vec![
            ("sydney", Behaviour::Hang),
            (
                "melbourne",
                Behaviour::Events(vec![event("Zouk", "2025-06-10T19:00:00+10:00", "")]),
            ),
            ("perth", Behaviour::Hang),
        ])
        .with_timeouts(Duration::from_secs(3600), Duration::from_millis(200));

        let results = s.search(&EventQuery::new(), now()).await.unwrap();
        assert_eq!(summaries(&results), vec!["Zouk"]);
        assert_eq!(results.feeds[0].status, FeedStatus::TimedOut);
        assert_eq!(results.feeds[2].status, FeedStatus::TimedOut);
    }

    #[tokio::test]
    async fn test_unresolved_expression_uses_fallback_window() {
        let s = search(vec![]);
        let results = s
            .search(&EventQuery::new().when("whenever"), now())
            .await
            .unwrap();
        assert!(!results.resolved);
        assert_eq!(results.range.time_min(), now());
        assert_eq!(results.range.duration(), chrono::Duration::days(1));
    }

    #[tokio::test]
    async fn test_keyword_and_location_filters() {
        let s = search(vec![(
            "sydney",
            Behaviour::Events(vec![
                event("Salsa Social", "2025-06-10T19:00:00+10:00", "Surry Hills"),
                event("Bachata Night", "2025-06-10T20:00:00+10:00", "Newtown"),
                event("Latin Mix", "2025-06-10T21:00:00+10:00", "Salsa Bar, Newtown"),
            ]),
        )]);

        let query = EventQuery::new().city("sydney").keyword("SALSA");
        let results = s.search(&query, now()).await.unwrap();
        assert_eq!(summaries(&results), vec!["Salsa Social", "Latin Mix"]);

        let query = EventQuery::new().city("sydney").location("newtown");
        let results = s.search(&query, now()).await.unwrap();
        assert_eq!(summaries(&results), vec!["Bachata Night", "Latin Mix"]);
    }

    #[tokio::test]
    async fn test_events_without_start_sort_last() {
        let mut undated = event("Mystery Class", "", "");
        undated.start = EventTime::default();
        let s = search(vec![(
            "sydney",
            Behaviour::Events(vec![
                undated,
                event("Salsa", "2025-06-10T19:00:00+10:00", ""),
            ]),
        )]);

        let results = s.search(&EventQuery::new().city("sydney"), now()).await.unwrap();
        assert_eq!(summaries(&results), vec!["Salsa", "Mystery Class"]);
    }

    #[tokio::test]
    async fn test_partial_city_resolves_in_feed_zone() {
        let calendars =
            CalendarRegistry::from_pairs([("sydney", "syd"), ("gold coast", "gc")]).unwrap();
        let directory =
            Arc::new(CityDirectory::new(TimeZoneMap::australia(), calendars).unwrap());
        let source = FakeSource {
            feeds: HashMap::from([("gold coast".to_string(), Behaviour::Events(vec![]))]),
        };
        let s = EventSearch::new(directory, source);

        // Sydney is on daylight time in January, Brisbane is not.
        let january = Utc.with_ymd_and_hms(2025, 1, 14, 2, 0, 0).unwrap();
        let results = s
            .search(&EventQuery::new().when("today").city("gold"), january)
            .await
            .unwrap();
        assert_eq!(results.feeds.len(), 1);
        assert_eq!(results.feeds[0].city, "gold coast");
        assert_eq!(results.range.timezone(), chrono_tz::Australia::Brisbane);
        assert_eq!(results.range.time_min_param(), "2025-01-13T14:00:00.000Z");
        assert_eq!(results.range.time_max_param(), "2025-01-14T13:59:59.999Z");
    }

    #[tokio::test]
    async fn test_unknown_city_returns_no_feeds() {
        let s = search(vec![]);
        let results = s
            .search(&EventQuery::new().city("auckland"), now())
            .await
            .unwrap();
        assert!(results.feeds.is_empty());
        assert!(results.events.is_empty());
        assert!(results.is_complete());
    }

    #[tokio::test]
    async fn test_inverted_explicit_range_is_an_error() {
        let s = search(vec![]);
        let query = EventQuery::new().range(now(), now() - chrono::Duration::hours(1));
        let err = s.search(&query, now()).await.unwrap_err();
        assert!(matches!(err, SearchError::Resolver(_)), "got: {err}");
    }
}
