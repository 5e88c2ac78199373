//! Event payloads as returned by calendar feeds.
//!
//! Field names follow the Calendar v3 events-list shape; anything the
//! search does not use is ignored on deserialization.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// `start` / `end` of an event: a timed instant or an all-day date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    /// The instant this time denotes. All-day dates start at local
    /// midnight of `zone`.
    pub fn instant(&self, zone: Tz) -> Option<DateTime<Utc>> {
        if let Some(dt) = &self.date_time {
            return DateTime::parse_from_rfc3339(dt)
                .ok()
                .map(|dt| dt.with_timezone(&Utc));
        }
        let date = NaiveDate::parse_from_str(self.date.as_deref()?, "%Y-%m-%d").ok()?;
        zone.from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn is_all_day(&self) -> bool {
        self.date_time.is_none() && self.date.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
}

impl CalendarEvent {
    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or("Untitled event")
    }

    /// Case-insensitive match of `needle` (already lower-cased) against
    /// summary, description and location.
    pub(crate) fn mentions(&self, needle: &str) -> bool {
        [&self.summary, &self.description, &self.location]
            .into_iter()
            .flatten()
            .any(|text| text.to_lowercase().contains(needle))
    }

    pub(crate) fn located_in(&self, needle: &str) -> bool {
        self.location
            .as_deref()
            .is_some_and(|loc| loc.to_lowercase().contains(needle))
    }
}

/// Body of an events-list response.
#[derive(Debug, Deserialize)]
pub(crate) struct EventsPage {
    #[serde(default)]
    pub items: Vec<CalendarEvent>,
}

/// An event together with the feed it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedEvent {
    pub city: String,
    #[serde(skip)]
    pub zone: Tz,
    /// Parsed start; `None` when the feed sent no usable start.
    #[serde(skip)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub event: CalendarEvent,
}

impl TaggedEvent {
    pub fn new(city: impl Into<String>, zone: Tz, event: CalendarEvent) -> Self {
        let starts_at = event.start.instant(zone);
        Self {
            city: city.into(),
            zone,
            starts_at,
            event,
        }
    }
}
