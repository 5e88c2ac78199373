//! City → calendar feed registry and the directory that pairs it with timezones.
//!
//! The directory is built once at start-up and shared read-only; every
//! registered city must have a timezone entry so that feed results can be
//! interpreted in local time.

use std::path::Path;

use chrono_tz::Tz;
use date_resolver::{parse_timezone, DateResolver, TimeZoneMap};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::SearchError;

/// One externally hosted calendar, tagged with the city it lists events for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarFeed {
    pub city: String,
    pub calendar_id: String,
}

/// Ordered list of calendar feeds keyed by lower-cased city.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarRegistry {
    feeds: Vec<CalendarFeed>,
}

impl CalendarRegistry {
    /// Build from `(city, calendar id)` pairs, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for a blank city or calendar id and
    /// [`SearchError::DuplicateCity`] when a city appears twice.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut registry = Self::default();
        for (city, calendar_id) in pairs {
            registry.push(city.as_ref(), calendar_id.as_ref())?;
        }
        Ok(registry)
    }

    fn push(&mut self, city: &str, calendar_id: &str) -> Result<(), SearchError> {
        let city = city.trim().to_lowercase();
        let calendar_id = calendar_id.trim();
        if city.is_empty() {
            return Err(SearchError::Config("calendar city must not be empty".into()));
        }
        if calendar_id.is_empty() {
            return Err(SearchError::Config(format!(
                "calendar id for '{city}' must not be empty"
            )));
        }
        if self.feeds.iter().any(|f| f.city == city) {
            return Err(SearchError::DuplicateCity(city));
        }
        self.feeds.push(CalendarFeed {
            city,
            calendar_id: calendar_id.to_string(),
        });
        Ok(())
    }

    /// Feeds for a free-text city filter.
    ///
    /// `None` selects every feed. Otherwise a feed is selected when its key
    /// appears in the lower-cased filter or the filter appears in its key,
    /// so both "Gold Coast QLD" and "gold" pick the "gold coast" feed.
    pub fn feeds_for(&self, city: Option<&str>) -> Vec<&CalendarFeed> {
        match city.map(|c| c.trim().to_lowercase()) {
            None => self.feeds.iter().collect(),
            Some(filter) if filter.is_empty() => self.feeds.iter().collect(),
            Some(filter) => self
                .feeds
                .iter()
                .filter(|f| filter.contains(f.city.as_str()) || f.city.contains(filter.as_str()))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalendarFeed> {
        self.feeds.iter()
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

/// On-disk directory description.
///
/// ```json
/// {
///   "calendars": { "sydney": "abc@group.calendar.google.com" },
///   "timezones": { "wollongong": "Australia/Sydney" },
///   "defaultTimezone": "Australia/Sydney"
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct DirectoryFile {
    calendars: Map<String, Value>,
    #[serde(default)]
    timezones: Map<String, Value>,
    default_timezone: Option<String>,
}

/// Immutable pairing of the timezone table and the calendar registry.
#[derive(Debug, Clone)]
pub struct CityDirectory {
    zones: TimeZoneMap,
    calendars: CalendarRegistry,
}

impl CityDirectory {
    /// Pair a timezone table with a registry.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::MissingTimezone`] if a registered city has no
    /// timezone entry.
    pub fn new(zones: TimeZoneMap, calendars: CalendarRegistry) -> Result<Self, SearchError> {
        if let Some(feed) = calendars.iter().find(|f| !zones.contains_key(&f.city)) {
            return Err(SearchError::MissingTimezone(feed.city.clone()));
        }
        Ok(Self { zones, calendars })
    }

    /// Parse a JSON directory description.
    ///
    /// Extra `timezones` are appended after the built-in Australian table, so
    /// built-in keys keep their lookup priority.
    pub fn from_json_str(json: &str) -> Result<Self, SearchError> {
        let file: DirectoryFile = serde_json::from_str(json)
            .map_err(|e| SearchError::Config(format!("invalid directory file: {e}")))?;

        let calendars = CalendarRegistry::from_pairs(
            file.calendars
                .iter()
                .map(|(city, id)| Ok((city.as_str(), expect_string(city, id)?)))
                .collect::<Result<Vec<_>, SearchError>>()?,
        )?;

        let extra = file
            .timezones
            .iter()
            .map(|(city, tz)| Ok((city.clone(), expect_string(city, tz)?.to_string())))
            .collect::<Result<Vec<_>, SearchError>>()?;
        let builtin = TimeZoneMap::australia();
        let mut zones = TimeZoneMap::from_pairs(
            builtin
                .iter()
                .map(|(city, tz)| (city.to_string(), tz.name().to_string()))
                .chain(extra),
        )?;
        if let Some(default) = file.default_timezone {
            zones = zones.with_default_zone(parse_timezone(&default)?);
        }

        Self::new(zones, calendars)
    }

    /// Read and parse a JSON directory file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SearchError::Config(format!("cannot read '{}': {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn zones(&self) -> &TimeZoneMap {
        &self.zones
    }

    pub fn calendars(&self) -> &CalendarRegistry {
        &self.calendars
    }

    pub fn resolver(&self) -> DateResolver<'_> {
        DateResolver::new(&self.zones)
    }

    pub fn feeds_for(&self, city: Option<&str>) -> Vec<&CalendarFeed> {
        self.calendars.feeds_for(city)
    }

    pub fn zone_for_feed(&self, feed: &CalendarFeed) -> Tz {
        self.zones.zone_for(Some(&feed.city))
    }

    /// Zone a city filter should be resolved in.
    ///
    /// A filter that names a timezone key uses it. Otherwise, when the feeds
    /// the filter selects all share one zone (`"gold"` selecting
    /// `"gold coast"`), that zone is used, so the window matches the feeds
    /// being queried. Anything else gets the default zone.
    pub fn zone_for_city(&self, city: Option<&str>) -> Tz {
        let Some(filter) = city.map(|c| c.trim().to_lowercase()) else {
            return self.zones.default_zone();
        };
        if filter.is_empty() || self.zones.match_key(&filter).is_some() {
            return self.zones.zone_for(Some(&filter));
        }
        let mut feed_zones = self
            .feeds_for(Some(&filter))
            .into_iter()
            .map(|feed| self.zone_for_feed(feed));
        match feed_zones.next() {
            Some(first) if feed_zones.all(|tz| tz == first) => first,
            _ => self.zones.default_zone(),
        }
    }

    /// First known city mentioned in `text`: registry cities first, then any
    /// timezone key.
    pub fn city_in_text(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.calendars
            .iter()
            .find(|f| lowered.contains(f.city.as_str()))
            .map(|f| f.city.as_str())
            .or_else(|| self.zones.match_key(&lowered))
    }
}

fn expect_string<'a>(key: &str, value: &'a Value) -> Result<&'a str, SearchError> {
    value
        .as_str()
        .ok_or_else(|| SearchError::Config(format!("value for '{key}' must be a string")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CalendarRegistry {
        CalendarRegistry::from_pairs([
            ("sydney", "syd@group.calendar.google.com"),
            ("melbourne", "mel@group.calendar.google.com"),
            ("gold coast", "gc@group.calendar.google.com"),
        ])
        .unwrap()
    }

    #[test]
    fn test_feeds_for_none_selects_all() {
        assert_eq!(registry().feeds_for(None).len(), 3);
        assert_eq!(registry().feeds_for(Some("  ")).len(), 3);
    }

    #[test]
    fn test_feeds_for_matches_both_directions() {
        let reg = registry();
        let cities = |filter| {
            reg.feeds_for(Some(filter))
                .into_iter()
                .map(|f| f.city.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(cities("Sydney CBD"), vec!["sydney"]);
        assert_eq!(cities("gold"), vec!["gold coast"]);
        assert!(cities("perth").is_empty());
    }

    #[test]
    fn test_from_pairs_rejects_duplicates() {
        let err = CalendarRegistry::from_pairs([("sydney", "a"), ("Sydney", "b")]).unwrap_err();
        assert!(matches!(err, SearchError::DuplicateCity(c) if c == "sydney"));
    }

    #[test]
    fn test_from_pairs_rejects_blank_id() {
        assert!(CalendarRegistry::from_pairs([("sydney", " ")]).is_err());
    }

    #[test]
    fn test_directory_requires_timezone_for_every_city() {
        let reg = CalendarRegistry::from_pairs([("auckland", "akl")]).unwrap();
        let err = CityDirectory::new(TimeZoneMap::australia(), reg).unwrap_err();
        assert!(matches!(err, SearchError::MissingTimezone(c) if c == "auckland"));
    }

    #[test]
    fn test_directory_from_json_preserves_order_and_extra_zones() {
        let dir = CityDirectory::from_json_str(
            r#"{
                "calendars": { "wollongong": "wgg", "perth": "per" },
                "timezones": { "wollongong": "Australia/Sydney" }
            }"#,
        )
        .unwrap();
        let cities: Vec<_> = dir.calendars().iter().map(|f| f.city.as_str()).collect();
        assert_eq!(cities, vec!["wollongong", "perth"]);
        let perth = dir.feeds_for(Some("perth"))[0];
        assert_eq!(dir.zone_for_feed(perth), chrono_tz::Australia::Perth);
    }

    #[test]
    fn test_directory_from_json_default_timezone() {
        let dir = CityDirectory::from_json_str(
            r#"{ "calendars": {}, "defaultTimezone": "Pacific/Auckland" }"#,
        )
        .unwrap();
        assert_eq!(dir.zones().default_zone(), chrono_tz::Pacific::Auckland);
    }

    #[test]
    fn test_directory_from_json_rejects_non_string_id() {
        let err = CityDirectory::from_json_str(r#"{ "calendars": { "sydney": 5 } }"#).unwrap_err();
        assert!(err.to_string().contains("must be a string"), "got: {err}");
    }

    #[test]
    fn test_directory_from_json_rejects_missing_zone() {
        let err =
            CityDirectory::from_json_str(r#"{ "calendars": { "auckland": "akl" } }"#).unwrap_err();
        assert!(matches!(err, SearchError::MissingTimezone(_)));
    }

    #[test]
    fn test_zone_for_city_follows_partial_feed_match() {
        let dir = CityDirectory::new(TimeZoneMap::australia(), registry()).unwrap();
        assert_eq!(dir.zone_for_city(Some("gold")), chrono_tz::Australia::Brisbane);
        assert_eq!(dir.zone_for_city(Some("Melbourne CBD")), chrono_tz::Australia::Melbourne);
        assert_eq!(dir.zone_for_city(Some("auckland")), chrono_tz::Australia::Sydney);
        assert_eq!(dir.zone_for_city(None), chrono_tz::Australia::Sydney);
    }

    #[test]
    fn test_zone_for_city_with_mixed_zones_uses_default() {
        let reg = CalendarRegistry::from_pairs([("perth", "p"), ("perth hills", "ph")]).unwrap();
        let zones = TimeZoneMap::from_pairs([
            ("perth", "Australia/Perth"),
            ("perth hills", "Australia/Darwin"),
        ])
        .unwrap();
        let dir = CityDirectory::new(zones, reg).unwrap();
        assert_eq!(dir.zone_for_city(Some("pert")), chrono_tz::Australia::Sydney);
    }

    #[test]
    fn test_city_in_text() {
        let dir = CityDirectory::new(TimeZoneMap::australia(), registry()).unwrap();
        assert_eq!(dir.city_in_text("Any salsa in Melbourne tonight?"), Some("melbourne"));
        assert_eq!(dir.city_in_text("dancing in hobart"), Some("hobart"));
        assert_eq!(dir.city_in_text("what's on friday"), None);
    }
}
