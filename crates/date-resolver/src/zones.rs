//! City → IANA timezone lookup.
//!
//! A [`TimeZoneMap`] is an ordered list of lower-cased city keys. Lookup
//! lower-cases the caller's city name and returns the zone of the first
//! key that appears anywhere inside it, so `"Sydney CBD"` resolves through
//! the `"sydney"` key. Order matters: when one key is a substring of
//! another city's name, the earlier entry wins.
//!
//! Names that match nothing fall back to [`TimeZoneMap::default_zone`]
//! (Australia/Sydney unless reconfigured).

use chrono_tz::Tz;

use crate::error::ResolverError;

/// Zone used when no city is given or none of the keys match.
pub const DEFAULT_ZONE: Tz = chrono_tz::Australia::Sydney;

/// Ordered, immutable city-key → timezone table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeZoneMap {
    entries: Vec<(String, Tz)>,
    default_zone: Tz,
}

impl TimeZoneMap {
    /// The built-in table of Australian dance cities.
    pub fn australia() -> Self {
        use chrono_tz::Australia;

        let entries = vec![
            ("sydney", Australia::Sydney),
            ("melbourne", Australia::Melbourne),
            ("brisbane", Australia::Brisbane),
            ("gold coast", Australia::Brisbane),
            ("sunshine coast", Australia::Brisbane),
            ("perth", Australia::Perth),
            ("adelaide", Australia::Adelaide),
            ("canberra", Australia::Sydney),
            ("hobart", Australia::Hobart),
            ("darwin", Australia::Darwin),
            ("newcastle", Australia::Sydney),
            ("byron bay", Australia::Sydney),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|(key, tz)| (key.to_string(), tz))
                .collect(),
            default_zone: DEFAULT_ZONE,
        }
    }

    /// Build a map from `(city key, IANA name)` pairs, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::InvalidTimezone`] for an unknown IANA name and
    /// [`ResolverError::InvalidCityKey`] for a blank key.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ResolverError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries = Vec::new();
        for (key, zone) in pairs {
            let key = normalize_key(key.as_ref())?;
            let tz = parse_timezone(zone.as_ref())?;
            entries.push((key, tz));
        }
        Ok(Self {
            entries,
            default_zone: DEFAULT_ZONE,
        })
    }

    /// Replace the fallback zone.
    pub fn with_default_zone(mut self, tz: Tz) -> Self {
        self.default_zone = tz;
        self
    }

    /// The zone used when a city is absent or unmatched.
    pub fn default_zone(&self) -> Tz {
        self.default_zone
    }

    /// Zone for a free-text city name: first key contained in the
    /// lower-cased name, else the default zone.
    pub fn zone_for(&self, city: Option<&str>) -> Tz {
        city.and_then(|c| self.find_substring(&c.to_lowercase()))
            .unwrap_or(self.default_zone)
    }

    /// Like [`zone_for`](Self::zone_for) but an exact key match is preferred
    /// over an earlier substring match.
    pub fn zone_for_exact_first(&self, city: Option<&str>) -> Tz {
        let Some(city) = city else {
            return self.default_zone;
        };
        let needle = city.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| *key == needle)
            .map(|(_, tz)| *tz)
            .or_else(|| self.find_substring(&needle))
            .unwrap_or(self.default_zone)
    }

    /// First key that appears inside `text` (already lower-cased).
    pub fn match_key(&self, text: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| text.contains(key.as_str()))
            .map(|(key, _)| key.as_str())
    }

    /// Whether `key` is present verbatim (case-insensitive).
    pub fn contains_key(&self, key: &str) -> bool {
        let key = key.trim().to_lowercase();
        self.entries.iter().any(|(k, _)| *k == key)
    }

    /// Iterate over `(key, zone)` in lookup order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Tz)> {
        self.entries.iter().map(|(k, tz)| (k.as_str(), *tz))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find_substring(&self, lowered: &str) -> Option<Tz> {
        self.entries
            .iter()
            .find(|(key, _)| lowered.contains(key.as_str()))
            .map(|(_, tz)| *tz)
    }
}

impl Default for TimeZoneMap {
    fn default() -> Self {
        Self::australia()
    }
}

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(s: &str) -> Result<Tz, ResolverError> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| ResolverError::InvalidTimezone(format!("'{}'", s)))
}

fn normalize_key(key: &str) -> Result<String, ResolverError> {
    let key = key.trim().to_lowercase();
    if key.is_empty() {
        return Err(ResolverError::InvalidCityKey("empty key".to_string()));
    }
    Ok(key)
}
