//! Half-open instant ranges handed to calendar feeds.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::error::ResolverError;

/// A `[time_min, time_max)` window in UTC, anchored to local days of `timezone`.
///
/// Invariant: `time_min < time_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedRange {
    #[serde(rename = "timeMin", serialize_with = "serialize_millis")]
    time_min: DateTime<Utc>,
    #[serde(rename = "timeMax", serialize_with = "serialize_millis")]
    time_max: DateTime<Utc>,
    #[serde(rename = "timeZone", serialize_with = "serialize_tz")]
    timezone: Tz,
}

impl ResolvedRange {
    /// Build a range, rejecting empty or inverted windows.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::InvalidRange`] unless `time_min < time_max`.
    pub fn new(
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        timezone: Tz,
    ) -> Result<Self, ResolverError> {
        if time_min >= time_max {
            return Err(ResolverError::InvalidRange(format!(
                "timeMin {} is not before timeMax {}",
                format_instant(&time_min),
                format_instant(&time_max)
            )));
        }
        Ok(Self {
            time_min,
            time_max,
            timezone,
        })
    }

    /// The default window used when an expression cannot be resolved:
    /// 24 hours starting at `now`.
    pub fn fallback(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            time_min: now,
            time_max: now + Duration::days(1),
            timezone,
        }
    }

    pub fn time_min(&self) -> DateTime<Utc> {
        self.time_min
    }

    pub fn time_max(&self) -> DateTime<Utc> {
        self.time_max
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// `timeMin` as a query-string value (`2025-06-10T14:00:00.000Z`).
    pub fn time_min_param(&self) -> String {
        format_instant(&self.time_min)
    }

    /// `timeMax` as a query-string value.
    pub fn time_max_param(&self) -> String {
        format_instant(&self.time_max)
    }

    /// Whether `instant` falls inside the half-open window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.time_min <= instant && instant < self.time_max
    }

    pub fn duration(&self) -> Duration {
        self.time_max - self.time_min
    }
}

/// Format an instant as RFC 3339 UTC with millisecond precision.
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_millis<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_instant(dt))
}

fn serialize_tz<S: Serializer>(tz: &Tz, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(tz.name())
}
