//! Deterministic day-expression resolution.
//!
//! Turns a [`TemporalExpression`] plus an optional city into a
//! [`ResolvedRange`] of whole local calendar days (or, for `tonight`, the
//! evening remainder of today). All functions take the "now" anchor as an
//! argument and never read the system clock, keeping them pure and
//! testable.
//!
//! # Rules
//!
//! | expression | local window |
//! |---|---|
//! | weekday name | next occurrence, never today (today's weekday rolls 7 days) |
//! | `today` | 00:00:00.000 – 23:59:59.999 today |
//! | `tonight` | max(now, 17:00) – 23:59:59.999 today |
//! | `tomorrow` | 00:00:00.000 – 23:59:59.999 tomorrow |
//! | `weekend` | the single day `today + (7 - days_from_sunday)` |
//! | `D Month YYYY` | that whole day |
//!
//! The `weekend` rule is kept literally: it yields only the Sunday (not a
//! Saturday–Sunday span) and, on a Sunday, the following Sunday.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::expression::{RelativeDay, TemporalExpression};
use crate::range::ResolvedRange;
use crate::zones::TimeZoneMap;

/// Local hour at which "tonight" begins.
pub const EVENING_START_HOUR: u32 = 17;

/// Resolver bound to a timezone table.
///
/// The table is immutable configuration built once at start-up; the
/// resolver borrows it and holds no other state.
#[derive(Debug, Clone, Copy)]
pub struct DateResolver<'a> {
    zones: &'a TimeZoneMap,
}

impl<'a> DateResolver<'a> {
    pub fn new(zones: &'a TimeZoneMap) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &'a TimeZoneMap {
        self.zones
    }

    /// Resolve `expression` for `city` relative to `now`.
    ///
    /// Returns `None` when the expression is absent, matches no known
    /// pattern, or names an impossible calendar date. Callers should
    /// substitute [`ResolvedRange::fallback`].
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use date_resolver::{DateResolver, TimeZoneMap};
    ///
    /// let zones = TimeZoneMap::australia();
    /// let now = Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap(); // Tuesday
    /// let range = DateResolver::new(&zones)
    ///     .resolve(Some("wednesday"), Some("sydney"), now)
    ///     .unwrap();
    /// assert_eq!(range.time_min_param(), "2025-06-10T14:00:00.000Z");
    /// assert_eq!(range.time_max_param(), "2025-06-11T13:59:59.999Z");
    /// ```
    pub fn resolve(
        &self,
        expression: Option<&str>,
        city: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<ResolvedRange> {
        let expression = TemporalExpression::parse(expression?);
        let tz = self.zones.zone_for(city);
        resolve_expression(&expression, tz, now)
    }
}

/// Free-function form of [`DateResolver::resolve`].
pub fn resolve_with(
    zones: &TimeZoneMap,
    expression: Option<&str>,
    city: Option<&str>,
    now: DateTime<Utc>,
) -> Option<ResolvedRange> {
    DateResolver::new(zones).resolve(expression, city, now)
}

/// Resolve an already-classified expression in a known zone.
pub fn resolve_expression(
    expression: &TemporalExpression,
    tz: Tz,
    now: DateTime<Utc>,
) -> Option<ResolvedRange> {
    let local_now = now.with_timezone(&tz);
    let today = local_now.date_naive();

    match *expression {
        TemporalExpression::Weekday(target) => {
            let current = today.weekday().num_days_from_sunday() as i64;
            let wanted = target.num_days_from_sunday() as i64;
            let days_ahead = (wanted - current + 7) % 7;
            let days_ahead = if days_ahead == 0 { 7 } else { days_ahead };
            whole_day(today.checked_add_signed(Duration::days(days_ahead))?, tz)
        }
        TemporalExpression::RelativeDay(RelativeDay::Today) => whole_day(today, tz),
        TemporalExpression::RelativeDay(RelativeDay::Tonight) => {
            let evening = local_instant(
                today.and_time(NaiveTime::from_hms_opt(EVENING_START_HOUR, 0, 0)?),
                &tz,
            )?;
            let start = evening.max(now);
            let end = local_instant(end_of_day(today)?, &tz)?;
            ResolvedRange::new(start, end, tz).ok()
        }
        TemporalExpression::RelativeDay(RelativeDay::Tomorrow) => whole_day(today.succ_opt()?, tz),
        TemporalExpression::RelativeDay(RelativeDay::Weekend) => {
            let days_ahead = 7 - today.weekday().num_days_from_sunday() as i64;
            whole_day(today.checked_add_signed(Duration::days(days_ahead))?, tz)
        }
        TemporalExpression::ExplicitDate { day, month, year } => {
            whole_day(NaiveDate::from_ymd_opt(year, month, day)?, tz)
        }
        TemporalExpression::Unresolved => None,
    }
}

// ── Internal helpers ────────────────────────────────────────────────────────

/// 00:00:00.000 – 23:59:59.999 of `date` in `tz`.
fn whole_day(date: NaiveDate, tz: Tz) -> Option<ResolvedRange> {
    let start = local_instant(date.and_hms_opt(0, 0, 0)?, &tz)?;
    let end = local_instant(end_of_day(date)?, &tz)?;
    ResolvedRange::new(start, end, tz).ok()
}

fn end_of_day(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_milli_opt(23, 59, 59, 999)
}

/// Map a local wall-clock time to an instant.
///
/// Ambiguous times (clocks going back) take the earlier instant. Times
/// skipped by a forward transition move to the first valid local time
/// after the gap.
fn local_instant(naive: NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return Some(dt.with_timezone(&Utc));
    }
    // Gaps are at most a few hours; probe forward in 15-minute steps.
    (1..=16)
        .filter_map(|step| naive.checked_add_signed(Duration::minutes(15 * step)))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

// ── Tests ───────────────────────────────────────────────────────────────────
