//! Classification of free-text day expressions.
//!
//! Matching is case-insensitive and substring based, so a whole chat
//! message ("any salsa on friday?") can be passed in as-is. Checks run in
//! a fixed priority order: weekday names, then the relative-day keywords
//! (`tonight`, `today`, `tomorrow`, `weekend`), then an explicit
//! `D[st|nd|rd|th] Month YYYY` date.

use std::fmt;
use std::sync::LazyLock;

use chrono::Weekday;
use regex::Regex;
use serde::Serialize;

static EXPLICIT_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{1,2})(?:st|nd|rd|th)?\s+(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\s+(\d{4})\b",
    )
    .expect("explicit date pattern is valid")
});

/// Weekday names in lookup order (Sunday-first, as day-of-week 0..6).
const WEEKDAYS: [(&str, Weekday); 7] = [
    ("sunday", Weekday::Sun),
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
];

/// Keywords resolved relative to the current instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelativeDay {
    Today,
    Tonight,
    Tomorrow,
    Weekend,
}

impl RelativeDay {
    /// Lookup order for keyword matching.
    pub const ALL: [RelativeDay; 4] = [
        RelativeDay::Tonight,
        RelativeDay::Today,
        RelativeDay::Tomorrow,
        RelativeDay::Weekend,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelativeDay::Today => "today",
            RelativeDay::Tonight => "tonight",
            RelativeDay::Tomorrow => "tomorrow",
            RelativeDay::Weekend => "weekend",
        }
    }
}

impl fmt::Display for RelativeDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognized temporal expression.
///
/// `ExplicitDate` carries the raw components; whether they form a real
/// calendar date is only checked at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalExpression {
    Weekday(Weekday),
    RelativeDay(RelativeDay),
    ExplicitDate { day: u32, month: u32, year: i32 },
    Unresolved,
}

impl TemporalExpression {
    /// Classify `text` by the first pattern it matches.
    pub fn parse(text: &str) -> Self {
        let lowered = text.to_lowercase();

        if let Some(weekday) = match_weekday(&lowered) {
            return TemporalExpression::Weekday(weekday);
        }

        if let Some(kind) = RelativeDay::ALL
            .into_iter()
            .find(|kind| lowered.contains(kind.as_str()))
        {
            return TemporalExpression::RelativeDay(kind);
        }

        match_explicit_date(&lowered).unwrap_or(TemporalExpression::Unresolved)
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, TemporalExpression::Unresolved)
    }
}

fn match_weekday(s: &str) -> Option<Weekday> {
    WEEKDAYS
        .iter()
        .find(|(name, _)| s.contains(name))
        .map(|(_, weekday)| *weekday)
}

fn match_explicit_date(s: &str) -> Option<TemporalExpression> {
    let caps = EXPLICIT_DATE.captures(s)?;
    let day = caps.get(1)?.as_str().parse().ok()?;
    let month = parse_month(caps.get(2)?.as_str())?;
    let year = caps.get(3)?.as_str().parse().ok()?;
    Some(TemporalExpression::ExplicitDate { day, month, year })
}

/// Parse a month name to number (1-12).
fn parse_month(s: &str) -> Option<u32> {
    match s {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" | "sept" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}
