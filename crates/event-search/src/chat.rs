//! Chat-style front end: pull a query out of a free-text message and turn
//! search results back into a short plain-text answer.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::model::TaggedEvent;
use crate::registry::CityDirectory;
use crate::search::{EventQuery, SearchResults};

/// Events listed before the reply switches to "...and N more".
pub const DEFAULT_REPLY_LIMIT: usize = 5;

impl EventQuery {
    /// Build a query from a chat message.
    ///
    /// The first known city mentioned becomes the city filter and the whole
    /// message is handed to the day-expression resolver, which picks out
    /// weekday names, relative days and explicit dates on its own.
    pub fn from_message(message: &str, directory: &CityDirectory) -> Self {
        let mut query = EventQuery::new().when(message);
        if let Some(city) = directory.city_in_text(message) {
            query = query.city(city);
        }
        query
    }
}

/// Render results as a chat answer.
pub fn format_reply(results: &SearchResults, query: &EventQuery, limit: usize) -> String {
    let place = query
        .city
        .as_deref()
        .map(|c| format!(" in {}", title_case(c)))
        .unwrap_or_default();
    let window = describe_window(results);

    if results.events.is_empty() {
        let mut reply = format!("I couldn't find any events{place} {window}.");
        if !results.is_complete() {
            reply.push_str(" Some calendars didn't respond, so try again shortly.");
        }
        return reply;
    }

    let mut lines = vec![format!("Here's what's on{place} {window}:")];
    for tagged in results.events.iter().take(limit) {
        lines.push(format_event(tagged));
    }
    let hidden = results.events.len().saturating_sub(limit);
    if hidden > 0 {
        lines.push(format!("...and {hidden} more."));
    }
    if !results.is_complete() {
        lines.push("(Some calendars didn't respond, so this list may be incomplete.)".to_string());
    }
    lines.join("\n")
}

fn format_event(tagged: &TaggedEvent) -> String {
    let event = &tagged.event;
    let when = match tagged.starts_at {
        Some(start) if event.start.is_all_day() => {
            format!("all day {}", local(start, tagged.zone).format("%a %-d %b"))
        }
        Some(start) => local(start, tagged.zone)
            .format("%a %-d %b, %-I:%M %p")
            .to_string(),
        None => "time TBA".to_string(),
    };

    let mut line = format!("- {} ({}, {})", event.title(), when, title_case(&tagged.city));
    if let Some(loc) = event.location.as_deref().filter(|l| !l.trim().is_empty()) {
        line.push_str(&format!("\n  at {}", loc.trim()));
    }
    if let Some(link) = event.html_link.as_deref() {
        line.push_str(&format!("\n  {link}"));
    }
    line
}

fn describe_window(results: &SearchResults) -> String {
    if !results.resolved {
        return "in the next 24 hours".to_string();
    }
    let tz = results.range.timezone();
    let start = local(results.range.time_min(), tz);
    let end = local(results.range.time_max(), tz);
    if start.date_naive() == end.date_naive() {
        format!("on {}", start.format("%A %-d %B"))
    } else {
        format!(
            "from {} to {}",
            start.format("%a %-d %b"),
            end.format("%a %-d %b")
        )
    }
}

fn local(instant: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    instant.with_timezone(&tz)
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CalendarEvent, EventTime};
    use crate::registry::CalendarRegistry;
    use crate::search::{FeedReport, FeedStatus};
    use chrono::TimeZone;
    use chrono_tz::Australia;
    use date_resolver::{ResolvedRange, TimeZoneMap};

    fn directory() -> CityDirectory {
        let calendars =
            CalendarRegistry::from_pairs([("sydney", "syd"), ("gold coast", "gc")]).unwrap();
        CityDirectory::new(TimeZoneMap::australia(), calendars).unwrap()
    }

    fn wednesday() -> ResolvedRange {
        ResolvedRange::new(
            Utc.with_ymd_and_hms(2025, 6, 10, 14, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 11, 13, 59, 59).unwrap(),
            Australia::Sydney,
        )
        .unwrap()
    }

    fn salsa() -> TaggedEvent {
        TaggedEvent::new(
            "sydney",
            Australia::Sydney,
            CalendarEvent {
                id: "1".into(),
                summary: Some("Salsa Social".into()),
                location: Some("Surry Hills ".into()),
                html_link: Some("https://calendar.example/1".into()),
                start: EventTime {
                    date_time: Some("2025-06-11T19:30:00+10:00".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
    }

    fn results(events: Vec<TaggedEvent>, status: FeedStatus) -> SearchResults {
        SearchResults {
            range: wednesday(),
            resolved: true,
            events,
            feeds: vec![FeedReport {
                city: "sydney".into(),
                status,
            }],
        }
    }

    #[test]
    fn test_from_message_picks_city_and_keeps_text() {
        let query = EventQuery::from_message("Any kizomba on the Gold Coast friday?", &directory());
        assert_eq!(query.city.as_deref(), Some("gold coast"));
        assert_eq!(
            query.when.as_deref(),
            Some("Any kizomba on the Gold Coast friday?")
        );
    }

    #[test]
    fn test_from_message_without_city() {
        let query = EventQuery::from_message("what's on tonight", &directory());
        assert_eq!(query.city, None);
    }

    #[test]
    fn test_reply_lists_events() {
        let query = EventQuery::new().city("sydney");
        let reply = format_reply(
            &results(vec![salsa()], FeedStatus::Ok { events: 1 }),
            &query,
            DEFAULT_REPLY_LIMIT,
        );
        assert!(reply.starts_with("Here's what's on in Sydney on Wednesday 11 June:"), "got: {reply}");
        assert!(reply.contains("- Salsa Social (Wed 11 Jun, 7:30 PM, Sydney)"), "got: {reply}");
        assert!(reply.contains("  at Surry Hills\n"), "got: {reply}");
        assert!(reply.ends_with("https://calendar.example/1"), "got: {reply}");
    }

    #[test]
    fn test_reply_truncates_to_limit() {
        let events = vec![salsa(), salsa(), salsa()];
        let reply = format_reply(
            &results(events, FeedStatus::Ok { events: 3 }),
            &EventQuery::new(),
            1,
        );
        assert_eq!(reply.matches("Salsa Social").count(), 1);
        assert!(reply.contains("...and 2 more."), "got: {reply}");
    }

    #[test]
    fn test_reply_when_nothing_found() {
        let reply = format_reply(
            &results(vec![], FeedStatus::Ok { events: 0 }),
            &EventQuery::new().city("gold coast"),
            DEFAULT_REPLY_LIMIT,
        );
        assert_eq!(
            reply,
            "I couldn't find any events in Gold Coast on Wednesday 11 June."
        );
    }

    #[test]
    fn test_reply_mentions_partial_results() {
        let reply = format_reply(
            &results(vec![], FeedStatus::TimedOut),
            &EventQuery::new(),
            DEFAULT_REPLY_LIMIT,
        );
        assert!(reply.contains("didn't respond"), "got: {reply}");
    }

    #[test]
    fn test_reply_for_fallback_window() {
        let mut r = results(vec![], FeedStatus::Ok { events: 0 });
        r.resolved = false;
        let reply = format_reply(&r, &EventQuery::new(), DEFAULT_REPLY_LIMIT);
        assert_eq!(reply, "I couldn't find any events in the next 24 hours.");
    }
}
