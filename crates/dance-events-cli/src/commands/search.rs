//! `dance-events search`: query the registered feeds and list events.

use anyhow::Result;
use event_search::{EventQuery, FeedStatus, SearchResults};

use crate::cli::{Cli, SearchArgs};

pub fn execute(cli: &Cli, args: &SearchArgs) -> Result<()> {
    let search = super::build_search(cli)?;

    let mut query = EventQuery::new();
    query.when = args.when.clone();
    query.city = args.city.clone();
    query.keyword = args.keyword.clone();
    query.location = args.location.clone();

    let results = super::runtime()?.block_on(search.search(&query, args.clock.now()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_listing(&results);
    }
    Ok(())
}

fn print_listing(results: &SearchResults) {
    println!(
        "{} -> {} ({})",
        results.range.time_min_param(),
        results.range.time_max_param(),
        results.range.timezone().name()
    );
    for tagged in &results.events {
        let start = tagged
            .starts_at
            .map(|dt| dt.with_timezone(&tagged.zone).format("%a %d %b %H:%M").to_string())
            .unwrap_or_else(|| "--".to_string());
        let location = tagged.event.location.as_deref().unwrap_or("");
        println!(
            "{start}  {:<12} {}  {location}",
            tagged.city,
            tagged.event.title()
        );
    }
    for report in &results.feeds {
        match &report.status {
            FeedStatus::Ok { .. } => {}
            FeedStatus::Failed { reason } => eprintln!("warning: {} skipped: {reason}", report.city),
            FeedStatus::TimedOut => eprintln!("warning: {} timed out", report.city),
        }
    }
}
