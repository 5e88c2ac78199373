//! Command handlers and the setup they share.

pub mod ask;
pub mod resolve;
pub mod search;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use date_resolver::TimeZoneMap;
use event_search::{
    CalendarRegistry, CityDirectory, EventSearch, GoogleCalendarClient, SearchConfig,
};

use crate::cli::Cli;

/// Directory from `--calendars`, or the built-in timezones with no feeds.
pub fn load_directory(cli: &Cli) -> Result<CityDirectory> {
    match &cli.calendars {
        Some(path) => CityDirectory::from_path(path)
            .with_context(|| format!("loading calendars from '{}'", path.display())),
        None => Ok(CityDirectory::new(
            TimeZoneMap::australia(),
            CalendarRegistry::default(),
        )?),
    }
}

/// Everything a feed search needs: directory, HTTP client and timeouts.
pub fn build_search(cli: &Cli) -> Result<EventSearch<GoogleCalendarClient>> {
    let config = SearchConfig::from_env().context("reading search configuration")?;
    let calendars = cli.calendars.as_ref().or(config.calendars_path.as_ref());
    let Some(path) = calendars else {
        bail!("no calendars configured: pass --calendars <FILE> or set DANCE_EVENTS_CALENDARS");
    };
    let directory = CityDirectory::from_path(path)
        .with_context(|| format!("loading calendars from '{}'", path.display()))?;

    let client =
        GoogleCalendarClient::new(&config.feed_base_url, &config.api_key, config.feed_timeout)?;
    Ok(EventSearch::new(Arc::new(directory), client).with_config(&config))
}

/// Current-thread runtime for a single search.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")
}
