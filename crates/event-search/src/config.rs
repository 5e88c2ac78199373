//! Environment-driven settings for the feed client and search deadlines.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::GOOGLE_CALENDAR_BASE_URL;
use crate::error::SearchError;

pub const ENV_API_KEY: &str = "DANCE_EVENTS_API_KEY";
pub const ENV_FEED_URL: &str = "DANCE_EVENTS_FEED_URL";
pub const ENV_CALENDARS: &str = "DANCE_EVENTS_CALENDARS";
pub const ENV_FEED_TIMEOUT: &str = "DANCE_EVENTS_FEED_TIMEOUT_SECS";
pub const ENV_DEADLINE: &str = "DANCE_EVENTS_DEADLINE_SECS";

pub const DEFAULT_FEED_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(20);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    pub api_key: String,
    pub feed_base_url: String,
    /// JSON directory file; `None` means no calendars are registered.
    pub calendars_path: Option<PathBuf>,
    /// Per-feed request timeout.
    pub feed_timeout: Duration,
    /// Wall-clock cap on a whole search.
    pub overall_deadline: Duration,
}

impl SearchConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            feed_base_url: GOOGLE_CALENDAR_BASE_URL.to_string(),
            calendars_path: None,
            feed_timeout: DEFAULT_FEED_TIMEOUT,
            overall_deadline: DEFAULT_DEADLINE,
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, SearchError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] when the API key is missing or a
    /// duration variable is not a positive whole number of seconds.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SearchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SearchError::Config(format!("missing env var {ENV_API_KEY}")))?;

        let mut config = Self::new(api_key);
        if let Some(url) = lookup(ENV_FEED_URL) {
            config.feed_base_url = url;
        }
        config.calendars_path = lookup(ENV_CALENDARS).map(PathBuf::from);
        if let Some(raw) = lookup(ENV_FEED_TIMEOUT) {
            config.feed_timeout = parse_secs(ENV_FEED_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DEADLINE) {
            config.overall_deadline = parse_secs(ENV_DEADLINE, &raw)?;
        }
        Ok(config)
    }
}

fn parse_secs(name: &str, raw: &str) -> Result<Duration, SearchError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(SearchError::Config(format!(
            "{name} must be a positive number of seconds, got '{raw}'"
        ))),
    }
}
