//! Error types for event-search operations.
//!
//! Per-feed failures never escape [`EventSearch::search`](crate::EventSearch::search);
//! they are recorded in its [`FeedReport`](crate::FeedReport)s. Only
//! configuration problems and invalid query ranges propagate.

use date_resolver::ResolverError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("No timezone entry for calendar city '{0}'")]
    MissingTimezone(String),

    #[error("Duplicate calendar city '{0}'")]
    DuplicateCity(String),

    #[error(transparent)]
    Resolver(#[from] ResolverError),

    #[error("Invalid feed base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Request to feed '{city}' failed: {source}")]
    Http {
        city: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Feed '{city}' returned HTTP {status}")]
    FeedStatus { city: String, status: u16 },

    #[error("Feed '{city}' returned an unreadable body: {reason}")]
    Decode { city: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;
