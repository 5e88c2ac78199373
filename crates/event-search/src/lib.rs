//! # event-search
//!
//! Find dance events across per-city calendar feeds.
//!
//! A [`CityDirectory`] pairs the city → timezone table with the city →
//! calendar registry. [`EventSearch`] resolves a day expression with
//! [`date_resolver`], queries the matching feeds concurrently through an
//! [`EventSource`], and merges the answers into one start-ordered list.
//!
//! ## Modules
//!
//! - [`registry`] — calendar registry and city directory
//! - [`client`] — the feed seam and its Calendar v3 implementation
//! - [`model`] — event payloads
//! - [`search`] — fan-out, filtering and ordering
//! - [`chat`] — message → query, results → reply text
//! - [`config`] — environment settings
//! - [`error`] — Error types

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod registry;
pub mod search;

pub use chat::{format_reply, DEFAULT_REPLY_LIMIT};
pub use client::{EventSource, GoogleCalendarClient, GOOGLE_CALENDAR_BASE_URL};
pub use config::SearchConfig;
pub use error::SearchError;
pub use model::{CalendarEvent, EventTime, TaggedEvent};
pub use registry::{CalendarFeed, CalendarRegistry, CityDirectory};
pub use search::{EventQuery, EventSearch, FeedReport, FeedStatus, SearchResults};
