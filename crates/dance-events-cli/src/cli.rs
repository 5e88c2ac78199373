//! CLI argument definitions for dance-events.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

/// Resolve casual day expressions and search dance event calendars.
#[derive(Debug, Parser)]
#[command(name = "dance-events")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON directory file with the city → calendar registry.
    #[arg(long, global = true, value_name = "FILE", env = "DANCE_EVENTS_CALENDARS")]
    pub calendars: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the UTC window a day expression covers.
    Resolve(ResolveArgs),

    /// Search calendar feeds for events.
    Search(SearchArgs),

    /// Answer a chat message such as "any salsa in sydney tonight?".
    Ask(AskArgs),
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Day expression: today, tonight, tomorrow, weekend, a weekday, or "3rd May 2025".
    pub expression: String,

    /// City used to pick the timezone.
    #[arg(long)]
    pub city: Option<String>,

    /// Print the default 24-hour window when the expression is not understood.
    #[arg(long)]
    pub fallback: bool,

    #[command(flatten)]
    pub clock: ClockArgs,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Day expression; defaults to the next 24 hours.
    #[arg(long)]
    pub when: Option<String>,

    /// Only search feeds for this city.
    #[arg(long)]
    pub city: Option<String>,

    /// Keep events whose title, description or location mention this text.
    #[arg(long)]
    pub keyword: Option<String>,

    /// Keep events whose location mentions this text.
    #[arg(long)]
    pub location: Option<String>,

    /// Print results as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub clock: ClockArgs,
}

#[derive(Debug, Args)]
pub struct AskArgs {
    /// The question, e.g. "what's on in melbourne friday?"
    pub message: String,

    /// Maximum number of events listed in the answer.
    #[arg(long, default_value_t = event_search::DEFAULT_REPLY_LIMIT)]
    pub limit: usize,

    #[command(flatten)]
    pub clock: ClockArgs,
}

#[derive(Debug, Args)]
pub struct ClockArgs {
    /// Pretend the current instant is this RFC 3339 timestamp.
    #[arg(long, value_name = "RFC3339", value_parser = parse_instant)]
    pub now: Option<DateTime<Utc>>,
}

impl ClockArgs {
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}
