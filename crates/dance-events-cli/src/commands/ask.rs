//! `dance-events ask`: answer a chat message.

use anyhow::Result;
use event_search::{format_reply, EventQuery};

use crate::cli::{AskArgs, Cli};

pub fn execute(cli: &Cli, args: &AskArgs) -> Result<()> {
    let search = super::build_search(cli)?;
    let query = EventQuery::from_message(&args.message, search.directory());
    tracing::debug!(city = ?query.city, "parsed chat message");

    let results = super::runtime()?.block_on(search.search(&query, args.clock.now()))?;
    println!("{}", format_reply(&results, &query, args.limit));
    Ok(())
}
