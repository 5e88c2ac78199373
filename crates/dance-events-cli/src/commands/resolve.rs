//! `dance-events resolve`: print the window a day expression covers.

use anyhow::Result;
use date_resolver::ResolvedRange;
use tracing::{info, warn};

use crate::cli::{Cli, ResolveArgs};

pub fn execute(cli: &Cli, args: &ResolveArgs) -> Result<()> {
    let directory = super::load_directory(cli)?;
    let now = args.clock.now();
    let city = args.city.as_deref();

    let range = directory
        .resolver()
        .resolve(Some(&args.expression), city, now);

    let output = match range {
        Some(range) => Some(range),
        None if args.fallback => {
            info!(expression = %args.expression, "expression not understood, using fallback window");
            Some(ResolvedRange::fallback(now, directory.zones().zone_for(city)))
        }
        None => {
            warn!(expression = %args.expression, "not a recognized day expression");
            None
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
