//! dance-events: resolve day expressions and search per-city dance calendars.
//!
//! Entry point. Parses arguments, installs logging and dispatches to the
//! command handlers.

#![forbid(unsafe_code)]

mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Resolve(args) => commands::resolve::execute(&cli, args)?,
        Commands::Search(args) => commands::search::execute(&cli, args)?,
        Commands::Ask(args) => commands::ask::execute(&cli, args)?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Log to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
