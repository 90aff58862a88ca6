//! apexdeps - APEX bundle dependency engine
//!
//! Reads a declared module graph, decides which modules each bundle contains,
//! checks the bundle invariants and produces the packaging plan of every bundle.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod apex;
mod cli;
mod commands;
mod config;
mod domain;
mod error;
mod graph;
mod hash;
mod progress;
#[cfg(test)]
mod test_fixtures;

use cli::{Cli, Commands};

/// Log filter variable; `-v` raises the default level to debug
const LOG_ENV: &str = "APEXDEPS_LOG";

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Plan(args) => commands::plan::run(&cli.graph, args),
        Commands::Check(args) => commands::check::run(&cli.graph, args),
        Commands::Contents(args) => commands::contents::run(&cli.graph, args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
