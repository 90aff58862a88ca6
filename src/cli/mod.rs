//! CLI definitions using clap derive API
//!
//! Each subcommand keeps its argument type in its own submodule:
//! - plan: Plan command arguments
//! - check: Check command arguments
//! - contents: Contents command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod check;
pub mod completions;
pub mod contents;
pub mod plan;

pub use check::CheckArgs;
pub use completions::CompletionsArgs;
pub use contents::ContentsArgs;
pub use plan::PlanArgs;

/// apexdeps - APEX bundle dependency engine
///
/// Resolve what goes into each bundle of a declared module graph.
#[derive(Parser, Debug)]
#[command(
    name = "apexdeps",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Dependency-graph and packaging-decision engine for APEX bundles",
    long_about = "apexdeps reads a declared module graph (YAML module definitions), works out \
                  which modules every bundle contains, checks the bundle invariants and prints \
                  the resulting packaging plan.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  apexdeps plan                          \x1b[90m# Plan every bundle in the current directory\x1b[0m\n   \
                  apexdeps -g graph/ plan com.x.y --json \x1b[90m# Plan one bundle as JSON\x1b[0m\n   \
                  apexdeps check                         \x1b[90m# Only report which bundles pass\x1b[0m\n   \
                  apexdeps contents com.x.y              \x1b[90m# Show bundle membership\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Directory holding the module definition files
    #[arg(long, short = 'g', global = true, env = "APEXDEPS_GRAPH", default_value = ".")]
    pub graph: PathBuf,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan the contents and packaging of bundles
    Plan(PlanArgs),

    /// Run every check and report which bundles pass
    Check(CheckArgs),

    /// Show the membership table of one bundle
    Contents(ContentsArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
