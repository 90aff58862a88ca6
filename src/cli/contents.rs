use clap::Parser;

/// Arguments for the contents command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show every member of a bundle:\n    apexdeps contents com.x.y\n\n\
                  Show only directly listed members:\n    apexdeps contents com.x.y --direct-only")]
pub struct ContentsArgs {
    /// Bundle to show
    pub bundle: String,

    /// Show only members reached through other modules
    #[arg(long, conflicts_with = "direct_only")]
    pub transitive_only: bool,

    /// Show only members listed by the bundle itself
    #[arg(long)]
    pub direct_only: bool,
}
