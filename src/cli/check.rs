use clap::Parser;

/// Arguments for the check command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Check every bundle:\n    apexdeps check\n\n\
                  Check one bundle of another graph:\n    apexdeps -g path/to/graph check com.x.y")]
pub struct CheckArgs {
    /// Bundles to check (default: all)
    pub bundles: Vec<String>,
}
