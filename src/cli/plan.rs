use clap::Parser;

/// Arguments for the plan command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Plan every bundle:\n    apexdeps plan\n\n\
                  Plan selected bundles:\n    apexdeps plan com.x.y com.x.z\n\n\
                  Print machine-readable plans:\n    apexdeps plan --json")]
pub struct PlanArgs {
    /// Bundles to plan (default: all)
    pub bundles: Vec<String>,

    /// Print plans as JSON
    #[arg(long)]
    pub json: bool,
}
