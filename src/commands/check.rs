//! Check command implementation

use std::path::Path;

use console::Style;

use super::helpers::{exit_status, load_graph, print_failures};
use crate::apex::run as run_pipeline;
use crate::cli::CheckArgs;
use crate::error::Result;
use crate::progress::PhaseProgress;

/// Run check command
pub fn run(graph: &Path, args: CheckArgs) -> Result<()> {
    let config = load_graph(graph)?;
    let progress = PhaseProgress::new(true);
    let report = run_pipeline(&config, &args.bundles, &progress);
    progress.finish();
    let report = report?;

    for plan in report.plans() {
        println!("{} {}", Style::new().bold().green().apply_to("✓"), plan.name);
    }
    print_failures(&report);

    let passed = report.plans().count();
    println!();
    println!("{passed} of {} bundle(s) passed", report.outcomes.len());

    exit_status(&report)
}
