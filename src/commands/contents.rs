//! Contents command implementation

use std::path::Path;

use console::Style;

use super::helpers::load_graph;
use crate::apex::membership::Membership;
use crate::apex::{NoopObserver, check_selection, prepare};
use crate::cli::ContentsArgs;
use crate::error::{Result, bundle_failed};

/// Run contents command
pub fn run(graph: &Path, args: ContentsArgs) -> Result<()> {
    let config = load_graph(graph)?;
    let mut prepared = prepare(&config, &NoopObserver)?;
    check_selection(&prepared, std::slice::from_ref(&args.bundle))?;

    if let Some(errors) = prepared.failures.remove(&args.bundle) {
        return Err(bundle_failed(&args.bundle, errors));
    }
    let Some(contents) = prepared.tables.contents.get(&args.bundle) else {
        return Err(bundle_failed(&args.bundle, Vec::new()));
    };

    let wanted = |membership: Membership| match membership {
        Membership::Direct => !args.transitive_only,
        Membership::Transitive => !args.direct_only,
    };
    let members: Vec<(&str, Membership)> = contents.iter().filter(|(_, m)| wanted(*m)).collect();

    println!(
        "{} ({}):",
        Style::new().bold().yellow().apply_to(&args.bundle),
        members.len()
    );
    for (name, membership) in members {
        let label = match membership {
            Membership::Direct => "direct",
            Membership::Transitive => "transitive",
        };
        println!("  {name:<40} {}", Style::new().dim().apply_to(label));
    }
    if contents.is_empty() {
        println!("  {}", Style::new().dim().apply_to("(no members)"));
    }

    if let Some(info) = prepared.tables.infos.get(&args.bundle) {
        println!();
        println!(
            "{} {}  {} {}",
            Style::new().bold().apply_to("min_sdk_version:"),
            info.min_sdk,
            Style::new().bold().apply_to("updatable:"),
            info.updatable
        );
    }
    Ok(())
}
