//! Plan command implementation
//!
//! Runs the whole pipeline and prints, per bundle, the packaged files, the
//! native library interface and the packaging variants.

use std::collections::BTreeMap;
use std::path::Path;

use console::Style;
use serde::Serialize;

use super::helpers::{error_messages, exit_status, load_graph, print_failures};
use crate::apex::packaging::PackagingVariant;
use crate::apex::{BundlePlan, PipelineReport, TestForInfo, run as run_pipeline};
use crate::cli::PlanArgs;
use crate::error::Result;
use crate::progress::PhaseProgress;

#[derive(Serialize)]
struct JsonFailure<'a> {
    bundle: &'a str,
    errors: Vec<String>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    plans: Vec<&'a BundlePlan>,
    failed: Vec<JsonFailure<'a>>,
    test_for: BTreeMap<&'a str, &'a TestForInfo>,
    warnings: &'a [String],
}

/// Run plan command
pub fn run(graph: &Path, args: PlanArgs) -> Result<()> {
    let config = load_graph(graph)?;
    let progress = PhaseProgress::new(!args.json);
    let report = run_pipeline(&config, &args.bundles, &progress);
    progress.finish();
    let report = report?;

    if args.json {
        print_json(&report)?;
    } else {
        for warning in &report.prepared.warnings {
            eprintln!("{} {warning}", Style::new().yellow().apply_to("warning:"));
        }
        for plan in report.plans() {
            print_plan(plan);
            println!();
        }
        print_test_modules(&report);
        print_failures(&report);
    }

    exit_status(&report)
}

fn print_json(report: &PipelineReport) -> Result<()> {
    let json = JsonReport {
        plans: report.plans().collect(),
        failed: report
            .failures()
            .map(|(bundle, err)| JsonFailure {
                bundle,
                errors: error_messages(err),
            })
            .collect(),
        test_for: report.test_modules().collect(),
        warnings: &report.prepared.warnings,
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_plan(plan: &BundlePlan) {
    let bold = Style::new().bold();
    let dim = Style::new().dim();

    println!(
        "{} {}",
        Style::new().bold().yellow().apply_to(&plan.name),
        dim.apply_to(format!("({})", plan.variation))
    );
    println!("    {} {}", bold.apply_to("Digest:"), plan.digest);
    println!("    {}", bold.apply_to("Files:"));
    for file in &plan.files {
        let marker = if file.symlink_to_system {
            " -> system"
        } else if file.transitive {
            " (transitive)"
        } else {
            ""
        };
        println!("      {}{}", file.path(), dim.apply_to(marker));
        for link in file.symlink_paths() {
            println!("      {} {}", dim.apply_to("symlink"), link);
        }
    }
    print_list("Provides:", &plan.provide_native_libs);
    print_list("Requires:", &plan.require_native_libs);
    print_list("Install on platform:", &plan.make_modules_to_install);
    print_list("Trim:", &plan.libs_to_trim);

    println!(
        "    {} {}",
        bold.apply_to("Payload filesystem:"),
        plan.packaging.payload_fs_type.as_str()
    );
    println!("    {}", bold.apply_to("Packaging:"));
    for variant in &plan.packaging.variants {
        println!("      {}", describe_variant(&plan.name, variant));
    }
    println!(
        "    {} {} / {}",
        bold.apply_to("Signing:"),
        plan.key.private_key,
        plan.certificate.pem
    );
    for warning in &plan.warnings {
        println!("    {} {warning}", Style::new().yellow().apply_to("warning:"));
    }
}

fn print_test_modules(report: &PipelineReport) {
    let tests: Vec<(&str, &TestForInfo)> = report.test_modules().collect();
    if tests.is_empty() {
        return;
    }
    println!("{}", Style::new().bold().apply_to("Test modules:"));
    for (test, info) in tests {
        println!(
            "  {test} -> {} {}",
            info.bundles.join(", "),
            Style::new()
                .dim()
                .apply_to(format!("({} visible)", info.visible.len()))
        );
    }
    println!();
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("    {} {}", Style::new().bold().apply_to(title), items.join(", "));
}

fn describe_variant(bundle: &str, variant: &PackagingVariant) -> String {
    let mut line = format!(
        "{} {bundle}{} [{}]",
        variant.apex_type.as_str(),
        variant.suffix,
        variant.partition
    );
    if variant.primary {
        line.push_str(" primary");
    }
    if let Some(output) = &variant.output_file {
        line.push_str(&format!(" -> {output}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apex::packaging::ApexType;

    #[test]
    fn test_describe_variant() {
        let variant = PackagingVariant {
            apex_type: ApexType::Image,
            suffix: String::new(),
            primary: true,
            partition: "system".to_string(),
            compressed: false,
            output_file: Some("com.x.y.apex".to_string()),
            link_to_system_lib: true,
        };
        assert_eq!(
            describe_variant("com.x.y", &variant),
            "image com.x.y [system] primary -> com.x.y.apex"
        );
    }
}
