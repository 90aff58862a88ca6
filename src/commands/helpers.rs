//! Command helper utilities

use std::path::Path;

use console::Style;
use tracing::debug;

use crate::apex::PipelineReport;
use crate::config::GraphConfig;
use crate::error::{ApexError, Result, bundles_failed};

/// Load the declared graph from the `--graph` directory
pub fn load_graph(dir: &Path) -> Result<GraphConfig> {
    let config = GraphConfig::load_dir(dir)?;
    debug!(modules = config.modules.len(), dir = %dir.display(), "graph loaded");
    Ok(config)
}

/// Individual problems behind an error, one message each
pub fn error_messages(err: &ApexError) -> Vec<String> {
    match err {
        ApexError::BundleFailed { errors, .. } if !errors.is_empty() => {
            errors.iter().map(ToString::to_string).collect()
        }
        other => vec![other.to_string()],
    }
}

/// Print the failed bundles of a report to stderr
pub fn print_failures(report: &PipelineReport) {
    for (name, err) in report.failures() {
        eprintln!("{} {}", Style::new().bold().red().apply_to("✗"), name);
        for message in error_messages(err) {
            for (i, line) in message.lines().enumerate() {
                let bullet = if i == 0 { "-" } else { " " };
                eprintln!("    {bullet} {line}");
            }
        }
    }
}

/// Turn a report with failed bundles into the run-level error
pub fn exit_status(report: &PipelineReport) -> Result<()> {
    if !report.has_failures() {
        return Ok(());
    }
    Err(bundles_failed(report.failures().count(), report.outcomes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{bundle_failed, config_invalid, static_executable};

    #[test]
    fn test_error_messages_flatten_bundle_failures() {
        let err = bundle_failed("com.x.y", vec![static_executable("com.x.y", "toolA")]);
        assert_eq!(
            error_messages(&err),
            vec!["com.x.y: executable toolA is static".to_string()]
        );
        assert_eq!(
            error_messages(&config_invalid("bad")),
            vec!["Invalid configuration: bad".to_string()]
        );
    }
}
