//! Version command implementation

use crate::apex::PHASES;
use crate::error::Result;

/// Run version command
pub fn run() -> Result<()> {
    print!("{}", version_report());
    Ok(())
}

fn version_report() -> String {
    let profile = if cfg!(debug_assertions) { "debug" } else { "release" };
    format!(
        "apexdeps {}\n\nGraph phases:\n  {}\n\nBuild info:\n  Minimum Rust version: {}\n  Profile: {profile}\n",
        env!("CARGO_PKG_VERSION"),
        PHASES.join(" -> "),
        env!("CARGO_PKG_RUST_VERSION"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_report_lists_phases_in_order() {
        let report = version_report();
        assert!(report.starts_with(&format!("apexdeps {}", env!("CARGO_PKG_VERSION"))));
        assert!(report.contains(
            "register -> declare -> membership -> test_for -> platform -> variants -> reresolve"
        ));
        assert!(report.contains("Minimum Rust version: 1.85"));
    }
}
