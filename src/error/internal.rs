//! Internal consistency errors

use super::ApexError;

/// Creates an install path collision error
pub fn duplicate_apex_file(
    bundle: impl Into<String>,
    dest: impl Into<String>,
    first: impl Into<String>,
    second: impl Into<String>,
) -> ApexError {
    ApexError::DuplicateApexFile {
        bundle: bundle.into(),
        dest: dest.into(),
        first: first.into(),
        second: second.into(),
    }
}

/// Creates an error for more than one trim_against relation
pub fn multiple_trim_against(bundle: impl Into<String>, count: usize) -> ApexError {
    ApexError::MultipleTrimAgainst {
        bundle: bundle.into(),
        count,
    }
}

/// Aggregates every error of one bundle into a single diagnostic
pub fn bundle_failed(bundle: impl Into<String>, errors: Vec<ApexError>) -> ApexError {
    ApexError::BundleFailed {
        bundle: bundle.into(),
        errors,
    }
}

/// Summarizes a run in which at least one selected bundle failed
pub fn bundles_failed(failed: usize, total: usize) -> ApexError {
    ApexError::BundlesFailed { failed, total }
}
