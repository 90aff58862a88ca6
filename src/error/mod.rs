//! Error types and handling for apexdeps
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`config`]: Malformed or missing graph/bundle configuration
//! - [`graph`]: Graph engine errors (missing modules, variations, cycles)
//! - [`invariant`]: Bundle invariant violations found by graph walks
//! - [`internal`]: Internal consistency errors

pub mod config;
pub mod graph;
pub mod internal;
pub mod invariant;

pub use config::{
    invalid as config_invalid, module_error, not_found as config_not_found,
    parse_failed as config_parse_failed, property_error, read_failed as config_read_failed,
};
pub use graph::{
    circular as circular_dependency, dependency_not_found, provider_already_published,
    variation_not_found,
};
pub use internal::{bundle_failed, bundles_failed, duplicate_apex_file, multiple_trim_against};
pub use invariant::{
    min_sdk_missing, min_sdk_too_high, not_available, static_executable, stub_static_link,
};

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for apexdeps operations
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ApexError {
    // Configuration errors
    #[error("Graph directory not found: {path}")]
    #[diagnostic(
        code(apexdeps::config::not_found),
        help("Pass the directory holding the module definition files with --graph")
    )]
    ConfigNotFound { path: String },

    #[error("Failed to read module definitions: {path}")]
    #[diagnostic(code(apexdeps::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse module definitions in {path}: {reason}")]
    #[diagnostic(
        code(apexdeps::config::parse_failed),
        help("Each file must contain an optional 'product' block and a 'modules' list")
    )]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(apexdeps::config::invalid))]
    ConfigInvalid { message: String },

    #[error("module {module:?}: property {property:?}: {message}")]
    #[diagnostic(code(apexdeps::config::property))]
    PropertyError {
        module: String,
        property: String,
        message: String,
    },

    #[error("module {module:?}: {message}")]
    #[diagnostic(code(apexdeps::config::module))]
    ModuleError { module: String, message: String },

    // Graph errors
    #[error("module {module:?} depends on undefined module {dependency:?}")]
    #[diagnostic(
        code(apexdeps::graph::dependency_not_found),
        help("Declare the module in one of the module definition files")
    )]
    DependencyNotFound { module: String, dependency: String },

    #[error("module {module:?}: dependency {dependency:?} has no variation {variation:?}")]
    #[diagnostic(
        code(apexdeps::graph::variation_not_found),
        help("Check the compile_multilib of the dependency against the requested targets")
    )]
    VariationNotFound {
        module: String,
        dependency: String,
        variation: String,
    },

    #[error("Circular dependency detected: {chain}")]
    #[diagnostic(
        code(apexdeps::graph::circular),
        help("Remove one of the edges in the cycle")
    )]
    CircularDependency { chain: String },

    #[error("provider for {key:?} already published in phase {phase}")]
    #[diagnostic(code(apexdeps::graph::provider_already_published))]
    ProviderAlreadyPublished { key: String, phase: String },

    // Invariant violations
    #[error(
        "{bundle}: {from:?} requires {to:?} that doesn't list the APEX under 'apex_available'.\n\nDependency path: {path}"
    )]
    #[diagnostic(code(apexdeps::invariant::not_available))]
    NotAvailable {
        bundle: String,
        from: String,
        to: String,
        path: String,
        #[help]
        advice: String,
    },

    #[error(
        "{bundle}: {to:?} required by {from:?} is a native library providing stub. It shouldn't be included in this APEX via static linking. Dependency path: {path}"
    )]
    #[diagnostic(
        code(apexdeps::invariant::stub_static_link),
        help("Link against the library dynamically so that its stub interface is used")
    )]
    StubStaticLink {
        bundle: String,
        from: String,
        to: String,
        path: String,
    },

    #[error("{bundle}: executable {executable} is static")]
    #[diagnostic(
        code(apexdeps::invariant::static_executable),
        help("Only the bootstrap tools of com.android.runtime may be static executables")
    )]
    StaticExecutable { bundle: String, executable: String },

    #[error(
        "{bundle}: {module:?} requires min_sdk_version {module_min} which is higher than the APEX min_sdk_version {bundle_min}. Dependency path: {path}"
    )]
    #[diagnostic(code(apexdeps::invariant::min_sdk_too_high))]
    MinSdkTooHigh {
        bundle: String,
        module: String,
        module_min: String,
        bundle_min: String,
        path: String,
    },

    #[error(
        "{bundle}: {module:?} should support min_sdk_version({bundle_min}) but does not declare min_sdk_version. Dependency path: {path}"
    )]
    #[diagnostic(
        code(apexdeps::invariant::min_sdk_missing),
        help("Set min_sdk_version on the module or remove it from the APEX")
    )]
    MinSdkMissing {
        bundle: String,
        module: String,
        bundle_min: String,
        path: String,
    },

    // Internal consistency errors
    #[error("{bundle}: apex file {dest} is provided by two different files {first} and {second}")]
    #[diagnostic(code(apexdeps::internal::duplicate_apex_file))]
    DuplicateApexFile {
        bundle: String,
        dest: String,
        first: String,
        second: String,
    },

    #[error("{bundle}: only one trim_against relation is allowed, found {count}")]
    #[diagnostic(code(apexdeps::internal::multiple_trim_against))]
    MultipleTrimAgainst { bundle: String, count: usize },

    #[error("Bundle {bundle:?} failed with {} error(s)", errors.len())]
    #[diagnostic(code(apexdeps::bundle::failed))]
    BundleFailed {
        bundle: String,
        #[related]
        errors: Vec<ApexError>,
    },

    #[error("{failed} of {total} bundle(s) failed")]
    #[diagnostic(code(apexdeps::bundle::some_failed))]
    BundlesFailed { failed: usize, total: usize },

    #[error("IO error: {message}")]
    #[diagnostic(code(apexdeps::fs::io_error))]
    IoError { message: String },
}

impl ApexError {
    /// Bundle this error is attributed to, if any
    pub fn bundle(&self) -> Option<&str> {
        match self {
            ApexError::NotAvailable { bundle, .. }
            | ApexError::StubStaticLink { bundle, .. }
            | ApexError::StaticExecutable { bundle, .. }
            | ApexError::MinSdkTooHigh { bundle, .. }
            | ApexError::MinSdkMissing { bundle, .. }
            | ApexError::DuplicateApexFile { bundle, .. }
            | ApexError::MultipleTrimAgainst { bundle, .. }
            | ApexError::BundleFailed { bundle, .. } => Some(bundle),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ApexError {
    fn from(err: std::io::Error) -> Self {
        ApexError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ApexError {
    fn from(err: serde_yaml::Error) -> Self {
        ApexError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApexError {
    fn from(err: serde_json::Error) -> Self {
        ApexError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, ApexError>;
