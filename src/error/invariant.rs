//! Bundle invariant violations

use super::ApexError;

/// Creates an availability violation
pub fn not_available(
    bundle: impl Into<String>,
    from: impl Into<String>,
    to: impl Into<String>,
    path: impl Into<String>,
) -> ApexError {
    let bundle = bundle.into();
    let to = to.into();
    let advice = format!("Consider adding {bundle:?} to 'apex_available' property of {to:?}");
    ApexError::NotAvailable {
        bundle,
        from: from.into(),
        to,
        path: path.into(),
        advice,
    }
}

/// Creates a stub library static link violation
pub fn stub_static_link(
    bundle: impl Into<String>,
    from: impl Into<String>,
    to: impl Into<String>,
    path: impl Into<String>,
) -> ApexError {
    ApexError::StubStaticLink {
        bundle: bundle.into(),
        from: from.into(),
        to: to.into(),
        path: path.into(),
    }
}

/// Creates a static executable violation
pub fn static_executable(bundle: impl Into<String>, executable: impl Into<String>) -> ApexError {
    ApexError::StaticExecutable {
        bundle: bundle.into(),
        executable: executable.into(),
    }
}

/// Creates a min_sdk_version monotonicity violation
pub fn min_sdk_too_high(
    bundle: impl Into<String>,
    module: impl Into<String>,
    module_min: impl Into<String>,
    bundle_min: impl Into<String>,
    path: impl Into<String>,
) -> ApexError {
    ApexError::MinSdkTooHigh {
        bundle: bundle.into(),
        module: module.into(),
        module_min: module_min.into(),
        bundle_min: bundle_min.into(),
        path: path.into(),
    }
}

/// Creates an error for a packaged module without min_sdk_version
pub fn min_sdk_missing(
    bundle: impl Into<String>,
    module: impl Into<String>,
    bundle_min: impl Into<String>,
    path: impl Into<String>,
) -> ApexError {
    ApexError::MinSdkMissing {
        bundle: bundle.into(),
        module: module.into(),
        bundle_min: bundle_min.into(),
        path: path.into(),
    }
}
