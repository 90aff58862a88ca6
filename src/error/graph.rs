//! Graph engine errors

use super::ApexError;

/// Creates a dependency not found error
pub fn dependency_not_found(module: impl Into<String>, dependency: impl Into<String>) -> ApexError {
    ApexError::DependencyNotFound {
        module: module.into(),
        dependency: dependency.into(),
    }
}

/// Creates a missing variation error for a far-variation edge
pub fn variation_not_found(
    module: impl Into<String>,
    dependency: impl Into<String>,
    variation: impl Into<String>,
) -> ApexError {
    ApexError::VariationNotFound {
        module: module.into(),
        dependency: dependency.into(),
        variation: variation.into(),
    }
}

/// Creates a circular dependency error
pub fn circular(chain: impl Into<String>) -> ApexError {
    ApexError::CircularDependency {
        chain: chain.into(),
    }
}

/// Creates a double-publish error for a provider table
pub fn provider_already_published(key: impl Into<String>, phase: impl Into<String>) -> ApexError {
    ApexError::ProviderAlreadyPublished {
        key: key.into(),
        phase: phase.into(),
    }
}
