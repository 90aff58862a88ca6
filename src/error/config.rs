//! Configuration errors

use super::ApexError;

/// Creates a graph directory not found error
pub fn not_found(path: impl Into<String>) -> ApexError {
    ApexError::ConfigNotFound { path: path.into() }
}

/// Creates a module definitions parse failed error
pub fn parse_failed(path: impl Into<String>, reason: impl Into<String>) -> ApexError {
    ApexError::ConfigParseFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an invalid config error
pub fn invalid(message: impl Into<String>) -> ApexError {
    ApexError::ConfigInvalid {
        message: message.into(),
    }
}

/// Creates a module definitions read failed error
pub fn read_failed(path: impl Into<String>, reason: impl Into<String>) -> ApexError {
    ApexError::ConfigReadFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an error reported against one property of a module
pub fn property_error(
    module: impl Into<String>,
    property: impl Into<String>,
    message: impl Into<String>,
) -> ApexError {
    ApexError::PropertyError {
        module: module.into(),
        property: property.into(),
        message: message.into(),
    }
}

/// Creates an error reported against a module as a whole
pub fn module_error(module: impl Into<String>, message: impl Into<String>) -> ApexError {
    ApexError::ModuleError {
        module: module.into(),
        message: message.into(),
    }
}
