//! Signing metadata
//!
//! Certificates are written in three forms:
//!
//! ```text
//! ":com.x.y.cert"  -> path prefix of the android_app_certificate module
//! "xy"             -> <dir of default_dev_certificate>/xy
//! (unset)          -> default_dev_certificate
//! ```

use serde::Serialize;

use crate::config::{ApexKeyProps, ModuleKind, ProductConfig};
use crate::error::{ApexError, module_error};
use crate::graph::ModuleGraph;

const PRESIGNED: &str = "PRESIGNED";

/// A `.x509.pem` / `.pk8` certificate pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Certificate {
    pub pem: String,
    pub key: String,
}

impl Certificate {
    pub fn from_prefix(prefix: &str) -> Self {
        Self {
            pem: format!("{prefix}.x509.pem"),
            key: format!("{prefix}.pk8"),
        }
    }

    /// Marker for packages that are already signed
    pub fn presigned() -> Self {
        Self {
            pem: PRESIGNED.to_string(),
            key: String::new(),
        }
    }
}

/// Payload signing key pair of a bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyPair {
    pub public_key: String,
    pub private_key: String,
}

impl KeyPair {
    pub fn from_apex_key(name: &str, props: &ApexKeyProps) -> Self {
        Self {
            public_key: props
                .public_key
                .clone()
                .unwrap_or_else(|| format!("{name}.avbpubkey")),
            private_key: props
                .private_key
                .clone()
                .unwrap_or_else(|| format!("{name}.pem")),
        }
    }
}

fn default_dir(product: &ProductConfig) -> &str {
    product
        .default_dev_certificate
        .rsplit_once('/')
        .map_or("", |(dir, _)| dir)
}

/// Resolve a certificate property of `owner`
///
/// # Errors
///
/// Returns a module error when a `:module` reference does not name an
/// `android_app_certificate`.
pub fn resolve_certificate(
    graph: &ModuleGraph,
    product: &ProductConfig,
    owner: &str,
    value: Option<&str>,
) -> Result<Certificate, ApexError> {
    match value.filter(|value| !value.is_empty()) {
        None => Ok(Certificate::from_prefix(&product.default_dev_certificate)),
        Some(PRESIGNED) => Ok(Certificate::presigned()),
        Some(value) => {
            if let Some(module) = value.strip_prefix(':') {
                let cert = graph
                    .module_id(module)
                    .map(|id| &graph.module(id).kind);
                return match cert {
                    Some(ModuleKind::AndroidAppCertificate(props)) => {
                        Ok(Certificate::from_prefix(&props.certificate))
                    }
                    _ => Err(module_error(
                        owner,
                        format!(
                            "certificate dependency {module:?} must be an android_app_certificate module"
                        ),
                    )),
                };
            }
            let dir = default_dir(product);
            if dir.is_empty() {
                Ok(Certificate::from_prefix(value))
            } else {
                Ok(Certificate::from_prefix(&format!("{dir}/{value}")))
            }
        }
    }
}
