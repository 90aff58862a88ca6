//! Per-bundle packaging plan
//!
//! Runs the per-bundle phases in order and folds every problem they report
//! into a single `BundleFailed` error.

use serde::Serialize;
use tracing::{debug, info};

use super::checks::run_checks;
use super::classify::classify;
use super::context::BundleContext;
use super::dcla::libs_to_trim;
use super::file::{ApexFile, FileClass};
use super::normalize::{normalize, should_check_duplicate};
use super::packaging::{Packaging, packaging};
use super::signing::{Certificate, KeyPair};
use crate::error::{ApexError, bundle_failed};
use crate::hash::hash_contents;

/// Everything downstream packaging needs to build one bundle
#[derive(Debug, Clone, Serialize)]
pub struct BundlePlan {
    pub name: String,
    pub variation: String,
    pub is_test: bool,
    pub files: Vec<ApexFile>,
    pub provide_native_libs: Vec<String>,
    pub require_native_libs: Vec<String>,
    pub make_modules_to_install: Vec<String>,
    pub packaging: Packaging,
    pub key: KeyPair,
    pub certificate: Certificate,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub libs_to_trim: Vec<String>,
    pub digest: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Records generated for the bundle itself rather than for a dependency
fn meta_files(ctx: &BundleContext<'_>) -> Vec<ApexFile> {
    let variation = ctx.graph.variation(ctx.bundle.node).to_string();
    ["apex_manifest.pb", "apex_pubkey"]
        .into_iter()
        .map(|stem| {
            let built = format!("out/{}/{variation}/{stem}", ctx.name());
            ApexFile::new(stem, built, ".", FileClass::Etc)
        })
        .collect()
}

/// Build the plan of one bundle
///
/// # Errors
///
/// Returns `BundleFailed` carrying every classification, collision, check,
/// packaging and trimming error of the bundle.
pub fn build_plan(ctx: &BundleContext<'_>) -> Result<BundlePlan, ApexError> {
    let name = ctx.name();
    let classified = classify(ctx);
    let mut errors = classified.errors;

    let (mut files, collisions) =
        normalize(name, classified.files, should_check_duplicate(ctx));
    errors.extend(collisions);
    if ctx.config.is_installable() {
        files.extend(meta_files(ctx));
    }

    errors.extend(run_checks(ctx));

    let packaging = packaging(ctx).map_err(|found| errors.extend(found)).ok();
    let libs_to_trim = libs_to_trim(ctx).unwrap_or_else(|err| {
        errors.push(err);
        Vec::new()
    });

    let (Some(packaging), Some(key), Some(certificate), true) = (
        packaging,
        classified.key,
        classified.container_certificate,
        errors.is_empty(),
    ) else {
        info!(bundle = %name, errors = errors.len(), "bundle failed");
        return Err(bundle_failed(name, errors));
    };

    let link = packaging
        .primary()
        .is_some_and(|variant| variant.link_to_system_lib);
    for file in &mut files {
        file.symlink_to_system = link && file.transitive && file.available_to_platform;
    }

    let mut make_modules_to_install = classified.make_modules_to_install;
    make_modules_to_install.extend(packaging.make_modules_to_install.iter().cloned());
    make_modules_to_install.sort();
    make_modules_to_install.dedup();

    let digest = hash_contents(&files);
    debug!(bundle = %name, files = files.len(), %digest, "plan ready");

    Ok(BundlePlan {
        name: name.to_string(),
        variation: ctx.graph.variation(ctx.bundle.node).to_string(),
        is_test: ctx.bundle.is_test,
        files,
        provide_native_libs: classified.provide_native_libs,
        require_native_libs: classified.require_native_libs,
        make_modules_to_install,
        packaging,
        key,
        certificate,
        libs_to_trim,
        digest,
        warnings: ctx.bundle.warnings.clone(),
    })
}
