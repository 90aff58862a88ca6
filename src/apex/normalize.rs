//! Collision resolution over classified files

use std::collections::BTreeMap;

use super::context::BundleContext;
use super::file::ApexFile;
use crate::error::{ApexError, duplicate_apex_file};

/// Whether two different sources installing to one path is an error
///
/// Coverage, test and host bundles, and devices without any architecture,
/// tolerate collisions and keep the first file.
pub fn should_check_duplicate(ctx: &BundleContext<'_>) -> bool {
    !(ctx.product.native_coverage
        || ctx.bundle.is_test
        || ctx.is_host()
        || ctx.product.is_archless_device())
}

/// Merge files sharing an install destination and sort by path
///
/// Records from the same built file merge into one that is transitive only
/// when every occurrence was.
pub fn normalize(
    bundle: &str,
    files: Vec<ApexFile>,
    check_duplicate: bool,
) -> (Vec<ApexFile>, Vec<ApexError>) {
    let mut by_dest: BTreeMap<String, ApexFile> = BTreeMap::new();
    let mut errors = Vec::new();

    for file in files {
        let dest = file.dest();
        match by_dest.get_mut(&dest) {
            None => {
                by_dest.insert(dest, file);
            }
            Some(existing) if existing.built_file == file.built_file => {
                existing.transitive = existing.transitive && file.transitive;
            }
            Some(existing) => {
                if check_duplicate {
                    errors.push(duplicate_apex_file(
                        bundle,
                        &dest,
                        &existing.built_file,
                        &file.built_file,
                    ));
                }
            }
        }
    }

    let mut files: Vec<ApexFile> = by_dest.into_values().collect();
    files.sort_by_key(ApexFile::path);
    (files, errors)
}
