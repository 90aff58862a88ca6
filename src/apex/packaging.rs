//! Packaging variants of a bundle
//!
//! One bundle may be emitted as a filesystem image, a zip archive, a flattened
//! directory, or several of these at once. Each variant carries its own
//! install suffix, partition and compression decision.

use serde::Serialize;

use super::context::BundleContext;
use crate::error::{ApexError, property_error};

/// How the payload of one packaging variant is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApexType {
    Image,
    Zip,
    Flattened,
}

impl ApexType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Zip => "zip",
            Self::Flattened => "flattened",
        }
    }
}

/// Filesystem of an image payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFsType {
    #[default]
    Ext4,
    F2fs,
    Erofs,
}

impl PayloadFsType {
    fn parse(raw: Option<&str>) -> Option<Self> {
        match raw {
            None | Some("ext4") => Some(Self::Ext4),
            Some("f2fs") => Some(Self::F2fs),
            Some("erofs") => Some(Self::Erofs),
            Some(_) => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ext4 => "ext4",
            Self::F2fs => "f2fs",
            Self::Erofs => "erofs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackagingVariant {
    pub apex_type: ApexType,
    /// Appended to the bundle name to form the installed module name
    pub suffix: String,
    /// Whether this variant is installed under the plain bundle name
    pub primary: bool,
    pub partition: String,
    pub compressed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    /// Whether packaged libraries also available on the platform become symlinks
    pub link_to_system_lib: bool,
}

/// Packaging decisions for one bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Packaging {
    pub variants: Vec<PackagingVariant>,
    pub payload_fs_type: PayloadFsType,
    /// Extra platform modules implied by the chosen variants
    pub make_modules_to_install: Vec<String>,
}

impl Packaging {
    /// The variant installed under the plain bundle name
    pub fn primary(&self) -> Option<&PackagingVariant> {
        self.variants.iter().find(|variant| variant.primary)
    }
}

fn apex_types(ctx: &BundleContext<'_>) -> Result<Vec<ApexType>, ApexError> {
    match ctx.config.payload_type.as_deref() {
        None | Some("image") => Ok(vec![ApexType::Image, ApexType::Flattened]),
        Some("zip") => Ok(vec![ApexType::Zip]),
        Some("both") => Ok(vec![ApexType::Image, ApexType::Zip, ApexType::Flattened]),
        Some(other) => Err(property_error(
            ctx.name(),
            "payload_type",
            format!("{other:?} is not one of \"image\", \"zip\", or \"both\"."),
        )),
    }
}

fn is_platform_bundle(ctx: &BundleContext<'_>) -> bool {
    !ctx.decl.common.vendor && !ctx.decl.common.product_specific
}

fn partition(ctx: &BundleContext<'_>, apex_type: ApexType) -> &'static str {
    if apex_type == ApexType::Flattened && !ctx.product.flatten_apex && is_platform_bundle(ctx) {
        return "system_ext";
    }
    if ctx.decl.common.vendor {
        "vendor"
    } else if ctx.decl.common.product_specific {
        "product"
    } else {
        "system"
    }
}

fn is_compressed(ctx: &BundleContext<'_>, apex_type: ApexType) -> bool {
    if apex_type != ApexType::Image {
        return false;
    }
    ctx.config.test_only_force_compression
        || (ctx.product.compression_enabled && ctx.config.compressible && !ctx.bundle.is_test)
}

fn link_to_system_lib(ctx: &BundleContext<'_>, apex_type: ApexType) -> bool {
    let mut link = !ctx.product.unbundled_build && ctx.config.is_installable();
    if ctx.is_vendor() || ctx.is_enforced_product() {
        link = false;
    }
    let updatable = ctx.config.is_updatable() || ctx.config.future_updatable;
    if updatable && apex_type == ApexType::Image && !ctx.product.force_symlink_optimization {
        link = false;
    }
    if ctx.is_host() {
        link = false;
    }
    link
}

/// Decide the packaging variants of one bundle
///
/// # Errors
///
/// Returns every property error found: an unknown `payload_type` and an
/// unsupported `payload_fs_type` are reported together.
pub fn packaging(ctx: &BundleContext<'_>) -> Result<Packaging, Vec<ApexError>> {
    let mut errors = Vec::new();
    let types = apex_types(ctx).unwrap_or_else(|err| {
        errors.push(err);
        Vec::new()
    });
    let fs_type = PayloadFsType::parse(ctx.config.payload_fs_type.as_deref());
    if fs_type.is_none() {
        errors.push(property_error(
            ctx.name(),
            "payload_fs_type",
            format!(
                "{:?} is not a valid filesystem for apex [ext4, f2fs, erofs]",
                ctx.config.payload_fs_type.as_deref().unwrap_or_default()
            ),
        ));
    }
    let Some(payload_fs_type) = fs_type.filter(|_| errors.is_empty()) else {
        return Err(errors);
    };

    let name = ctx.name();
    let flatten = ctx.product.flatten_apex;
    let zip_only = ctx.config.payload_type.as_deref() == Some("zip");
    let mut make_modules_to_install = Vec::new();
    let mut variants = Vec::with_capacity(types.len());

    for apex_type in types {
        let (suffix, primary) = match apex_type {
            ApexType::Image if flatten => (".apex", false),
            ApexType::Image => {
                if ctx.product.install_extra_flattened_apexes {
                    make_modules_to_install.push(format!("{name}.flattened"));
                }
                ("", true)
            }
            ApexType::Zip if zip_only => ("", true),
            ApexType::Zip => (".zipapex", false),
            ApexType::Flattened if flatten => ("", true),
            ApexType::Flattened => (".flattened", false),
        };
        let compressed = is_compressed(ctx, apex_type);
        let output_file = match apex_type {
            ApexType::Image if compressed => Some(format!("{name}.capex")),
            ApexType::Image => Some(format!("{name}.apex")),
            ApexType::Zip => Some(format!("{name}.zipapex")),
            ApexType::Flattened => None,
        };
        variants.push(PackagingVariant {
            apex_type,
            suffix: suffix.to_string(),
            primary,
            partition: partition(ctx, apex_type).to_string(),
            compressed,
            output_file,
            link_to_system_lib: link_to_system_lib(ctx, apex_type),
        });
    }

    Ok(Packaging {
        variants,
        payload_fs_type,
        make_modules_to_install,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_fixtures::Prepared;

    fn bundle(product: &str, props: &str) -> String {
        format!(
            r"
product:
  device_targets: [arm64]
{product}
modules:
  - kind: apex_key
    name: com.x.y.key
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    updatable: false
{props}
"
        )
    }

    fn summary(packaging: &Packaging) -> Vec<(ApexType, &str, bool, &str)> {
        packaging
            .variants
            .iter()
            .map(|v| (v.apex_type, v.suffix.as_str(), v.primary, v.partition.as_str()))
            .collect()
    }

    #[test]
    fn test_image_default_without_flattening() {
        let prepared = Prepared::load(&bundle("", ""));
        let packaging = packaging(&prepared.context("com.x.y")).unwrap();
        assert_eq!(
            summary(&packaging),
            vec![
                (ApexType::Image, "", true, "system"),
                (ApexType::Flattened, ".flattened", false, "system_ext"),
            ]
        );
        assert_eq!(packaging.variants[0].output_file.as_deref(), Some("com.x.y.apex"));
        assert_eq!(packaging.variants[1].output_file, None);
        assert_eq!(packaging.payload_fs_type, PayloadFsType::Ext4);
        assert!(packaging.primary().unwrap().link_to_system_lib);
    }

    #[test]
    fn test_flatten_apex_makes_flattened_primary() {
        let prepared = Prepared::load(&bundle("  flatten_apex: true", ""));
        let packaging = packaging(&prepared.context("com.x.y")).unwrap();
        assert_eq!(
            summary(&packaging),
            vec![
                (ApexType::Image, ".apex", false, "system"),
                (ApexType::Flattened, "", true, "system"),
            ]
        );
    }

    #[test]
    fn test_zip_and_both_payloads() {
        let prepared = Prepared::load(&bundle("", "    payload_type: zip"));
        let zip = packaging(&prepared.context("com.x.y")).unwrap();
        assert_eq!(summary(&zip), vec![(ApexType::Zip, "", true, "system")]);
        assert_eq!(zip.variants[0].output_file.as_deref(), Some("com.x.y.zipapex"));

        let prepared = Prepared::load(&bundle("", "    payload_type: both"));
        let both = packaging(&prepared.context("com.x.y")).unwrap();
        assert_eq!(
            summary(&both),
            vec![
                (ApexType::Image, "", true, "system"),
                (ApexType::Zip, ".zipapex", false, "system"),
                (ApexType::Flattened, ".flattened", false, "system_ext"),
            ]
        );
    }

    #[test]
    fn test_invalid_payload_properties_reported_together() {
        let prepared = Prepared::load(&bundle(
            "",
            "    payload_type: tarball\n    payload_fs_type: btrfs",
        ));
        let errors = packaging(&prepared.context("com.x.y")).unwrap_err();
        assert_eq!(
            errors,
            vec![
                property_error(
                    "com.x.y",
                    "payload_type",
                    "\"tarball\" is not one of \"image\", \"zip\", or \"both\"."
                ),
                property_error(
                    "com.x.y",
                    "payload_fs_type",
                    "\"btrfs\" is not a valid filesystem for apex [ext4, f2fs, erofs]"
                ),
            ]
        );
    }

    #[test]
    fn test_compression_and_fs_type() {
        let prepared = Prepared::load(&bundle(
            "  compression_enabled: true",
            "    compressible: true\n    payload_fs_type: erofs",
        ));
        let packaging = packaging(&prepared.context("com.x.y")).unwrap();
        let image = &packaging.variants[0];
        assert!(image.compressed);
        assert_eq!(image.output_file.as_deref(), Some("com.x.y.capex"));
        assert!(!packaging.variants[1].compressed);
        assert_eq!(packaging.payload_fs_type, PayloadFsType::Erofs);
    }

    #[test]
    fn test_vendor_partition_disables_system_links() {
        let prepared = Prepared::load(&bundle("", "    vendor: true"));
        let packaging = packaging(&prepared.context("com.x.y")).unwrap();
        assert_eq!(
            summary(&packaging),
            vec![
                (ApexType::Image, "", true, "vendor"),
                (ApexType::Flattened, ".flattened", false, "vendor"),
            ]
        );
        assert!(packaging.variants.iter().all(|v| !v.link_to_system_lib));
    }

    #[test]
    fn test_updatable_image_keeps_libraries_private() {
        let yaml = bundle("  install_extra_flattened_apexes: true", "    min_sdk_version: '29'")
            .replace("updatable: false", "updatable: true");
        let prepared = Prepared::load(&yaml);
        let packaging = packaging(&prepared.context("com.x.y")).unwrap();
        assert!(!packaging.variants[0].link_to_system_lib);
        assert!(packaging.variants[1].link_to_system_lib);
        assert_eq!(packaging.make_modules_to_install, vec!["com.x.y.flattened".to_string()]);
    }
}
