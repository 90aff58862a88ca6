//! Product-wide build configuration

use serde::{Deserialize, Serialize};

use crate::domain::{ArchType, OsType, Target};
use crate::error::{Result, config_invalid};

/// Product configuration shared by every bundle in the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductConfig {
    /// Device architectures, primary first
    pub device_targets: Vec<String>,
    /// Host architectures used when `host` is set
    pub host_targets: Vec<String>,
    /// Bundles are built for the host instead of the device
    pub host: bool,
    pub flatten_apex: bool,
    pub unbundled_build: bool,
    pub apex_trim_enabled: bool,
    pub compression_enabled: bool,
    pub force_symlink_optimization: bool,
    pub install_extra_flattened_apexes: bool,
    pub native_coverage: bool,
    pub enforce_product_partition_interface: bool,
    #[serde(deserialize_with = "super::string_or_number_required")]
    pub build_id: String,
    #[serde(
        deserialize_with = "super::string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_sdk_version_override: Option<String>,
    pub default_dev_certificate: String,
    /// Bundle name prefixes whose bundle variation gets a default-variation alias
    pub alias_prefixes: Vec<String>,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            device_targets: vec!["arm64".to_string(), "arm".to_string()],
            host_targets: vec!["x86_64".to_string()],
            host: false,
            flatten_apex: false,
            unbundled_build: false,
            apex_trim_enabled: false,
            compression_enabled: false,
            force_symlink_optimization: false,
            install_extra_flattened_apexes: false,
            native_coverage: false,
            enforce_product_partition_interface: false,
            build_id: "UNKNOWN".to_string(),
            min_sdk_version_override: None,
            default_dev_certificate: "build/make/target/product/security/testkey".to_string(),
            alias_prefixes: vec!["com.android.art".to_string()],
        }
    }
}

fn parse_arches(list: &[String], field: &str) -> Result<Vec<ArchType>> {
    list.iter()
        .map(|raw| {
            raw.parse::<ArchType>()
                .map_err(|reason| config_invalid(format!("product.{field}: {reason}")))
        })
        .collect()
}

impl ProductConfig {
    /// Targets bundles are built for, primary first
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown architecture name.
    pub fn targets(&self) -> Result<Vec<Target>> {
        if self.host {
            Ok(parse_arches(&self.host_targets, "host_targets")?
                .into_iter()
                .map(|arch| Target::new(OsType::LinuxGlibc, arch))
                .collect())
        } else {
            Ok(parse_arches(&self.device_targets, "device_targets")?
                .into_iter()
                .map(Target::device)
                .collect())
        }
    }

    /// Whether the device has no architecture configured at all
    pub fn is_archless_device(&self) -> bool {
        !self.host && self.device_targets.is_empty()
    }

    /// Validate product configuration
    ///
    /// # Errors
    ///
    /// Returns an error for unknown architectures or an unusable build id.
    pub fn validate(&self) -> Result<()> {
        self.targets()?;
        if self.build_id.is_empty() {
            return Err(config_invalid("product.build_id must not be empty"));
        }
        Ok(())
    }

    /// Whether a bundle name participates in an overlapping-namespace family
    pub fn needs_default_alias(&self, bundle: &str) -> bool {
        self.alias_prefixes
            .iter()
            .any(|prefix| bundle.starts_with(prefix.as_str()))
    }
}
