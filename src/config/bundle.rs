//! Bundle (apex / apex_test) configuration data structures

use serde::{Deserialize, Serialize};

use crate::domain::{ArchType, OsType};

/// Native dependency request lists with their parallel exclusion lists
///
/// Requests from several buckets are merged by concatenation; exclusions are
/// subtracted once, in [`NativeDependencies::resolve`], before any edge exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeDependencies {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub native_shared_libs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub jni_libs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rust_dyn_libs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub binaries: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filesystems: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_native_shared_libs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_jni_libs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_rust_dyn_libs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_binaries: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_tests: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_filesystems: Vec<String>,
}

/// Native dependency lists after exclusion, ready to become edges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedNativeDependencies {
    pub native_shared_libs: Vec<String>,
    pub jni_libs: Vec<String>,
    pub rust_dyn_libs: Vec<String>,
    pub binaries: Vec<String>,
    pub tests: Vec<String>,
    pub filesystems: Vec<String>,
}

fn remove_list_from_list(list: &[String], remove: &[String]) -> Vec<String> {
    list.iter()
        .filter(|name| !remove.contains(name))
        .cloned()
        .collect()
}

impl NativeDependencies {
    /// Append every list of `other` to this request
    pub fn merge(&mut self, other: &NativeDependencies) {
        self.native_shared_libs
            .extend(other.native_shared_libs.iter().cloned());
        self.jni_libs.extend(other.jni_libs.iter().cloned());
        self.rust_dyn_libs.extend(other.rust_dyn_libs.iter().cloned());
        self.binaries.extend(other.binaries.iter().cloned());
        self.tests.extend(other.tests.iter().cloned());
        self.filesystems.extend(other.filesystems.iter().cloned());

        self.exclude_native_shared_libs
            .extend(other.exclude_native_shared_libs.iter().cloned());
        self.exclude_jni_libs
            .extend(other.exclude_jni_libs.iter().cloned());
        self.exclude_rust_dyn_libs
            .extend(other.exclude_rust_dyn_libs.iter().cloned());
        self.exclude_binaries
            .extend(other.exclude_binaries.iter().cloned());
        self.exclude_tests.extend(other.exclude_tests.iter().cloned());
        self.exclude_filesystems
            .extend(other.exclude_filesystems.iter().cloned());
    }

    /// Subtract the exclusion lists from the request lists
    pub fn resolve(&self) -> ResolvedNativeDependencies {
        ResolvedNativeDependencies {
            native_shared_libs: remove_list_from_list(
                &self.native_shared_libs,
                &self.exclude_native_shared_libs,
            ),
            jni_libs: remove_list_from_list(&self.jni_libs, &self.exclude_jni_libs),
            rust_dyn_libs: remove_list_from_list(&self.rust_dyn_libs, &self.exclude_rust_dyn_libs),
            binaries: remove_list_from_list(&self.binaries, &self.exclude_binaries),
            tests: remove_list_from_list(&self.tests, &self.exclude_tests),
            filesystems: remove_list_from_list(&self.filesystems, &self.exclude_filesystems),
        }
    }

    /// Whether any request list is non-empty
    pub fn has_requests(&self) -> bool {
        !(self.native_shared_libs.is_empty()
            && self.jni_libs.is_empty()
            && self.rust_dyn_libs.is_empty()
            && self.binaries.is_empty()
            && self.tests.is_empty()
            && self.filesystems.is_empty())
    }
}

/// Per-multilib buckets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultilibProperties {
    pub first: NativeDependencies,
    pub both: NativeDependencies,
    pub prefer32: NativeDependencies,
    pub lib32: NativeDependencies,
    pub lib64: NativeDependencies,
}

/// Per-architecture buckets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchProperties {
    pub arm: NativeDependencies,
    pub arm64: NativeDependencies,
    pub riscv64: NativeDependencies,
    pub x86: NativeDependencies,
    pub x86_64: NativeDependencies,
}

impl ArchProperties {
    pub fn for_arch(&self, arch: ArchType) -> &NativeDependencies {
        match arch {
            ArchType::Arm => &self.arm,
            ArchType::Arm64 => &self.arm64,
            ArchType::Riscv64 => &self.riscv64,
            ArchType::X86 => &self.x86,
            ArchType::X86_64 => &self.x86_64,
        }
    }
}

/// Multilib buckets that only apply to one operating system
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsTargetProperties {
    pub multilib: MultilibProperties,
}

/// `target:` block of a bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetProperties {
    pub android: Option<OsTargetProperties>,
    pub host: Option<OsTargetProperties>,
    pub linux_glibc: Option<OsTargetProperties>,
    pub linux_bionic: Option<OsTargetProperties>,
}

impl TargetProperties {
    /// Buckets matching `os`, the generic host block first
    pub fn for_os(&self, os: OsType) -> Vec<&OsTargetProperties> {
        let mut matching = Vec::new();
        match os {
            OsType::Android => matching.extend(self.android.as_ref()),
            OsType::LinuxGlibc => {
                matching.extend(self.host.as_ref());
                matching.extend(self.linux_glibc.as_ref());
            }
            OsType::LinuxBionic => {
                matching.extend(self.host.as_ref());
                matching.extend(self.linux_bionic.as_ref());
            }
        }
        matching
    }
}

/// Bundle configuration shared by `apex` and `apex_test` modules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Native libraries for every requested target
    pub native_shared_libs: Vec<String>,
    /// JNI libraries for every requested target
    pub jni_libs: Vec<String>,
    /// Rust dynamic libraries for every requested target
    pub rust_dyn_libs: Vec<String>,
    /// Executables for the primary target only
    pub binaries: Vec<String>,
    /// Test binaries for every requested target (apex_test only)
    pub tests: Vec<String>,

    pub multilib: MultilibProperties,
    pub arch: ArchProperties,
    pub target: TargetProperties,

    pub sh_binaries: Vec<String>,
    pub rros: Vec<String>,
    pub bootclasspath_fragments: Vec<String>,
    pub systemserverclasspath_fragments: Vec<String>,
    pub java_libs: Vec<String>,
    pub filesystems: Vec<String>,
    pub compat_configs: Vec<String>,

    // Overridable properties
    pub apps: Vec<String>,
    pub bpfs: Vec<String>,
    pub prebuilts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    pub compressible: bool,

    pub updatable: Option<bool>,
    pub future_updatable: bool,
    pub platform_apis: bool,
    pub use_vndk_as_stable: bool,
    pub installable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_fs_type: Option<String>,
    pub test_only_force_compression: bool,
    pub ignore_system_library_special_case: bool,
    pub dynamic_common_lib_apex: bool,
    pub trim_against: Vec<String>,
}

impl BundleConfig {
    /// Bundles are updatable unless they opt out
    pub fn is_updatable(&self) -> bool {
        self.updatable.unwrap_or(true)
    }

    pub fn is_installable(&self) -> bool {
        self.installable.unwrap_or(true)
    }

    /// Request lists that apply to every target regardless of bucket
    pub fn unqualified_for_all_targets(&self) -> NativeDependencies {
        NativeDependencies {
            native_shared_libs: self.native_shared_libs.clone(),
            jni_libs: self.jni_libs.clone(),
            rust_dyn_libs: self.rust_dyn_libs.clone(),
            tests: self.tests.clone(),
            ..NativeDependencies::default()
        }
    }

    /// Request lists that apply to the primary target only
    pub fn unqualified_for_primary_target(&self) -> NativeDependencies {
        NativeDependencies {
            binaries: self.binaries.clone(),
            ..NativeDependencies::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_merge_concatenates_lists() {
        let mut deps = NativeDependencies {
            native_shared_libs: names(&["liba"]),
            ..Default::default()
        };
        deps.merge(&NativeDependencies {
            native_shared_libs: names(&["libb"]),
            binaries: names(&["tool"]),
            ..Default::default()
        });
        assert_eq!(deps.native_shared_libs, names(&["liba", "libb"]));
        assert_eq!(deps.binaries, names(&["tool"]));
    }

    #[test]
    fn test_exclusion_wins_over_any_bucket() {
        let mut deps = NativeDependencies {
            native_shared_libs: names(&["liba", "libb"]),
            ..Default::default()
        };
        deps.merge(&NativeDependencies {
            native_shared_libs: names(&["libb"]),
            exclude_native_shared_libs: names(&["libb"]),
            ..Default::default()
        });
        assert_eq!(deps.resolve().native_shared_libs, names(&["liba"]));
    }

    #[test]
    fn test_merge_order_does_not_change_resolved_set() {
        let a = NativeDependencies {
            native_shared_libs: names(&["liba", "libc"]),
            exclude_native_shared_libs: names(&["libc"]),
            ..Default::default()
        };
        let b = NativeDependencies {
            native_shared_libs: names(&["libb"]),
            ..Default::default()
        };

        let mut ab = NativeDependencies::default();
        ab.merge(&a);
        ab.merge(&b);
        let mut ba = NativeDependencies::default();
        ba.merge(&b);
        ba.merge(&a);

        let mut left = ab.resolve().native_shared_libs;
        let mut right = ba.resolve().native_shared_libs;
        left.sort();
        right.sort();
        assert_eq!(left, right);
        assert_eq!(left, names(&["liba", "libb"]));
    }

    #[test]
    fn test_bundle_from_yaml() {
        let yaml = r"
native_shared_libs: [libfoo]
binaries: [toolA]
multilib:
  lib64:
    native_shared_libs: [libonly64]
arch:
  arm:
    exclude_native_shared_libs: [libfoo]
key: com.x.y.key
updatable: false
";
        let config: BundleConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.native_shared_libs, names(&["libfoo"]));
        assert_eq!(config.multilib.lib64.native_shared_libs, names(&["libonly64"]));
        assert_eq!(
            config.arch.for_arch(ArchType::Arm).exclude_native_shared_libs,
            names(&["libfoo"])
        );
        assert!(!config.is_updatable());
        assert_eq!(config.key.as_deref(), Some("com.x.y.key"));
    }

    #[test]
    fn test_updatable_by_default() {
        assert!(BundleConfig::default().is_updatable());
        assert!(BundleConfig::default().is_installable());
    }

    #[test]
    fn test_target_for_host_includes_generic_block() {
        let target = TargetProperties {
            host: Some(OsTargetProperties::default()),
            linux_glibc: Some(OsTargetProperties::default()),
            ..Default::default()
        };
        assert_eq!(target.for_os(OsType::LinuxGlibc).len(), 2);
        assert!(target.for_os(OsType::Android).is_empty());
    }
}
