//! Per-target native dependency requests
//!
//! A bundle is architecture-generic but its native members are not. For every
//! target the bundle is built for, the request lists of the matching buckets
//! are concatenated in a fixed order:
//!
//! 1. `multilib.both` and the unqualified `native_shared_libs`/`jni_libs`/
//!    `rust_dyn_libs`/`tests`
//! 2. primary target only: `multilib.first` and the unqualified `binaries`
//! 3. `multilib.lib32` + `multilib.prefer32` on 32-bit targets;
//!    `multilib.lib64` on 64-bit targets, plus `multilib.prefer32` when no
//!    32-bit target is requested
//! 4. `arch.<arch>`
//!
//! Exclusions are subtracted once, after the merge.

use tracing::warn;

use crate::config::{
    BundleConfig, MultilibProperties, NativeDependencies, ResolvedNativeDependencies,
};
use crate::domain::{CompileMultilib, Multilib, OsType, Target};

/// Merged request of one bundle for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRequest {
    pub target: Target,
    pub primary: bool,
    pub deps: ResolvedNativeDependencies,
}

fn append(into: &mut MultilibProperties, from: &MultilibProperties) {
    into.first.merge(&from.first);
    into.both.merge(&from.both);
    into.prefer32.merge(&from.prefer32);
    into.lib32.merge(&from.lib32);
    into.lib64.merge(&from.lib64);
}

/// Top-level multilib buckets with the `target.<os>` buckets appended
pub fn combined_multilib(config: &BundleConfig, os: OsType) -> MultilibProperties {
    let mut multilib = config.multilib.clone();
    for os_props in config.target.for_os(os) {
        append(&mut multilib, &os_props.multilib);
    }
    multilib
}

/// Build the merged request for every target, primary first
pub fn requests(config: &BundleConfig, targets: &[Target]) -> Vec<TargetRequest> {
    let has_32bit_target = targets
        .iter()
        .any(|target| target.arch.multilib() == Multilib::Lib32);

    targets
        .iter()
        .enumerate()
        .map(|(i, target)| {
            let multilib = combined_multilib(config, target.os);
            let mut deps = NativeDependencies::default();

            deps.merge(&multilib.both);
            deps.merge(&config.unqualified_for_all_targets());

            let primary = i == 0;
            if primary {
                deps.merge(&multilib.first);
                deps.merge(&config.unqualified_for_primary_target());
            }

            match target.arch.multilib() {
                Multilib::Lib32 => {
                    deps.merge(&multilib.lib32);
                    deps.merge(&multilib.prefer32);
                }
                Multilib::Lib64 => {
                    deps.merge(&multilib.lib64);
                    if !has_32bit_target {
                        deps.merge(&multilib.prefer32);
                    }
                }
            }

            deps.merge(config.arch.for_arch(target.arch));

            TargetRequest {
                target: *target,
                primary,
                deps: deps.resolve(),
            }
        })
        .collect()
}

/// Named multilib bucket of a request list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Lib32,
    Lib64,
    Both,
    First,
}

impl Bucket {
    pub fn name(self) -> &'static str {
        match self {
            Bucket::Lib32 => "lib32",
            Bucket::Lib64 => "lib64",
            Bucket::Both => "both",
            Bucket::First => "first",
        }
    }
}

const NONE: &[Multilib] = &[];
const W32: &[Multilib] = &[Multilib::Lib32];
const W64: &[Multilib] = &[Multilib::Lib64];
const W32_64: &[Multilib] = &[Multilib::Lib32, Multilib::Lib64];

type Cell = (&'static [Multilib], &'static [Multilib]);

/// Widths a bucket resolves to, as (64-bit device, 32-bit-only device).
///
/// Rows are the bundle's compile_multilib (32, 64, both, first); columns are
/// the bucket (lib32, lib64, both, first). `first` × `lib32` resolving to 32
/// on a 64-bit device is kept as observed.
const MULTILIB_TABLE: [[Cell; 4]; 4] = [
    [(W32, W32), (NONE, NONE), (W32, W32), (NONE, W32)],
    [(NONE, NONE), (W64, NONE), (W64, NONE), (W64, NONE)],
    [(W32, W32), (W64, NONE), (W32_64, W32), (W64, W32)],
    [(W32, W32), (W64, NONE), (W64, W32), (W64, W32)],
];

/// Widths `bucket` resolves to for a bundle compiled with `compile_multilib`
///
/// Returns `None` for `prefer32`, which the table does not cover.
pub fn bucket_widths(
    compile_multilib: CompileMultilib,
    bucket: Bucket,
    device_is_64bit: bool,
) -> Option<&'static [Multilib]> {
    let row = match compile_multilib {
        CompileMultilib::Lib32 => 0,
        CompileMultilib::Lib64 => 1,
        CompileMultilib::Both => 2,
        CompileMultilib::First => 3,
        CompileMultilib::Prefer32 => return None,
    };
    let column = match bucket {
        Bucket::Lib32 => 0,
        Bucket::Lib64 => 1,
        Bucket::Both => 2,
        Bucket::First => 3,
    };
    let (wide, narrow) = MULTILIB_TABLE[row][column];
    Some(if device_is_64bit { wide } else { narrow })
}

/// Warnings for non-empty buckets that resolve to no architecture
pub fn ignored_bucket_warnings(
    bundle: &str,
    config: &BundleConfig,
    compile_multilib: CompileMultilib,
    targets: &[Target],
) -> Vec<String> {
    let Some(first) = targets.first() else {
        return Vec::new();
    };
    let device_is_64bit = targets
        .iter()
        .any(|target| target.arch.multilib() == Multilib::Lib64);
    let multilib = combined_multilib(config, first.os);

    let mut both = multilib.both.clone();
    both.merge(&config.unqualified_for_all_targets());
    let mut primary = multilib.first.clone();
    primary.merge(&config.unqualified_for_primary_target());

    let buckets = [
        (Bucket::Lib32, &multilib.lib32),
        (Bucket::Lib64, &multilib.lib64),
        (Bucket::Both, &both),
        (Bucket::First, &primary),
    ];

    let mut warnings = Vec::new();
    for (bucket, deps) in buckets {
        if !deps.has_requests() {
            continue;
        }
        let ignored = bucket_widths(compile_multilib, bucket, device_is_64bit)
            .is_some_and(<[Multilib]>::is_empty);
        if ignored {
            warn!(
                bundle,
                bucket = bucket.name(),
                compile_multilib = compile_multilib.as_str(),
                "multilib bucket resolves to no architecture"
            );
            warnings.push(format!(
                "multilib.{} of {bundle} is ignored with compile_multilib {}",
                bucket.name(),
                compile_multilib.as_str()
            ));
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::bundle::OsTargetProperties;
    use crate::domain::ArchType;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn arm_arm64() -> Vec<Target> {
        vec![Target::device(ArchType::Arm), Target::device(ArchType::Arm64)]
    }

    #[test]
    fn test_shared_libs_for_every_target() {
        let config = BundleConfig {
            native_shared_libs: names(&["libfoo"]),
            ..Default::default()
        };
        let requests = requests(&config, &arm_arm64());
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert_eq!(request.deps.native_shared_libs, names(&["libfoo"]));
        }
    }

    #[test]
    fn test_binaries_for_primary_only() {
        let config = BundleConfig {
            binaries: names(&["toolA"]),
            ..Default::default()
        };
        let requests = requests(&config, &arm_arm64());
        assert!(requests[0].primary);
        assert_eq!(requests[0].deps.binaries, names(&["toolA"]));
        assert!(requests[1].deps.binaries.is_empty());
    }

    #[test]
    fn test_prefer32_folds_into_64_only_without_32bit_target() {
        let mut config = BundleConfig::default();
        config.multilib.prefer32.native_shared_libs = names(&["libp"]);

        let with32 = requests(&config, &arm_arm64());
        assert_eq!(with32[0].deps.native_shared_libs, names(&["libp"]));
        assert!(with32[1].deps.native_shared_libs.is_empty());

        let only64 = requests(&config, &[Target::device(ArchType::Arm64)]);
        assert_eq!(only64[0].deps.native_shared_libs, names(&["libp"]));
    }

    #[test]
    fn test_arch_bucket_and_exclusion() {
        let mut config = BundleConfig {
            native_shared_libs: names(&["libfoo", "libbar"]),
            ..Default::default()
        };
        config.arch.arm.exclude_native_shared_libs = names(&["libbar"]);
        config.arch.arm64.native_shared_libs = names(&["libarm64"]);

        let requests = requests(&config, &arm_arm64());
        assert_eq!(requests[0].deps.native_shared_libs, names(&["libfoo"]));
        assert_eq!(
            requests[1].deps.native_shared_libs,
            names(&["libfoo", "libbar", "libarm64"])
        );
    }

    #[test]
    fn test_os_buckets_appended() {
        let mut config = BundleConfig::default();
        let mut android = OsTargetProperties::default();
        android.multilib.lib64.native_shared_libs = names(&["libdevice"]);
        config.target.android = Some(android);

        let requests = requests(&config, &arm_arm64());
        assert_eq!(requests[1].deps.native_shared_libs, names(&["libdevice"]));
        assert!(requests[0].deps.native_shared_libs.is_empty());
    }

    #[test]
    fn test_table_cells() {
        assert_eq!(
            bucket_widths(CompileMultilib::Both, Bucket::Both, true),
            Some(W32_64)
        );
        assert_eq!(
            bucket_widths(CompileMultilib::Lib64, Bucket::Lib32, true),
            Some(NONE)
        );
        assert_eq!(
            bucket_widths(CompileMultilib::First, Bucket::Lib32, true),
            Some(W32)
        );
        assert_eq!(bucket_widths(CompileMultilib::Prefer32, Bucket::Both, true), None);
    }

    #[test]
    fn test_ignored_bucket_warns() {
        let mut config = BundleConfig::default();
        config.multilib.lib32.native_shared_libs = names(&["lib32only"]);
        let warnings =
            ignored_bucket_warnings("com.x.y", &config, CompileMultilib::Lib64, &arm_arm64());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("multilib.lib32"));

        assert!(
            ignored_bucket_warnings("com.x.y", &config, CompileMultilib::Both, &arm_arm64())
                .is_empty()
        );
    }
}
