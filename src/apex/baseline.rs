//! Grandfathered `apex_available` exceptions
//!
//! Modules listed here were packaged in a bundle before they had to declare
//! availability for it. New entries must not be added; modules should list
//! the bundle in `apex_available` instead.

use crate::domain::AVAILABLE_TO_ANY_APEX;

const BASELINE: &[(&str, &[&str])] = &[
    ("com.android.appsearch", &["icing-java-proto-lite", "libprotobuf-java-lite"]),
    (
        "com.android.cellbroadcast",
        &["CellBroadcastApp", "CellBroadcastServiceModule"],
    ),
    ("com.android.extservices", &["flatbuffer_headers"]),
    (
        "com.android.neuralnetworks",
        &[
            "android.hidl.allocator@1.0",
            "android.hidl.memory.token@1.0",
            "android.hidl.memory@1.0",
            "android.hidl.safe_union@1.0",
            "libarect",
            "libbuildversion",
            "libmath",
            "libprocpartition",
        ],
    ),
    (
        "com.android.mediaprovider",
        &["MediaProvider", "MediaProviderGoogle", "fmq-java-lite"],
    ),
    (
        "com.android.runtime",
        &[
            "bionic_libc_platform_headers",
            "libarm-optimized-routines-math",
            "libc_aeabi",
            "libc_bionic",
            "libc_bionic_ndk",
            "libc_bootstrap",
            "libc_common",
            "libc_common_shared",
            "libc_common_static",
            "libc_dns",
            "libc_dynamic_dispatch",
            "libc_fortify",
            "libc_freebsd",
            "libc_freebsd_large_stack",
            "libc_gdtoa",
            "libc_init_dynamic",
            "libc_init_static",
            "libc_jemalloc_wrapper",
            "libc_netbsd",
            "libc_nomalloc",
            "libc_nopthread",
            "libc_openbsd",
            "libc_openbsd_large_stack",
            "libc_openbsd_ndk",
            "libc_pthread",
            "libc_static_dispatch",
            "libc_syscalls",
            "libc_tzcode",
            "libc_unwind_static",
            "libdebuggerd",
            "libdebuggerd_common_headers",
            "libdebuggerd_handler_core",
            "libdebuggerd_handler_fallback",
            "libdl_static",
            "libjemalloc5",
            "liblinker_main",
            "liblinker_malloc",
            "liblz4",
            "liblzma",
            "libprocinfo",
            "libpropertyinfoparser",
            "libscudo",
            "libstdc++",
            "libsystemproperties",
            "libtombstoned_client_static",
            "libunwindstack",
            "libz",
            "libziparchive",
        ],
    ),
    (
        "com.android.tethering",
        &[
            "android.hardware.tetheroffload.config-V1.0-java",
            "android.hardware.tetheroffload.control-V1.0-java",
            "net-utils-framework-common",
        ],
    ),
    (
        "com.android.wifi",
        &[
            "PlatformProperties",
            "android.hardware.wifi-V1.0-java",
            "android.hardware.wifi-V1.0-java-constants",
            "android.hardware.wifi-V1.1-java",
            "android.hardware.wifi-V1.2-java",
            "android.hardware.wifi-V1.3-java",
            "android.hardware.wifi-V1.4-java",
            "bouncycastle-unbundled",
            "dnsresolver_aidl_interface-V2-java",
            "error_prone_annotations",
            "framework-wifi-pre-jarjar",
            "framework-wifi-util-lib",
            "ipmemorystore-aidl-interfaces-V3-java",
            "ipmemorystore-aidl-interfaces-java",
            "ksoap2",
            "libnanohttpd",
            "wifi-lite-protos",
            "wifi-nano-protos",
            "wifi-service-pre-jarjar",
        ],
    ),
    (
        "com.android.os.statsd",
        &["libstatssocket_headers", "statsd-aidl-ndk"],
    ),
    (
        AVAILABLE_TO_ANY_APEX,
        &[
            "androidx",
            "libclang_rt",
            "libprofile-clang-extras",
            "libprofile-clang-extras_ndk",
            "libprofile-extras",
            "libprofile-extras_ndk",
            "libunwind",
        ],
    ),
];

/// Fold module name families onto their baseline entry
fn normalize_module_name(module: &str) -> &str {
    let module = module.strip_prefix("prebuilt_").unwrap_or(module);
    if module.starts_with("libclang_rt.") {
        "libclang_rt"
    } else if module.starts_with("androidx.") {
        "androidx"
    } else {
        module
    }
}

fn listed(apex: &str, module: &str) -> bool {
    BASELINE
        .iter()
        .any(|(bundle, modules)| *bundle == apex && modules.contains(&module))
}

/// Whether `module` is grandfathered into `apex`
pub fn baseline_apex_available(apex: &str, module: &str) -> bool {
    let module = normalize_module_name(module);
    listed(apex, module) || listed(AVAILABLE_TO_ANY_APEX, module)
}
