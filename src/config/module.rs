//! Module declarations read from module definition files
//!
//! Every entry under `modules:` is a [`ModuleDecl`]: common properties plus a
//! `kind` discriminator selecting the kind-specific payload.

use serde::{Deserialize, Serialize};

use super::BundleConfig;
use crate::domain::CompileMultilib;

/// Properties every module kind understands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonProperties {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Bundles this module may be packaged in
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apex_available: Vec<String>,

    #[serde(
        default,
        deserialize_with = "super::string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_sdk_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_multilib: Option<CompileMultilib>,

    /// Modules that must be installed alongside this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Bundles whose contents this test module is allowed to link against
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_for: Vec<String>,

    /// Host tools used to build the module
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,

    /// Installed to the vendor partition
    #[serde(default)]
    pub vendor: bool,

    /// Installed to the product partition
    #[serde(default)]
    pub product_specific: bool,
}

impl CommonProperties {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: None,
            apex_available: Vec::new(),
            min_sdk_version: None,
            compile_multilib: None,
            required: Vec::new(),
            test_for: Vec::new(),
            tools: Vec::new(),
            vendor: false,
            product_specific: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// Native link lists shared by C/C++ module kinds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeLinkProps {
    pub shared_libs: Vec<String>,
    pub static_libs: Vec<String>,
    pub whole_static_libs: Vec<String>,
    pub header_libs: Vec<String>,
    pub runtime_libs: Vec<String>,
}

/// Which link variants a C/C++ library provides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    #[default]
    Both,
    Shared,
    Static,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcLibraryProps {
    #[serde(flatten)]
    pub link: NativeLinkProps,
    pub linkage: Linkage,
    /// Library exposes a stable stub interface
    pub stubs: bool,
    /// Module is itself a stub-only library
    pub stub_only: bool,
    /// Implementation must be installed somewhere when only the stub is linked
    pub implementation_installable: Option<bool>,
    pub vndk: bool,
    pub llndk: bool,
    pub relative_install_path: Option<String>,
    pub stem: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcBinaryProps {
    #[serde(flatten)]
    pub link: NativeLinkProps,
    pub static_executable: bool,
    pub symlinks: Vec<String>,
    pub relative_install_path: Option<String>,
    pub stem: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RustLibraryProps {
    /// Dynamically linked Rust libraries
    pub rustlibs: Vec<String>,
    pub rlibs: Vec<String>,
    pub shared_libs: Vec<String>,
    pub installable: Option<bool>,
    pub stem: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RustBinaryProps {
    pub rustlibs: Vec<String>,
    pub rlibs: Vec<String>,
    pub shared_libs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonBinaryProps {
    /// Only embedded-launcher binaries produce an installable host tool
    pub embedded_launcher: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoBinaryProps {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShBinaryProps {
    pub src: Option<String>,
    pub filename: Option<String>,
    pub sub_dir: Option<String>,
    pub symlinks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JavaLibraryProps {
    pub static_libs: Vec<String>,
    pub libs: Vec<String>,
    pub compile_dex: Option<bool>,
    pub stem: Option<String>,
    pub sdk_version: Option<String>,
    /// prebuilt_etc module holding the permissions XML of an SDK library
    pub permissions_xml: Option<String>,
    /// A dexpreopt profile is generated on the host
    pub profile: bool,
}

impl JavaLibraryProps {
    pub fn compiles_dex(&self) -> bool {
        self.compile_dex.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidAppProps {
    pub privileged: bool,
    pub certificate: Option<String>,
    pub package_name_override: Option<String>,
    pub sdk_version: Option<String>,
    pub jni_libs: Vec<String>,
    pub static_libs: Vec<String>,
    /// android_app_import
    pub prebuilt: bool,
    /// android_test_helper_app
    pub test_helper: bool,
    pub stem: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSetProps {
    pub privileged: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RroProps {
    pub theme: Option<String>,
    pub certificate: Option<String>,
    pub package_name_override: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BpfProps {
    pub srcs: Vec<String>,
    pub sub_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrebuiltEtcProps {
    pub src: Option<String>,
    pub filename: Option<String>,
    pub sub_dir: Option<String>,
    pub base_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatConfigProps {
    pub sub_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesystemProps {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentProps {
    pub contents: Vec<String>,
    pub generate_classpaths_proto: Option<bool>,
    /// Boot image profile installed with a bootclasspath fragment
    pub boot_image_profile: bool,
}

impl FragmentProps {
    pub fn generates_classpaths_proto(&self) -> bool {
        self.generate_classpaths_proto.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApexKeyProps {
    pub public_key: Option<String>,
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateProps {
    /// Path prefix of the `.x509.pem` / `.pk8` pair
    pub certificate: String,
}

/// Kind-specific payload of a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleKind {
    Apex(BundleConfig),
    ApexTest(BundleConfig),
    ApexKey(ApexKeyProps),
    AndroidAppCertificate(CertificateProps),
    CcLibrary(CcLibraryProps),
    CcBinary(CcBinaryProps),
    CcTest(CcBinaryProps),
    RustLibrary(RustLibraryProps),
    RustBinary(RustBinaryProps),
    PythonBinaryHost(PythonBinaryProps),
    BlueprintGoBinary(GoBinaryProps),
    ShBinary(ShBinaryProps),
    JavaLibrary(JavaLibraryProps),
    AndroidApp(AndroidAppProps),
    AndroidAppSet(AppSetProps),
    RuntimeResourceOverlay(RroProps),
    Bpf(BpfProps),
    PrebuiltEtc(PrebuiltEtcProps),
    PlatformCompatConfig(CompatConfigProps),
    Filesystem(FilesystemProps),
    BootclasspathFragment(FragmentProps),
    SystemserverclasspathFragment(FragmentProps),
}

impl ModuleKind {
    /// Module type name as written in module definition files
    pub fn type_name(&self) -> &'static str {
        match self {
            ModuleKind::Apex(_) => "apex",
            ModuleKind::ApexTest(_) => "apex_test",
            ModuleKind::ApexKey(_) => "apex_key",
            ModuleKind::AndroidAppCertificate(_) => "android_app_certificate",
            ModuleKind::CcLibrary(_) => "cc_library",
            ModuleKind::CcBinary(_) => "cc_binary",
            ModuleKind::CcTest(_) => "cc_test",
            ModuleKind::RustLibrary(_) => "rust_library",
            ModuleKind::RustBinary(_) => "rust_binary",
            ModuleKind::PythonBinaryHost(_) => "python_binary_host",
            ModuleKind::BlueprintGoBinary(_) => "blueprint_go_binary",
            ModuleKind::ShBinary(_) => "sh_binary",
            ModuleKind::JavaLibrary(_) => "java_library",
            ModuleKind::AndroidApp(_) => "android_app",
            ModuleKind::AndroidAppSet(_) => "android_app_set",
            ModuleKind::RuntimeResourceOverlay(_) => "runtime_resource_overlay",
            ModuleKind::Bpf(_) => "bpf",
            ModuleKind::PrebuiltEtc(_) => "prebuilt_etc",
            ModuleKind::PlatformCompatConfig(_) => "platform_compat_config",
            ModuleKind::Filesystem(_) => "filesystem",
            ModuleKind::BootclasspathFragment(_) => "bootclasspath_fragment",
            ModuleKind::SystemserverclasspathFragment(_) => "systemserverclasspath_fragment",
        }
    }
}

/// One declared module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDecl {
    #[serde(flatten)]
    pub common: CommonProperties,
    #[serde(flatten)]
    pub kind: ModuleKind,
}

impl ModuleDecl {
    pub fn new(name: impl Into<String>, kind: ModuleKind) -> Self {
        Self {
            common: CommonProperties::new(name),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.common.name
    }

    /// Bundle configuration and test flag when this module is a bundle
    pub fn bundle(&self) -> Option<(&BundleConfig, bool)> {
        match &self.kind {
            ModuleKind::Apex(config) => Some((config, false)),
            ModuleKind::ApexTest(config) => Some((config, true)),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cc_library() {
        let yaml = r"
kind: cc_library
name: libfoo
shared_libs: [libbar]
stubs: true
apex_available: [com.x.y]
min_sdk_version: 29
";
        let decl: ModuleDecl = serde_yaml::from_str(yaml).expect("valid module");
        assert_eq!(decl.name(), "libfoo");
        assert_eq!(decl.common.apex_available, vec!["com.x.y".to_string()]);
        assert_eq!(decl.common.min_sdk_version.as_deref(), Some("29"));
        match decl.kind {
            ModuleKind::CcLibrary(props) => {
                assert!(props.stubs);
                assert_eq!(props.link.shared_libs, vec!["libbar".to_string()]);
            }
            other => panic!("unexpected kind {}", other.type_name()),
        }
    }

    #[test]
    fn test_parse_bundle() {
        let yaml = r"
kind: apex_test
name: com.x.y
key: com.x.y.key
tests: [footest]
";
        let decl: ModuleDecl = serde_yaml::from_str(yaml).expect("valid module");
        let (config, is_test) = decl.bundle().expect("bundle");
        assert!(is_test);
        assert_eq!(config.tests, vec!["footest".to_string()]);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let yaml = "kind: cc_object\nname: crtbegin\n";
        assert!(serde_yaml::from_str::<ModuleDecl>(yaml).is_err());
    }

    #[test]
    fn test_defaults() {
        let decl: ModuleDecl =
            serde_yaml::from_str("kind: java_library\nname: foo\n").expect("valid module");
        assert!(decl.common.is_enabled());
        match decl.kind {
            ModuleKind::JavaLibrary(props) => assert!(props.compiles_dex()),
            other => panic!("unexpected kind {}", other.type_name()),
        }
    }
}
