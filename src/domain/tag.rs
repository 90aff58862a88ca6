//! Dependency tags
//!
//! Every edge in the module graph carries exactly one [`DependencyTag`]. The tag
//! is fixed when the edge is declared and decides how later passes treat the
//! edge:
//!
//! ```text
//! bundle ──ApexDepTag──▶ direct member      (payload / auxiliary)
//!   member ──LinkKind──▶ indirect member    (original build semantics)
//! test ──TestFor──▶ bundle                  (back-reference, never payload)
//! ```

use std::fmt;

use serde::Serialize;

/// Tag of an edge declared by a bundle on one of its direct dependencies
///
/// Fragment tags name source modules only; prebuilt fragments are not part of
/// the declared graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApexDepTag {
    AndroidApp,
    Bpf,
    Certificate,
    Dcla,
    Executable,
    Filesystem,
    BootclasspathFragment,
    SystemServerClasspathFragment,
    CompatConfig,
    JavaLib,
    JniLib,
    Key,
    Prebuilt,
    Rro,
    SharedLib,
    ShBinary,
    Test,
}

impl ApexDepTag {
    pub fn name(self) -> &'static str {
        match self {
            ApexDepTag::AndroidApp => "androidApp",
            ApexDepTag::Bpf => "bpf",
            ApexDepTag::Certificate => "certificate",
            ApexDepTag::Dcla => "dcla",
            ApexDepTag::Executable => "executable",
            ApexDepTag::Filesystem => "fs",
            ApexDepTag::BootclasspathFragment => "bootclasspathFragment",
            ApexDepTag::SystemServerClasspathFragment => "systemserverclasspathFragment",
            ApexDepTag::CompatConfig => "compatConfig",
            ApexDepTag::JavaLib => "javaLib",
            ApexDepTag::JniLib => "jniLib",
            ApexDepTag::Key => "key",
            ApexDepTag::Prebuilt => "prebuilt",
            ApexDepTag::Rro => "rro",
            ApexDepTag::SharedLib => "sharedLib",
            ApexDepTag::ShBinary => "shBinary",
            ApexDepTag::Test => "test",
        }
    }

    /// Whether the dependency contributes files to the bundle payload
    pub fn payload(self) -> bool {
        !matches!(
            self,
            ApexDepTag::Certificate | ApexDepTag::Dcla | ApexDepTag::Key
        )
    }

    /// Bundle property the dependency was declared through
    pub fn property(self) -> &'static str {
        match self {
            ApexDepTag::AndroidApp => "apps",
            ApexDepTag::Bpf => "bpfs",
            ApexDepTag::Certificate => "certificate",
            ApexDepTag::Dcla => "trim_against",
            ApexDepTag::Executable => "binaries",
            ApexDepTag::Filesystem => "filesystems",
            ApexDepTag::BootclasspathFragment => "bootclasspath_fragments",
            ApexDepTag::SystemServerClasspathFragment => "systemserverclasspath_fragments",
            ApexDepTag::CompatConfig => "compat_configs",
            ApexDepTag::JavaLib => "java_libs",
            ApexDepTag::JniLib => "jni_libs",
            ApexDepTag::Key => "key",
            ApexDepTag::Prebuilt => "prebuilts",
            ApexDepTag::Rro => "rros",
            ApexDepTag::SharedLib => "native_shared_libs",
            ApexDepTag::ShBinary => "sh_binaries",
            ApexDepTag::Test => "tests",
        }
    }
}

/// Link relationship of an edge between two ordinary modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Shared,
    Runtime,
    Static,
    Header,
    Dylib,
    Rlib,
    Jni,
    JavaStatic,
    JavaLibs,
    XmlPermissions,
    BootclasspathContent,
    SystemServerContent,
    /// Host tool used while building; never part of a bundle
    Tool,
}

impl LinkKind {
    pub fn name(self) -> &'static str {
        match self {
            LinkKind::Shared => "shared",
            LinkKind::Runtime => "runtime",
            LinkKind::Static => "static",
            LinkKind::Header => "header",
            LinkKind::Dylib => "dylib",
            LinkKind::Rlib => "rlib",
            LinkKind::Jni => "jni",
            LinkKind::JavaStatic => "java_static",
            LinkKind::JavaLibs => "java_libs",
            LinkKind::XmlPermissions => "xml_permissions",
            LinkKind::BootclasspathContent => "bootclasspath_content",
            LinkKind::SystemServerContent => "systemserver_content",
            LinkKind::Tool => "tool",
        }
    }

    /// Shared or runtime-only linkage against a native library
    pub fn is_shared(self) -> bool {
        matches!(self, LinkKind::Shared | LinkKind::Runtime)
    }
}

/// Immutable label of one graph edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyTag {
    Apex(ApexDepTag),
    Link(LinkKind),
    TestFor,
}

impl DependencyTag {
    /// Whether the child needs a bundle variant for every bundle variant of the parent
    pub fn always_requires_apex_variant(self) -> bool {
        matches!(
            self,
            DependencyTag::Link(LinkKind::BootclasspathContent | LinkKind::SystemServerContent)
        )
    }

    /// Edges that never contribute to any bundle's contents
    pub fn excluded_from_contents(self) -> bool {
        matches!(self, DependencyTag::TestFor | DependencyTag::Link(LinkKind::Tool))
    }

    /// Whether the edge may contribute files to the payload
    pub fn is_payload(self) -> bool {
        match self {
            DependencyTag::Apex(tag) => tag.payload(),
            DependencyTag::Link(_) => true,
            DependencyTag::TestFor => false,
        }
    }

    pub fn apex(self) -> Option<ApexDepTag> {
        match self {
            DependencyTag::Apex(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn link(self) -> Option<LinkKind> {
        match self {
            DependencyTag::Link(kind) => Some(kind),
            _ => None,
        }
    }
}

impl fmt::Display for DependencyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyTag::Apex(tag) => write!(f, "apex.{}", tag.name()),
            DependencyTag::Link(kind) => f.write_str(kind.name()),
            DependencyTag::TestFor => f.write_str("testFor"),
        }
    }
}
