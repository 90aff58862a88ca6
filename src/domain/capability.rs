//! Per-kind capability surface of declared modules
//!
//! Every question the pipeline asks about a target ("does it expose stubs",
//! "where does its output land", "does this edge stay inside the container")
//! is answered here, by one `match` on [`ModuleKind`]. Adding a module kind
//! means adding arms to this file and nowhere else.

use wax::{CandidatePath, Glob, Pattern};

use super::{ApiLevel, CompileMultilib, DependencyTag, LinkKind};
use crate::config::{Linkage, ModuleDecl, ModuleKind};

/// `apex_available` value making a module available to the platform
pub const AVAILABLE_TO_PLATFORM: &str = "//apex_available:platform";

/// `apex_available` value making a module available to every bundle
pub const AVAILABLE_TO_ANY_APEX: &str = "//apex_available:anyapex";

/// Libraries the platform provides at bootstrap time
const BOOTSTRAP_LIBS: &[&str] = &["libc", "libm", "libdl", "libdl_android", "linker"];

/// Whether a module is installed to the bootstrap (bionic) location
pub fn is_bootstrap(name: &str) -> bool {
    name == "linkerconfig" || BOOTSTRAP_LIBS.contains(&name)
}

/// How registration creates variants of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantPolicy {
    /// One architecture-less `common` variant
    Common,
    /// One variant per target selected by the compile_multilib setting
    Arch(CompileMultilib),
    /// A `common` variant plus per-target variants
    CommonAndArch(CompileMultilib),
}

/// How a module's intrinsic link edge picks the variant of its dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTarget {
    /// The dependency variant with the same target as the depending variant
    Same,
    /// The architecture-less variant
    Common,
    /// The variant for the primary target
    Primary,
    /// Whichever variant exists first
    Any,
}

/// One intrinsic link edge declared by a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEdge<'a> {
    pub dependency: &'a str,
    pub kind: LinkKind,
    pub target: EdgeTarget,
}

fn edges<'a>(
    out: &mut Vec<LinkEdge<'a>>,
    names: &'a [String],
    kind: LinkKind,
    target: EdgeTarget,
) {
    out.extend(names.iter().map(|dependency| LinkEdge {
        dependency: dependency.as_str(),
        kind,
        target,
    }));
}

fn matches_available(entry: &str, what: &str) -> bool {
    if entry == what {
        return true;
    }
    if what == AVAILABLE_TO_PLATFORM {
        return false;
    }
    if entry == AVAILABLE_TO_ANY_APEX {
        return true;
    }
    if entry.ends_with('*') {
        let candidate = CandidatePath::from(what);
        return Glob::new(entry).is_ok_and(|glob| glob.matched(&candidate).is_some());
    }
    false
}

/// Capabilities the dependency pipeline consumes from compiled targets
pub trait TargetCapabilities {
    /// The library exposes a stable stub interface
    fn has_stubs(&self) -> bool;

    /// The module is itself a stub-only library
    fn is_stubs(&self) -> bool;

    /// The implementation behind a stub must be installed somewhere
    fn stubs_implementation_required(&self) -> bool;

    fn is_vndk(&self) -> bool;
    fn is_llndk(&self) -> bool;

    /// Whether the module can be split into per-bundle variants
    fn can_have_apex_variants(&self) -> bool;

    /// Whether the module produces a file that may be installed into a bundle
    fn installable_to_apex(&self) -> bool;

    fn is_static_executable(&self) -> bool;

    /// Whether the module declares itself available to `what`
    fn available_for(&self, what: &str) -> bool;

    /// Declared minimum API level, `None` when unset
    ///
    /// # Errors
    ///
    /// Returns a message when the declared value cannot be parsed.
    fn min_sdk(&self) -> std::result::Result<Option<ApiLevel>, String>;

    /// File name of the module's primary output
    fn stem(&self) -> String;

    /// Whether the dependency `child` reached over `tag` stays in the same container
    fn depends_in_same_container(&self, child: &ModuleDecl, tag: DependencyTag) -> bool;

    /// Intrinsic link edges the module declares
    fn link_edges(&self) -> Vec<LinkEdge<'_>>;

    fn variant_policy(&self) -> VariantPolicy;
}

impl TargetCapabilities for ModuleDecl {
    fn has_stubs(&self) -> bool {
        matches!(&self.kind, ModuleKind::CcLibrary(props) if props.stubs)
    }

    fn is_stubs(&self) -> bool {
        matches!(&self.kind, ModuleKind::CcLibrary(props) if props.stub_only)
    }

    fn stubs_implementation_required(&self) -> bool {
        match &self.kind {
            ModuleKind::CcLibrary(props) => props.implementation_installable.unwrap_or(true),
            _ => false,
        }
    }

    fn is_vndk(&self) -> bool {
        matches!(&self.kind, ModuleKind::CcLibrary(props) if props.vndk)
    }

    fn is_llndk(&self) -> bool {
        matches!(&self.kind, ModuleKind::CcLibrary(props) if props.llndk)
    }

    fn can_have_apex_variants(&self) -> bool {
        matches!(
            &self.kind,
            ModuleKind::CcLibrary(_)
                | ModuleKind::CcBinary(_)
                | ModuleKind::CcTest(_)
                | ModuleKind::RustLibrary(_)
                | ModuleKind::RustBinary(_)
                | ModuleKind::PythonBinaryHost(_)
                | ModuleKind::ShBinary(_)
                | ModuleKind::JavaLibrary(_)
                | ModuleKind::AndroidApp(_)
                | ModuleKind::AndroidAppSet(_)
                | ModuleKind::PrebuiltEtc(_)
                | ModuleKind::BootclasspathFragment(_)
                | ModuleKind::SystemserverclasspathFragment(_)
        )
    }

    fn installable_to_apex(&self) -> bool {
        match &self.kind {
            ModuleKind::CcLibrary(props) => props.linkage != Linkage::Static && !props.stub_only,
            ModuleKind::CcBinary(_) | ModuleKind::CcTest(_) | ModuleKind::RustBinary(_) => true,
            ModuleKind::RustLibrary(props) => props.installable.unwrap_or(true),
            _ => false,
        }
    }

    fn is_static_executable(&self) -> bool {
        match &self.kind {
            ModuleKind::CcBinary(props) | ModuleKind::CcTest(props) => props.static_executable,
            _ => false,
        }
    }

    fn available_for(&self, what: &str) -> bool {
        let declared = &self.common.apex_available;
        if declared.is_empty() {
            return what == AVAILABLE_TO_PLATFORM;
        }
        declared.iter().any(|entry| matches_available(entry, what))
    }

    fn min_sdk(&self) -> std::result::Result<Option<ApiLevel>, String> {
        self.common
            .min_sdk_version
            .as_deref()
            .map(ApiLevel::parse)
            .transpose()
    }

    fn stem(&self) -> String {
        let name = self.name();
        match &self.kind {
            ModuleKind::CcLibrary(props) => {
                format!("{}.so", props.stem.as_deref().unwrap_or(name))
            }
            ModuleKind::RustLibrary(props) => {
                format!("{}.so", props.stem.as_deref().unwrap_or(name))
            }
            ModuleKind::CcBinary(props) | ModuleKind::CcTest(props) => {
                props.stem.clone().unwrap_or_else(|| name.to_string())
            }
            ModuleKind::JavaLibrary(props) => {
                props.stem.clone().unwrap_or_else(|| name.to_string())
            }
            ModuleKind::AndroidApp(props) => {
                format!("{}.apk", props.stem.as_deref().unwrap_or(name))
            }
            ModuleKind::AndroidAppSet(_) => format!("{name}.apks"),
            ModuleKind::RuntimeResourceOverlay(_) => format!("{name}.apk"),
            ModuleKind::ShBinary(props) => props
                .filename
                .clone()
                .or_else(|| props.src.as_deref().map(base_name))
                .unwrap_or_else(|| name.to_string()),
            ModuleKind::PrebuiltEtc(props) => props
                .filename
                .clone()
                .or_else(|| props.src.as_deref().map(base_name))
                .unwrap_or_else(|| name.to_string()),
            ModuleKind::PlatformCompatConfig(_) => format!("{name}.xml"),
            ModuleKind::Filesystem(_) => format!("{name}.img"),
            _ => name.to_string(),
        }
    }

    fn depends_in_same_container(&self, child: &ModuleDecl, tag: DependencyTag) -> bool {
        if tag.excluded_from_contents() {
            return false;
        }
        let link = tag.link();
        match &self.kind {
            ModuleKind::Apex(_) | ModuleKind::ApexTest(_) => true,
            ModuleKind::CcLibrary(_)
            | ModuleKind::CcBinary(_)
            | ModuleKind::CcTest(_)
            | ModuleKind::RustLibrary(_)
            | ModuleKind::RustBinary(_) => {
                let shared = link.is_some_and(LinkKind::is_shared);
                if shared && child.has_stubs() {
                    return false;
                }
                if child.is_llndk() {
                    return false;
                }
                let static_only = matches!(
                    &self.kind,
                    ModuleKind::CcLibrary(props) if props.linkage == Linkage::Static
                );
                !(static_only && link == Some(LinkKind::Shared))
            }
            ModuleKind::JavaLibrary(_) => {
                matches!(link, Some(LinkKind::JavaStatic | LinkKind::XmlPermissions))
            }
            ModuleKind::AndroidApp(_) => {
                matches!(link, Some(LinkKind::Jni | LinkKind::JavaStatic))
            }
            ModuleKind::BootclasspathFragment(_) => {
                link == Some(LinkKind::BootclasspathContent)
            }
            ModuleKind::SystemserverclasspathFragment(_) => {
                link == Some(LinkKind::SystemServerContent)
            }
            _ => true,
        }
    }

    fn link_edges(&self) -> Vec<LinkEdge<'_>> {
        let mut out = Vec::new();
        match &self.kind {
            ModuleKind::CcLibrary(props) => push_native_links(&mut out, &props.link),
            ModuleKind::CcBinary(props) | ModuleKind::CcTest(props) => {
                push_native_links(&mut out, &props.link);
            }
            ModuleKind::RustLibrary(props) => {
                edges(&mut out, &props.rustlibs, LinkKind::Dylib, EdgeTarget::Same);
                edges(&mut out, &props.rlibs, LinkKind::Rlib, EdgeTarget::Same);
                edges(&mut out, &props.shared_libs, LinkKind::Shared, EdgeTarget::Same);
            }
            ModuleKind::RustBinary(props) => {
                edges(&mut out, &props.rustlibs, LinkKind::Dylib, EdgeTarget::Same);
                edges(&mut out, &props.rlibs, LinkKind::Rlib, EdgeTarget::Same);
                edges(&mut out, &props.shared_libs, LinkKind::Shared, EdgeTarget::Same);
            }
            ModuleKind::JavaLibrary(props) => {
                edges(&mut out, &props.static_libs, LinkKind::JavaStatic, EdgeTarget::Common);
                edges(&mut out, &props.libs, LinkKind::JavaLibs, EdgeTarget::Common);
                if let Some(xml) = &props.permissions_xml {
                    out.push(LinkEdge {
                        dependency: xml.as_str(),
                        kind: LinkKind::XmlPermissions,
                        target: EdgeTarget::Primary,
                    });
                }
            }
            ModuleKind::AndroidApp(props) => {
                edges(&mut out, &props.jni_libs, LinkKind::Jni, EdgeTarget::Primary);
                edges(&mut out, &props.static_libs, LinkKind::JavaStatic, EdgeTarget::Common);
            }
            ModuleKind::BootclasspathFragment(props) => {
                edges(
                    &mut out,
                    &props.contents,
                    LinkKind::BootclasspathContent,
                    EdgeTarget::Common,
                );
            }
            ModuleKind::SystemserverclasspathFragment(props) => {
                edges(
                    &mut out,
                    &props.contents,
                    LinkKind::SystemServerContent,
                    EdgeTarget::Common,
                );
            }
            _ => {}
        }
        edges(&mut out, &self.common.tools, LinkKind::Tool, EdgeTarget::Any);
        out
    }

    fn variant_policy(&self) -> VariantPolicy {
        let declared = self.common.compile_multilib;
        match &self.kind {
            ModuleKind::CcLibrary(_)
            | ModuleKind::RustLibrary(_)
            | ModuleKind::CcTest(_)
            | ModuleKind::PrebuiltEtc(_) => {
                VariantPolicy::Arch(declared.unwrap_or(CompileMultilib::Both))
            }
            ModuleKind::CcBinary(_)
            | ModuleKind::RustBinary(_)
            | ModuleKind::ShBinary(_)
            | ModuleKind::PythonBinaryHost(_)
            | ModuleKind::BlueprintGoBinary(_) => {
                VariantPolicy::Arch(declared.unwrap_or(CompileMultilib::First))
            }
            ModuleKind::Filesystem(_) => {
                VariantPolicy::CommonAndArch(declared.unwrap_or(CompileMultilib::First))
            }
            _ => VariantPolicy::Common,
        }
    }
}

fn push_native_links<'a>(out: &mut Vec<LinkEdge<'a>>, link: &'a crate::config::NativeLinkProps) {
    edges(out, &link.shared_libs, LinkKind::Shared, EdgeTarget::Same);
    edges(out, &link.runtime_libs, LinkKind::Runtime, EdgeTarget::Same);
    edges(out, &link.static_libs, LinkKind::Static, EdgeTarget::Same);
    edges(out, &link.whole_static_libs, LinkKind::Static, EdgeTarget::Same);
    edges(out, &link.header_libs, LinkKind::Header, EdgeTarget::Same);
}

fn base_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}
