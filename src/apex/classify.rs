//! Content classification
//!
//! Second walk over a bundle, this time over edges that already point at the
//! bundle's own variants. Direct edges dispatch on the bundle tag they were
//! declared with; indirect edges keep their build semantics and dispatch on
//! the link relationship:
//!
//! ```text
//! bundle ──apex.sharedLib──▶ libfoo      -> lib64/libfoo.so
//!          libfoo ──shared──▶ libbar     -> lib64/libbar.so (transitive)
//!          libfoo ──shared──▶ libstub    -> require libstub.so, not packaged
//! ```

use tracing::debug;

use super::context::BundleContext;
use super::file::{ApexFile, FileClass, base_name, join_path};
use super::signing::{Certificate, KeyPair, resolve_certificate};
use crate::config::ModuleKind;
use crate::domain::{ApexDepTag, LinkKind, Multilib, TargetCapabilities, is_bootstrap};
use crate::error::{ApexError, module_error, property_error};
use crate::graph::{NodeId, Step, walk_deps};

/// Everything the classification walk produces for one bundle
#[derive(Debug, Default)]
pub struct Classified {
    /// Unnormalized file records in discovery order
    pub files: Vec<ApexFile>,
    pub provide_native_libs: Vec<String>,
    pub require_native_libs: Vec<String>,
    /// Implementations that must be installed on the platform
    pub make_modules_to_install: Vec<String>,
    pub key: Option<KeyPair>,
    pub container_certificate: Option<Certificate>,
    pub errors: Vec<ApexError>,
}

/// Classify every reachable dependency of the bundle
pub fn classify(ctx: &BundleContext<'_>) -> Classified {
    let mut visitor = Visitor {
        ctx,
        out: Classified::default(),
    };
    walk_deps(ctx.graph, ctx.bundle.node, |step| visitor.visit(step));

    let mut out = visitor.out;
    if out.key.is_none() {
        out.errors.push(property_error(
            ctx.name(),
            "key",
            format!(
                "private_key for {:?} could not be found",
                ctx.config.key.as_deref().unwrap_or_default()
            ),
        ));
    }
    if out.container_certificate.is_none() {
        match resolve_certificate(
            ctx.graph,
            ctx.product,
            ctx.name(),
            ctx.config.certificate.as_deref(),
        ) {
            Ok(cert) => out.container_certificate = Some(cert),
            Err(err) => out.errors.push(err),
        }
    }

    out.provide_native_libs.sort();
    out.provide_native_libs.dedup();
    out.require_native_libs.sort();
    out.require_native_libs.dedup();
    let provided = out.provide_native_libs.clone();
    out.require_native_libs.retain(|lib| !provided.contains(lib));
    out.make_modules_to_install.sort();
    out.make_modules_to_install.dedup();
    out
}

/// Build id characters allowed in an app directory suffix
fn valid_build_id(build_id: &str) -> bool {
    build_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn strip_extension(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

struct Visitor<'c, 'a> {
    ctx: &'c BundleContext<'a>,
    out: Classified,
}

impl Visitor<'_, '_> {
    fn visit(&mut self, step: &Step<'_>) -> bool {
        if step.tag.excluded_from_contents() {
            return false;
        }
        let graph = self.ctx.graph;
        let child = graph.decl(step.child);
        if !child.common.is_enabled() {
            return false;
        }
        let descend = if step.is_direct() {
            step.tag.apex().is_some_and(|tag| self.direct(step, tag))
        } else {
            step.tag.link().is_some_and(|kind| self.indirect(step, kind))
        };
        debug!(
            bundle = %self.ctx.name(),
            module = %child.name(),
            tag = %step.tag,
            descend,
            "classified"
        );
        descend
    }

    fn bundle_error(&mut self, property: &str, message: String) {
        self.out
            .errors
            .push(property_error(self.ctx.name(), property, message));
    }

    /// `out/<module>/<variation>/<file>`
    fn built(&self, node: NodeId, file: &str) -> String {
        let graph = self.ctx.graph;
        join_path(&["out", graph.name(node), &graph.variation(node).to_string(), file])
    }

    fn multilib(&self, node: NodeId) -> Option<Multilib> {
        self.ctx
            .graph
            .variation(node)
            .target
            .map(|target| target.arch.multilib())
    }

    fn file(&self, node: NodeId, file: &str, dir: &str, class: FileClass) -> ApexFile {
        self.file_at(node, self.built(node, file), dir, class)
    }

    fn file_at(&self, node: NodeId, built: String, dir: &str, class: FileClass) -> ApexFile {
        let decl = self.ctx.graph.decl(node);
        let mut apex_file = ApexFile::new(decl.name(), built, dir, class);
        apex_file.required = decl.common.required.clone();
        apex_file.available_to_platform =
            self.ctx.prepared.platform.available_to_platform(decl.name());
        apex_file
    }

    fn native_lib(&self, node: NodeId) -> ApexFile {
        let decl = self.ctx.graph.decl(node);
        let multilib = self.multilib(node);
        let mut dir = vec![multilib.map_or("lib", Multilib::lib_dir)];
        if !self.ctx.is_host()
            && !self.ctx.config.ignore_system_library_special_case
            && is_bootstrap(decl.name())
        {
            dir.push("bionic");
        }
        if let ModuleKind::CcLibrary(props) = &decl.kind {
            if let Some(relative) = &props.relative_install_path {
                dir.push(relative.as_str());
            }
        }
        let mut file = self.file(node, &decl.stem(), &join_path(&dir), FileClass::NativeSharedLib);
        file.multilib = multilib;
        file
    }

    fn executable(&self, node: NodeId, class: FileClass) -> ApexFile {
        let decl = self.ctx.graph.decl(node);
        let (relative, symlinks) = match &decl.kind {
            ModuleKind::CcBinary(props) | ModuleKind::CcTest(props) => {
                (props.relative_install_path.as_deref(), props.symlinks.clone())
            }
            _ => (None, Vec::new()),
        };
        let dir = join_path(&["bin", relative.unwrap_or_default()]);
        let mut file = self.file(node, &decl.stem(), &dir, class);
        file.symlinks = symlinks;
        file.multilib = self.multilib(node);
        file
    }

    fn java_lib(&self, node: NodeId, built: String) -> ApexFile {
        let decl = self.ctx.graph.decl(node);
        let mut file = self.file_at(node, built, "javalib", FileClass::JavaSharedLib);
        file.custom_stem = Some(format!("{}.jar", decl.stem()));
        file
    }

    fn dex_jar(&self, node: NodeId) -> String {
        let name = self.ctx.graph.name(node);
        self.built(node, &format!("dex/{name}.jar"))
    }

    fn profile(&self, node: NodeId) -> ApexFile {
        let decl = self.ctx.graph.decl(node);
        let mut file = ApexFile::new(
            format!("{}-profile", decl.name()),
            self.built(node, "profile.prof"),
            "javalib",
            FileClass::Etc,
        );
        file.custom_stem = Some(format!("{}.jar.prof", decl.stem()));
        file
    }

    fn app_dir(&self, privileged: bool, apk_name: &str) -> Option<String> {
        let build_id = &self.ctx.product.build_id;
        if !valid_build_id(build_id) {
            return None;
        }
        let root = if privileged { "priv-app" } else { "app" };
        Some(join_path(&[root, &format!("{apk_name}@{build_id}")]))
    }

    fn invalid_build_id(&mut self) {
        self.out.errors.push(module_error(
            self.ctx.name(),
            format!(
                "Unable to use build id {} as filename suffix, valid characters are [a-z A-Z 0-9 _ . -].",
                self.ctx.product.build_id
            ),
        ));
    }

    fn certificate(&mut self, owner: &str, value: Option<&str>) -> Option<Certificate> {
        match resolve_certificate(self.ctx.graph, self.ctx.product, owner, value) {
            Ok(cert) => Some(cert),
            Err(err) => {
                self.out.errors.push(err);
                None
            }
        }
    }

    fn direct(&mut self, step: &Step<'_>, tag: ApexDepTag) -> bool {
        let graph = self.ctx.graph;
        let node = step.child;
        let child = graph.decl(node);
        let name = child.name().to_string();
        let property = tag.property();

        match tag {
            ApexDepTag::SharedLib | ApexDepTag::JniLib => match &child.kind {
                ModuleKind::CcLibrary(_) => {
                    let mut file = self.native_lib(node);
                    file.is_jni = tag == ApexDepTag::JniLib;
                    if child.has_stubs() && !is_bootstrap(&name) {
                        self.out.provide_native_libs.push(file.stem().to_string());
                    }
                    self.out.files.push(file);
                    true
                }
                ModuleKind::RustLibrary(_) => {
                    let file = self.native_lib(node);
                    self.out.files.push(file);
                    true
                }
                _ => {
                    self.bundle_error(
                        property,
                        format!("{name:?} is not a cc_library or cc_library_shared module"),
                    );
                    false
                }
            },
            ApexDepTag::Executable => match &child.kind {
                ModuleKind::CcBinary(_) | ModuleKind::CcTest(_) | ModuleKind::RustBinary(_) => {
                    let file = self.executable(node, FileClass::NativeExecutable);
                    self.out.files.push(file);
                    true
                }
                ModuleKind::PythonBinaryHost(props) => {
                    if props.embedded_launcher {
                        let file = self.file(node, &name, "bin", FileClass::PyBinary);
                        self.out.files.push(file);
                    }
                    false
                }
                ModuleKind::BlueprintGoBinary(_) => {
                    if self.ctx.is_host() {
                        let file = self.file(node, &name, "bin", FileClass::GoBinary);
                        self.out.files.push(file);
                    }
                    false
                }
                _ => {
                    self.bundle_error(
                        property,
                        format!(
                            "{name:?} is neither cc_binary, rust_binary, (embedded) py_binary, (host) blueprint_go_binary, nor (host) bootstrap_go_binary"
                        ),
                    );
                    false
                }
            },
            ApexDepTag::ShBinary => {
                if let ModuleKind::ShBinary(props) = &child.kind {
                    let dir = join_path(&["bin", props.sub_dir.as_deref().unwrap_or_default()]);
                    let mut file = self.file(node, &child.stem(), &dir, FileClass::ShBinary);
                    file.symlinks = props.symlinks.clone();
                    self.out.files.push(file);
                } else {
                    self.bundle_error(property, format!("{name:?} is not a sh_binary module"));
                }
                false
            }
            ApexDepTag::BootclasspathFragment => {
                let ModuleKind::BootclasspathFragment(props) = &child.kind else {
                    self.bundle_error(
                        property,
                        format!("{name:?} is not a bootclasspath_fragment module"),
                    );
                    return false;
                };
                if props.generates_classpaths_proto() {
                    let file = self.file(
                        node,
                        "bootclasspath.pb",
                        "etc/classpaths",
                        FileClass::Etc,
                    );
                    self.out.files.push(file);
                }
                if props.boot_image_profile {
                    let mut file = ApexFile::new(
                        "boot-image-profile",
                        join_path(&[
                            "out",
                            self.ctx.name(),
                            "boot_image_profile/etc/boot-image.prof",
                        ]),
                        "etc",
                        FileClass::Etc,
                    );
                    file.custom_stem = Some("boot-image.prof".to_string());
                    self.out.files.push(file);
                }
                true
            }
            ApexDepTag::SystemServerClasspathFragment => {
                let ModuleKind::SystemserverclasspathFragment(props) = &child.kind else {
                    self.bundle_error(
                        property,
                        format!("{name:?} is not a systemserverclasspath_fragment module"),
                    );
                    return false;
                };
                if props.generates_classpaths_proto() {
                    let file = self.file(
                        node,
                        "systemserverclasspath.pb",
                        "etc/classpaths",
                        FileClass::Etc,
                    );
                    self.out.files.push(file);
                }
                true
            }
            ApexDepTag::JavaLib => match &child.kind {
                ModuleKind::JavaLibrary(props) if !props.compiles_dex() => {
                    self.bundle_error(
                        property,
                        format!("{name:?} is not configured to be compiled into dex"),
                    );
                    false
                }
                ModuleKind::JavaLibrary(_) => {
                    let file = self.java_lib(node, self.dex_jar(node));
                    self.out.files.push(file);
                    true
                }
                other => {
                    self.bundle_error(
                        property,
                        format!("{name:?} of type {:?} is not supported", other.type_name()),
                    );
                    false
                }
            },
            ApexDepTag::AndroidApp => match &child.kind {
                ModuleKind::AndroidApp(props) => {
                    let apk_name = props.stem.clone().unwrap_or_else(|| name.clone());
                    let Some(dir) = self.app_dir(props.privileged, &apk_name) else {
                        self.invalid_build_id();
                        return false;
                    };
                    let mut file = self.file(node, &child.stem(), &dir, FileClass::App);
                    file.certificate = self.certificate(&name, props.certificate.as_deref());
                    file.overridden_package_name = props.package_name_override.clone();
                    self.out.files.push(file);
                    !props.prebuilt && !props.test_helper
                }
                ModuleKind::AndroidAppSet(props) => {
                    let Some(dir) = self.app_dir(props.privileged, &name) else {
                        self.invalid_build_id();
                        return false;
                    };
                    let mut file = self.file(node, &child.stem(), &dir, FileClass::AppSet);
                    file.certificate = Some(Certificate::presigned());
                    self.out.files.push(file);
                    false
                }
                _ => {
                    self.bundle_error(property, format!("{name:?} is not an android_app module"));
                    false
                }
            },
            ApexDepTag::Rro => {
                if let ModuleKind::RuntimeResourceOverlay(props) = &child.kind {
                    let dir = join_path(&["overlay", props.theme.as_deref().unwrap_or_default()]);
                    let mut file = self.file(node, &child.stem(), &dir, FileClass::App);
                    file.certificate = self.certificate(&name, props.certificate.as_deref());
                    file.overridden_package_name = props.package_name_override.clone();
                    self.out.files.push(file);
                } else {
                    self.bundle_error(
                        property,
                        format!("{name:?} is not an runtime_resource_overlay module"),
                    );
                }
                false
            }
            ApexDepTag::Bpf => {
                if let ModuleKind::Bpf(props) = &child.kind {
                    let dir = join_path(&["etc/bpf", props.sub_dir.as_deref().unwrap_or_default()]);
                    for src in &props.srcs {
                        let object = format!("{}.o", strip_extension(base_name(src)));
                        let file = self.file(node, &object, &dir, FileClass::Etc);
                        self.out.files.push(file);
                    }
                } else {
                    self.bundle_error(property, format!("{name:?} is not a bpf module"));
                }
                false
            }
            ApexDepTag::Filesystem => {
                if let ModuleKind::Filesystem(_) = &child.kind {
                    let file = self.file(node, &child.stem(), "etc/fs", FileClass::Etc);
                    self.out.files.push(file);
                } else {
                    self.bundle_error(property, format!("{name:?} is not a filesystem module"));
                }
                false
            }
            ApexDepTag::Prebuilt => {
                if let ModuleKind::PrebuiltEtc(_) = &child.kind {
                    let file = self.prebuilt_etc(node);
                    self.out.files.push(file);
                } else {
                    self.bundle_error(property, format!("{name:?} is not a prebuilt_etc module"));
                }
                false
            }
            ApexDepTag::CompatConfig => {
                if let ModuleKind::PlatformCompatConfig(props) = &child.kind {
                    let dir = join_path(&[
                        "etc",
                        props.sub_dir.as_deref().unwrap_or("compatconfig"),
                    ]);
                    let file = self.file(node, &child.stem(), &dir, FileClass::Etc);
                    self.out.files.push(file);
                } else {
                    self.bundle_error(
                        property,
                        format!("{name:?} is not a platform_compat_config module"),
                    );
                }
                false
            }
            ApexDepTag::Test => match &child.kind {
                ModuleKind::CcTest(_) | ModuleKind::CcBinary(_) => {
                    let file = self.executable(node, FileClass::NativeTest);
                    self.out.files.push(file);
                    true
                }
                _ => {
                    self.bundle_error(property, format!("{name:?} is not a cc module"));
                    false
                }
            },
            ApexDepTag::Key => {
                if let ModuleKind::ApexKey(props) = &child.kind {
                    self.out.key = Some(KeyPair::from_apex_key(&name, props));
                } else {
                    self.bundle_error(property, format!("{name:?} is not an apex_key module"));
                }
                false
            }
            ApexDepTag::Certificate => {
                if let ModuleKind::AndroidAppCertificate(props) = &child.kind {
                    self.out.container_certificate =
                        Some(Certificate::from_prefix(&props.certificate));
                } else {
                    self.out.errors.push(module_error(
                        self.ctx.name(),
                        format!(
                            "certificate dependency {name:?} must be an android_app_certificate module"
                        ),
                    ));
                }
                false
            }
            ApexDepTag::Dcla => false,
        }
    }

    fn prebuilt_etc(&self, node: NodeId) -> ApexFile {
        let decl = self.ctx.graph.decl(node);
        let dir = match &decl.kind {
            ModuleKind::PrebuiltEtc(props) => join_path(&[
                props.base_dir.as_deref().unwrap_or("etc"),
                props.sub_dir.as_deref().unwrap_or_default(),
            ]),
            _ => "etc".to_string(),
        };
        self.file(node, &decl.stem(), &dir, FileClass::Etc)
    }

    fn indirect(&mut self, step: &Step<'_>, kind: LinkKind) -> bool {
        let graph = self.ctx.graph;
        let node = step.child;
        let child = graph.decl(node);
        if !child.can_have_apex_variants() {
            return false;
        }
        let name = child.name().to_string();

        let handled = match kind {
            LinkKind::Shared | LinkKind::Runtime => match &child.kind {
                ModuleKind::CcLibrary(_) => Some(self.indirect_native(step)),
                ModuleKind::RustLibrary(_) => {
                    let mut file = self.native_lib(node);
                    file.transitive = true;
                    self.out.files.push(file);
                    Some(true)
                }
                _ => None,
            },
            // APK-in-APEX embeds JNI libraries itself.
            LinkKind::Header | LinkKind::Jni => Some(false),
            LinkKind::XmlPermissions => match &child.kind {
                ModuleKind::PrebuiltEtc(_) => {
                    let file = self.prebuilt_etc(node);
                    self.out.files.push(file);
                    Some(false)
                }
                _ => None,
            },
            LinkKind::Dylib => match &child.kind {
                ModuleKind::RustLibrary(_) if child.installable_to_apex() => {
                    let mut file = self.native_lib(node);
                    file.transitive = true;
                    self.out.files.push(file);
                    Some(true)
                }
                _ => None,
            },
            LinkKind::Rlib => Some(true),
            LinkKind::BootclasspathContent => Some(self.bootclasspath_content(step)),
            LinkKind::SystemServerContent => match &child.kind {
                ModuleKind::JavaLibrary(props) => {
                    let file = self.java_lib(node, self.dex_jar(node));
                    self.out.files.push(file);
                    if props.profile {
                        let profile = self.profile(node);
                        self.out.files.push(profile);
                    }
                    Some(true)
                }
                other => {
                    self.bundle_error(
                        "systemserverclasspath_fragments",
                        format!(
                            "systemserverclasspath_fragment content {name:?} of type {:?} is not supported",
                            other.type_name()
                        ),
                    );
                    Some(false)
                }
            },
            LinkKind::Static | LinkKind::JavaStatic | LinkKind::JavaLibs | LinkKind::Tool => {
                Some(false)
            }
        };

        handled.unwrap_or_else(|| {
            if child.installable_to_apex() {
                self.out.errors.push(module_error(
                    self.ctx.name(),
                    format!("unexpected tag {} for indirect dependency {name:?}", step.tag),
                ));
            }
            false
        })
    }

    fn indirect_native(&mut self, step: &Step<'_>) -> bool {
        let ctx = self.ctx;
        let node = step.child;
        let child = ctx.graph.decl(node);
        let name = child.name();

        if ctx.config.use_vndk_as_stable && ctx.uses_vndk() && child.is_vndk() {
            self.out.require_native_libs.push(":vndk".to_string());
            return false;
        }

        let mut file = self.native_lib(node);
        file.transitive = true;
        if ctx.is_host() {
            self.out.files.push(file);
            return true;
        }

        if !ctx.contents.directly_contains(name) && (child.is_stubs() || child.has_stubs()) {
            if child.stubs_implementation_required()
                && !ctx.prepared.platform.directly_in_any_apex(name)
                && !ctx.product.unbundled_build
            {
                self.out.make_modules_to_install.push(name.to_string());
            }
            self.out.require_native_libs.push(file.stem().to_string());
            return false;
        }

        if !ctx
            .graph
            .decl(step.parent)
            .depends_in_same_container(child, step.tag)
        {
            return false;
        }
        self.out.files.push(file);
        true
    }

    fn bootclasspath_content(&mut self, step: &Step<'_>) -> bool {
        let graph = self.ctx.graph;
        let node = step.child;
        let child = graph.decl(node);
        let name = child.name().to_string();
        match &child.kind {
            ModuleKind::JavaLibrary(props) if props.compiles_dex() => {
                let built = join_path(&[
                    "out",
                    graph.name(step.parent),
                    &graph.variation(step.parent).to_string(),
                    "hiddenapi-modular/encoded",
                    &format!("{name}.jar"),
                ]);
                let file = self.java_lib(node, built);
                self.out.files.push(file);
                true
            }
            ModuleKind::JavaLibrary(_) => {
                self.bundle_error(
                    "bootclasspath_fragments",
                    format!(
                        "bootclasspath_fragment content {name:?} is not configured to be compiled into dex"
                    ),
                );
                false
            }
            other => {
                self.bundle_error(
                    "bootclasspath_fragments",
                    format!(
                        "bootclasspath_fragment content {name:?} of type {:?} is not supported",
                        other.type_name()
                    ),
                );
                false
            }
        }
    }
}
