//! Dependency declaration
//!
//! Turns every bundle's configuration into tagged far-variation edges. Runs
//! once, before any walk. A missing signing key fails only that bundle;
//! an undefined dependency or a missing variation fails the whole graph.

use std::collections::BTreeMap;

use tracing::debug;

use super::multilib::{ignored_bucket_warnings, requests};
use crate::config::{BundleConfig, ProductConfig};
use crate::domain::{ApexDepTag, CompileMultilib, DependencyTag, Multilib, Target};
use crate::error::{ApexError, Result, property_error};
use crate::graph::{ModuleGraph, NodeId, VariationSelector};

/// A bundle whose edges have been declared
#[derive(Debug, Clone)]
pub struct DeclaredBundle {
    pub name: String,
    pub node: NodeId,
    pub is_test: bool,
    pub warnings: Vec<String>,
}

/// Result of the dependency phase
#[derive(Debug, Default)]
pub struct DeclaredBundles {
    pub bundles: Vec<DeclaredBundle>,
    pub failures: BTreeMap<String, Vec<ApexError>>,
}

/// Target prebuilts are taken from: the first 64-bit device arch, else the first
fn prebuilt_target(targets: &[Target]) -> Option<Target> {
    targets
        .iter()
        .find(|target| target.arch.multilib() == Multilib::Lib64)
        .or_else(|| targets.first())
        .copied()
}

struct Declarer<'g> {
    graph: &'g mut ModuleGraph,
    from: NodeId,
}

impl Declarer<'_> {
    fn edges(
        &mut self,
        names: &[String],
        tag: ApexDepTag,
        selector: VariationSelector,
    ) -> Result<()> {
        for name in names {
            self.graph
                .declare_edge(self.from, name, DependencyTag::Apex(tag), selector)?;
            debug!(
                bundle = %self.graph.name(self.from),
                dependency = %name,
                tag = tag.name(),
                variation = %selector,
                "declared bundle edge"
            );
        }
        Ok(())
    }
}

/// Declare the edges of every enabled bundle, in module name order
///
/// # Errors
///
/// Returns an error when a dependency is undefined or lacks the requested variation.
pub fn declare(
    graph: &mut ModuleGraph,
    product: &ProductConfig,
    targets: &[Target],
) -> Result<DeclaredBundles> {
    let mut bundles: Vec<(String, NodeId)> = graph
        .module_ids()
        .filter(|id| {
            let decl = graph.module(*id);
            decl.bundle().is_some() && decl.common.is_enabled()
        })
        .filter_map(|id| {
            graph
                .variants(id)
                .first()
                .map(|node| (graph.module(id).name().to_string(), *node))
        })
        .collect();
    bundles.sort();

    let mut declared = DeclaredBundles::default();
    for (name, node) in bundles {
        let decl = graph.module(graph.node_module(node)).clone();
        let Some((config, is_test)) = decl.bundle() else {
            continue;
        };
        let compile_multilib = decl.common.compile_multilib.unwrap_or(CompileMultilib::Both);
        let bundle_targets = compile_multilib.select(targets);
        let warnings = ignored_bucket_warnings(&name, config, compile_multilib, &bundle_targets);

        let mut declarer = Declarer {
            graph: &mut *graph,
            from: node,
        };
        declare_payload(&mut declarer, config, &bundle_targets)?;
        if let Err(err) = declare_overridable(&mut declarer, &name, config, targets) {
            match err {
                ApexError::PropertyError { .. } => {
                    declared.failures.entry(name.clone()).or_default().push(err);
                }
                other => return Err(other),
            }
        }
        if product.apex_trim_enabled {
            declarer.edges(&config.trim_against, ApexDepTag::Dcla, VariationSelector::Common)?;
        }

        declared.bundles.push(DeclaredBundle {
            name,
            node,
            is_test,
            warnings,
        });
    }
    Ok(declared)
}

fn declare_payload(
    declarer: &mut Declarer<'_>,
    config: &BundleConfig,
    targets: &[Target],
) -> Result<()> {
    for request in requests(config, targets) {
        let at = VariationSelector::Target(request.target);
        let deps = &request.deps;
        declarer.edges(&deps.binaries, ApexDepTag::Executable, at)?;
        declarer.edges(&deps.tests, ApexDepTag::Test, at)?;
        declarer.edges(&deps.jni_libs, ApexDepTag::JniLib, at)?;
        declarer.edges(&deps.native_shared_libs, ApexDepTag::SharedLib, at)?;
        declarer.edges(&deps.rust_dyn_libs, ApexDepTag::SharedLib, at)?;
        declarer.edges(&deps.filesystems, ApexDepTag::Filesystem, at)?;
        // sh_binary variants exist for the primary target only.
        if request.primary {
            declarer.edges(&config.sh_binaries, ApexDepTag::ShBinary, at)?;
        }
    }

    let common = VariationSelector::Common;
    declarer.edges(&config.rros, ApexDepTag::Rro, common)?;
    declarer.edges(
        &config.bootclasspath_fragments,
        ApexDepTag::BootclasspathFragment,
        common,
    )?;
    declarer.edges(
        &config.systemserverclasspath_fragments,
        ApexDepTag::SystemServerClasspathFragment,
        common,
    )?;
    declarer.edges(&config.java_libs, ApexDepTag::JavaLib, common)?;
    declarer.edges(&config.filesystems, ApexDepTag::Filesystem, common)?;
    declarer.edges(&config.compat_configs, ApexDepTag::CompatConfig, common)?;
    Ok(())
}

fn declare_overridable(
    declarer: &mut Declarer<'_>,
    name: &str,
    config: &BundleConfig,
    device_targets: &[Target],
) -> Result<()> {
    let common = VariationSelector::Common;
    declarer.edges(&config.apps, ApexDepTag::AndroidApp, common)?;
    declarer.edges(&config.bpfs, ApexDepTag::Bpf, common)?;
    if !config.prebuilts.is_empty() {
        if let Some(target) = prebuilt_target(device_targets) {
            declarer.edges(
                &config.prebuilts,
                ApexDepTag::Prebuilt,
                VariationSelector::Target(target),
            )?;
        }
    }

    let key = config.key.as_deref().unwrap_or_default();
    if key.is_empty() {
        return Err(property_error(name, "key", "missing"));
    }
    declarer.edges(&[key.to_string()], ApexDepTag::Key, common)?;

    if let Some(cert) = config.certificate.as_deref().and_then(|c| c.strip_prefix(':')) {
        declarer.edges(&[cert.to_string()], ApexDepTag::Certificate, common)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use crate::graph::register;

    fn setup(yaml: &str) -> (ModuleGraph, GraphConfig, Vec<Target>) {
        let config = GraphConfig::from_yaml(yaml).unwrap();
        let targets = config.product.targets().unwrap();
        let graph = register(&config, &targets).unwrap();
        (graph, config, targets)
    }

    fn apex_edges(graph: &ModuleGraph, node: NodeId, tag: ApexDepTag) -> Vec<String> {
        graph
            .edges(node)
            .iter()
            .filter(|edge| edge.tag == DependencyTag::Apex(tag))
            .map(|edge| format!("{}@{}", graph.name(edge.to), graph.variation(edge.to)))
            .collect()
    }

    #[test]
    fn test_native_edges_per_target() {
        let (mut graph, config, targets) = setup(
            r"
product:
  device_targets: [arm, arm64]
modules:
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    native_shared_libs: [libfoo]
    binaries: [toolA]
  - kind: apex_key
    name: com.x.y.key
  - kind: cc_library
    name: libfoo
  - kind: cc_binary
    name: toolA
",
        );
        let declared = declare(&mut graph, &config.product, &targets).unwrap();
        assert!(declared.failures.is_empty());
        let bundle = &declared.bundles[0];

        assert_eq!(
            apex_edges(&graph, bundle.node, ApexDepTag::SharedLib),
            vec!["libfoo@android_arm", "libfoo@android_arm64"]
        );
        assert_eq!(
            apex_edges(&graph, bundle.node, ApexDepTag::Executable),
            vec!["toolA@android_arm"]
        );
        assert_eq!(apex_edges(&graph, bundle.node, ApexDepTag::Key), vec!["com.x.y.key@common"]);
    }

    #[test]
    fn test_missing_key_fails_only_that_bundle() {
        let (mut graph, config, targets) = setup(
            r"
modules:
  - kind: apex
    name: com.nokey
    updatable: false
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    updatable: false
  - kind: apex_key
    name: com.x.y.key
",
        );
        let declared = declare(&mut graph, &config.product, &targets).unwrap();
        assert_eq!(declared.bundles.len(), 2);
        let failures = &declared.failures["com.nokey"];
        assert_eq!(failures[0], property_error("com.nokey", "key", "missing"));
        assert!(!declared.failures.contains_key("com.x.y"));
    }

    #[test]
    fn test_undefined_dependency_is_fatal() {
        let (mut graph, config, targets) = setup(
            r"
modules:
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    java_libs: [nope]
  - kind: apex_key
    name: com.x.y.key
",
        );
        assert!(matches!(
            declare(&mut graph, &config.product, &targets),
            Err(ApexError::DependencyNotFound { .. })
        ));
    }

    #[test]
    fn test_certificate_module_edge_and_prebuilt_arch() {
        let (mut graph, config, targets) = setup(
            r"
product:
  device_targets: [arm, arm64]
modules:
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    certificate: ':com.x.y.cert'
    prebuilts: [myetc]
  - kind: apex_key
    name: com.x.y.key
  - kind: android_app_certificate
    name: com.x.y.cert
    certificate: certs/xy
  - kind: prebuilt_etc
    name: myetc
    src: my.conf
",
        );
        let declared = declare(&mut graph, &config.product, &targets).unwrap();
        let node = declared.bundles[0].node;
        assert_eq!(
            apex_edges(&graph, node, ApexDepTag::Certificate),
            vec!["com.x.y.cert@common"]
        );
        assert_eq!(
            apex_edges(&graph, node, ApexDepTag::Prebuilt),
            vec!["myetc@android_arm64"]
        );
    }

    #[test]
    fn test_trim_against_needs_product_switch() {
        let yaml = r"
product:
  apex_trim_enabled: true
modules:
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    trim_against: [com.dcla]
  - kind: apex
    name: com.dcla
    key: com.x.y.key
    dynamic_common_lib_apex: true
  - kind: apex_key
    name: com.x.y.key
";
        let (mut graph, config, targets) = setup(yaml);
        let declared = declare(&mut graph, &config.product, &targets).unwrap();
        let xy = declared.bundles.iter().find(|b| b.name == "com.x.y").unwrap();
        assert_eq!(apex_edges(&graph, xy.node, ApexDepTag::Dcla).len(), 1);
    }
}
