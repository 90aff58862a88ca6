//! Membership walk
//!
//! Walks each bundle's dependencies once, recording which modules it contains
//! (directly or transitively) and marking every kept node as built for the
//! bundle. Results are published into frozen side tables read by every later
//! phase.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info};

use super::deps::DeclaredBundle;
use crate::config::{BundleConfig, ModuleDecl, ModuleKind, ProductConfig};
use crate::domain::{ApexDepTag, ApiLevel, DependencyTag, TargetCapabilities};
use crate::error::{ApexError, Result, property_error};
use crate::graph::{Frozen, ModuleGraph, NodeId, ProviderTable, Step, walk_deps};

/// Membership of one module in one bundle
///
/// Ordered so that merging two observations is `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    Transitive,
    Direct,
}

impl Membership {
    pub fn observed(direct: bool) -> Self {
        if direct {
            Membership::Direct
        } else {
            Membership::Transitive
        }
    }
}

/// Modules contained in one bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApexContents {
    members: BTreeMap<String, Membership>,
}

impl ApexContents {
    /// Record an observation; direct membership is never downgraded
    pub fn add(&mut self, name: &str, direct: bool) {
        let observed = Membership::observed(direct);
        self.members
            .entry(name.to_string())
            .and_modify(|current| *current = (*current).max(observed))
            .or_insert(observed);
    }

    pub fn get(&self, name: &str) -> Option<Membership> {
        self.members.get(name).copied()
    }

    pub fn directly_contains(&self, name: &str) -> bool {
        self.get(name) == Some(Membership::Direct)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Membership)> {
        self.members.iter().map(|(name, m)| (name.as_str(), *m))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Per-bundle settings published for later phases and dependents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApexInfo {
    pub bundle: String,
    pub min_sdk: ApiLevel,
    pub updatable: bool,
    pub platform_apis: bool,
}

/// Everything the membership phase publishes
#[derive(Debug, Default)]
pub struct MembershipTables {
    pub contents: Frozen<String, ApexContents>,
    pub infos: Frozen<String, ApexInfo>,
    /// Bundles each node must be built for
    pub build_for: Frozen<NodeId, BTreeSet<String>>,
    /// Shared libraries published by dynamic common library bundles
    pub dcla_provided: Frozen<String, Vec<String>>,
    /// Apps directly included in an updatable bundle
    pub updatable_apps: BTreeSet<String>,
    pub failures: BTreeMap<String, Vec<ApexError>>,
}

fn bundle_config(decl: &ModuleDecl) -> Option<&BundleConfig> {
    decl.bundle().map(|(config, _)| config)
}

/// Reasons a bundle's `use_vndk_as_stable` setting is rejected
fn vndk_as_stable_errors(
    graph: &ModuleGraph,
    bundle: &DeclaredBundle,
    decl: &ModuleDecl,
    product: &ProductConfig,
) -> Vec<ApexError> {
    let mut errors = Vec::new();
    let property = "use_vndk_as_stable";
    if !uses_vndk(decl, product) {
        errors.push(property_error(
            &bundle.name,
            property,
            "not supported for system/system_ext APEXes",
        ));
    }
    if decl.common.min_sdk_version.is_some() {
        errors.push(property_error(
            &bundle.name,
            property,
            "not supported when min_sdk_version is set",
        ));
    }
    for edge in graph.edges(bundle.node) {
        if edge.tag == DependencyTag::Apex(ApexDepTag::SharedLib) && graph.decl(edge.to).is_vndk() {
            errors.push(property_error(
                &bundle.name,
                property,
                format!(
                    "Trying to include a VNDK library({}) while use_vndk_as_stable is true.",
                    graph.name(edge.to)
                ),
            ));
        }
    }
    errors
}

/// Whether the bundle lives on a partition that may treat VNDK as stable
pub fn uses_vndk(decl: &ModuleDecl, product: &ProductConfig) -> bool {
    decl.common.vendor
        || (decl.common.product_specific && product.enforce_product_partition_interface)
}

/// Minimum API level a bundle is built against
///
/// # Errors
///
/// Returns a property error when min_sdk_version cannot be parsed.
pub fn bundle_min_sdk(decl: &ModuleDecl, product: &ProductConfig) -> Result<ApiLevel> {
    let declared = decl
        .min_sdk()
        .map_err(|reason| property_error(decl.name(), "min_sdk_version", reason))?;
    let Some(declared) = declared else {
        return Ok(ApiLevel::FUTURE);
    };
    let override_level = product
        .min_sdk_version_override
        .as_deref()
        .map(ApiLevel::parse)
        .transpose()
        .map_err(|reason| property_error(decl.name(), "min_sdk_version", reason))?;
    Ok(match override_level {
        Some(level) if level > declared => level,
        _ => declared,
    })
}

fn continue_walk(graph: &ModuleGraph, step: &Step<'_>, exclude_vndk: bool) -> bool {
    let child = graph.decl(step.child);
    if !child.common.is_enabled() || !child.can_have_apex_variants() {
        return false;
    }
    if step.tag.always_requires_apex_variant() {
        return true;
    }
    if !graph.decl(step.parent).depends_in_same_container(child, step.tag) {
        return false;
    }
    !(exclude_vndk && child.is_vndk())
}

/// Run the membership walk for every bundle that has not failed yet
///
/// # Errors
///
/// Returns an error when a side table is published twice.
pub fn walk(
    graph: &ModuleGraph,
    bundles: &[DeclaredBundle],
    failed: &BTreeSet<String>,
    product: &ProductConfig,
) -> Result<MembershipTables> {
    let mut contents_table = ProviderTable::new("apex_contents");
    let mut infos_table = ProviderTable::new("apex_info");
    let mut marks: ProviderTable<NodeId, BTreeSet<String>> = ProviderTable::new("build_for");
    let mut dcla_table = ProviderTable::new("dcla_provided");
    let mut updatable_apps = BTreeSet::new();
    let mut failures: BTreeMap<String, Vec<ApexError>> = BTreeMap::new();

    for bundle in bundles.iter().filter(|b| !failed.contains(&b.name)) {
        let decl = graph.decl(bundle.node);
        let Some(config) = bundle_config(decl) else {
            continue;
        };

        if config.use_vndk_as_stable {
            let errors = vndk_as_stable_errors(graph, bundle, decl, product);
            if !errors.is_empty() {
                failures.insert(bundle.name.clone(), errors);
                continue;
            }
        }
        let exclude_vndk = config.use_vndk_as_stable && uses_vndk(decl, product);

        let min_sdk = match bundle_min_sdk(decl, product) {
            Ok(level) => level,
            Err(err) => {
                failures.insert(bundle.name.clone(), vec![err]);
                continue;
            }
        };

        let mut contents = ApexContents::default();
        walk_deps(graph, bundle.node, |step| {
            if !continue_walk(graph, step, exclude_vndk) {
                return false;
            }
            contents.add(graph.name(step.child), step.is_direct());
            marks
                .entry_or_insert_with(step.child, BTreeSet::new)
                .insert(bundle.name.clone());
            debug!(
                bundle = %bundle.name,
                module = %graph.name(step.child),
                variation = %graph.variation(step.child),
                direct = step.is_direct(),
                "member"
            );
            true
        });
        info!(bundle = %bundle.name, members = contents.len(), "membership collected");

        if config.is_updatable() {
            for edge in graph.edges(bundle.node) {
                if let ModuleKind::AndroidApp(app) = &graph.decl(edge.to).kind {
                    if !app.prebuilt && !app.test_helper {
                        updatable_apps.insert(graph.name(edge.to).to_string());
                    }
                }
            }
        }

        if config.dynamic_common_lib_apex {
            dcla_table.publish(bundle.name.clone(), config.native_shared_libs.clone())?;
        }

        contents_table.publish(bundle.name.clone(), contents)?;
        infos_table.publish(
            bundle.name.clone(),
            ApexInfo {
                bundle: bundle.name.clone(),
                min_sdk,
                updatable: config.is_updatable(),
                platform_apis: config.platform_apis,
            },
        )?;
    }

    Ok(MembershipTables {
        contents: contents_table.freeze(),
        infos: infos_table.freeze(),
        build_for: marks.freeze(),
        dcla_provided: dcla_table.freeze(),
        updatable_apps,
        failures,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::test_fixtures::Fixture;

    #[test]
    fn test_direct_never_downgraded() {
        let mut contents = ApexContents::default();
        contents.add("libfoo", true);
        contents.add("libfoo", false);
        assert_eq!(contents.get("libfoo"), Some(Membership::Direct));

        contents.add("libbar", false);
        contents.add("libbar", true);
        assert_eq!(contents.get("libbar"), Some(Membership::Direct));
    }

    #[test]
    fn test_double_publish_names_the_table() {
        let yaml = r"
modules:
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    updatable: false
    native_shared_libs: [libfoo]
  - kind: apex_key
    name: com.x.y.key
  - kind: cc_library
    name: libfoo
";
        let table_of = |yaml: &str| {
            let fixture = Fixture::load(yaml);
            let bundle = fixture.declared.bundles[0].clone();
            let twice = [bundle.clone(), bundle];
            match walk(&fixture.graph, &twice, &BTreeSet::new(), &fixture.config.product) {
                Err(ApexError::ProviderAlreadyPublished { phase, .. }) => phase,
                other => panic!("expected a second publish to fail, got {other:?}"),
            }
        };

        assert_eq!(table_of(yaml), "apex_contents");
        let dcla = yaml.replace("updatable: false\n", "updatable: false\n    dynamic_common_lib_apex: true\n");
        assert_eq!(table_of(&dcla), "dcla_provided");
    }

    #[test]
    fn test_transitive_members_and_stub_boundary() {
        let fixture = Fixture::load(
            r"
modules:
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    updatable: false
    native_shared_libs: [libfoo]
  - kind: apex_key
    name: com.x.y.key
  - kind: cc_library
    name: libfoo
    shared_libs: [libbar, libstub]
  - kind: cc_library
    name: libbar
  - kind: cc_library
    name: libstub
    stubs: true
",
        );
        let tables = fixture.membership();
        let contents = tables.contents.get(&"com.x.y".to_string()).unwrap();
        assert_eq!(contents.get("libfoo"), Some(Membership::Direct));
        assert_eq!(contents.get("libbar"), Some(Membership::Transitive));
        assert_eq!(contents.get("libstub"), None);
        assert_eq!(contents.get("com.x.y.key"), None);

        let marked: Vec<&str> = tables
            .build_for
            .iter()
            .map(|(node, _)| fixture.graph.name(*node))
            .collect();
        assert!(marked.contains(&"libbar"));
        assert!(!marked.contains(&"libstub"));
    }

    #[test]
    fn test_vndk_excluded_when_stable() {
        let fixture = Fixture::load(
            r"
modules:
  - kind: apex
    name: com.vendor.x
    key: com.x.y.key
    updatable: false
    vendor: true
    use_vndk_as_stable: true
    native_shared_libs: [libfoo]
  - kind: apex_key
    name: com.x.y.key
  - kind: cc_library
    name: libfoo
    vendor: true
    shared_libs: [libvndk]
  - kind: cc_library
    name: libvndk
    vndk: true
",
        );
        let tables = fixture.membership();
        let contents = tables.contents.get(&"com.vendor.x".to_string()).unwrap();
        assert!(contents.get("libfoo").is_some());
        assert_eq!(contents.get("libvndk"), None);
    }

    #[test]
    fn test_vndk_as_stable_rejected_on_system() {
        let fixture = Fixture::load(
            r"
modules:
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    updatable: false
    use_vndk_as_stable: true
    min_sdk_version: 29
    native_shared_libs: [libvndk]
  - kind: apex_key
    name: com.x.y.key
  - kind: cc_library
    name: libvndk
    vndk: true
",
        );
        let tables = fixture.membership();
        let errors = &tables.failures["com.x.y"];
        assert_eq!(errors.len(), 3);
        assert!(errors[0].to_string().contains("not supported for system/system_ext APEXes"));
        assert!(errors[2].to_string().contains("Trying to include a VNDK library(libvndk)"));
    }

    #[test]
    fn test_apex_info_and_override() {
        let fixture = Fixture::load(
            r"
product:
  min_sdk_version_override: 31
modules:
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    min_sdk_version: 29
  - kind: apex
    name: com.future
    key: com.x.y.key
    updatable: false
  - kind: apex_key
    name: com.x.y.key
",
        );
        let tables = fixture.membership();
        let xy = tables.infos.get(&"com.x.y".to_string()).unwrap();
        assert_eq!(xy.min_sdk, ApiLevel::new(31));
        assert!(xy.updatable);
        let future = tables.infos.get(&"com.future".to_string()).unwrap();
        assert_eq!(future.min_sdk, ApiLevel::FUTURE);
    }

    #[test]
    fn test_updatable_apps_and_dcla() {
        let fixture = Fixture::load(
            r"
modules:
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    min_sdk_version: 30
    apps: [App, AppImport]
  - kind: apex
    name: com.dcla
    key: com.x.y.key
    updatable: false
    dynamic_common_lib_apex: true
    native_shared_libs: [libshared]
  - kind: apex_key
    name: com.x.y.key
  - kind: android_app
    name: App
    min_sdk_version: 30
  - kind: android_app
    name: AppImport
    prebuilt: true
  - kind: cc_library
    name: libshared
",
        );
        let tables = fixture.membership();
        assert!(tables.updatable_apps.contains("App"));
        assert!(!tables.updatable_apps.contains("AppImport"));
        assert_eq!(
            tables.dcla_provided.get(&"com.dcla".to_string()),
            Some(&vec!["libshared".to_string()])
        );
    }
}
