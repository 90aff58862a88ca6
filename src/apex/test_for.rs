//! Test-for back-references
//!
//! A module listing `test_for` may link against the internals of the named
//! bundles. The edges are declared after membership so the bundle contents
//! are known, and re-resolved once bundles have moved onto their own
//! variation.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::warn;

use super::membership::ApexContents;
use crate::domain::{DependencyTag, TargetCapabilities};
use crate::error::Result;
use crate::graph::{Frozen, ModuleGraph, ProviderTable, Variation, VariationSelector};

/// Bundle contents visible to one test module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestForInfo {
    pub bundles: Vec<String>,
    pub visible: BTreeSet<String>,
}

/// Declare test-for edges and publish what each test may see
///
/// # Errors
///
/// Returns an error when a `test_for` entry names an undefined module.
pub fn declare(
    graph: &mut ModuleGraph,
    contents: &Frozen<String, ApexContents>,
) -> Result<Frozen<String, TestForInfo>> {
    let mut published = ProviderTable::new("apex_test_for");

    for module in graph.module_ids().collect::<Vec<_>>() {
        let decl = graph.module(module).clone();
        if decl.common.test_for.is_empty()
            || !decl.common.is_enabled()
            || !decl.can_have_apex_variants()
        {
            continue;
        }
        for node in graph.variants(module).to_vec() {
            for bundle in &decl.common.test_for {
                let selector = VariationSelector::Common;
                graph.declare_edge(node, bundle, DependencyTag::TestFor, selector)?;
            }
        }

        let mut info = TestForInfo::default();
        for bundle in &decl.common.test_for {
            if let Some(bundle_contents) = contents.get(bundle) {
                info.bundles.push(bundle.clone());
                info.visible
                    .extend(bundle_contents.iter().map(|(name, _)| name.to_string()));
            }
        }
        published.publish(decl.name().to_string(), info)?;
    }
    Ok(published.freeze())
}

/// Point test-for edges back at the default variation of their bundle
///
/// Bundles without a default-variation alias no longer have one; such edges
/// are dropped and reported.
pub fn reresolve(graph: &mut ModuleGraph) -> Vec<String> {
    let mut dangling = BTreeSet::new();
    graph.retarget_edges(|graph, node, edge| {
        if edge.tag != DependencyTag::TestFor {
            return Some(edge.to);
        }
        let bundle = graph.node_module(edge.to);
        let resolved = graph.find_variant(bundle, &Variation::common());
        if resolved.is_none() {
            dangling.insert((graph.name(node).to_string(), graph.name(edge.to).to_string()));
        }
        resolved
    });

    dangling
        .into_iter()
        .map(|(test, bundle)| {
            warn!(test = %test, bundle = %bundle, "test_for dependency no longer resolves");
            format!("test_for of {test} on {bundle} does not resolve to a default variation")
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ApexError;
    use crate::test_fixtures::Fixture;

    const YAML: &str = r"
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
  - kind: cc_test
    name: footest
    test_for: [com.x.y]
";

    #[test]
    fn test_declares_edges_and_publishes_contents() {
        let mut fixture = Fixture::load(YAML);
        let tables = fixture.membership();
        let infos = declare(&mut fixture.graph, &tables.contents).unwrap();

        let info = infos.get(&"footest".to_string()).unwrap();
        assert_eq!(info.bundles, vec!["com.x.y".to_string()]);
        assert!(info.visible.contains("libfoo"));

        let test = fixture.graph.module_id("footest").unwrap();
        for node in fixture.graph.variants(test) {
            assert!(fixture
                .graph
                .edges(*node)
                .iter()
                .any(|edge| edge.tag == DependencyTag::TestFor));
        }
    }

    #[test]
    fn test_undefined_bundle_is_error() {
        let mut fixture = Fixture::load(
            r"
modules:
  - kind: cc_test
    name: footest
    test_for: [com.missing]
",
        );
        let tables = fixture.membership();
        assert!(matches!(
            declare(&mut fixture.graph, &tables.contents),
            Err(ApexError::DependencyNotFound { .. })
        ));
    }

    #[test]
    fn test_reresolve_drops_unaliased_bundles() {
        let mut fixture = Fixture::load(YAML);
        let tables = fixture.membership();
        declare(&mut fixture.graph, &tables.contents).unwrap();

        let bundle = fixture.graph.module_id("com.x.y").unwrap();
        let node = fixture.graph.variants(bundle)[0];
        fixture.graph.rename_variation(node, "com.x.y");

        let warnings = reresolve(&mut fixture.graph);
        assert_eq!(warnings.len(), 1);
        let test = fixture.graph.module_id("footest").unwrap();
        for node in fixture.graph.variants(test) {
            assert!(fixture.graph.edges(*node).is_empty());
        }
    }

    #[test]
    fn test_reresolve_follows_alias() {
        let mut fixture = Fixture::load(
            r"
modules:
  - kind: apex
    name: com.android.art
    key: com.x.y.key
    updatable: false
  - kind: apex_key
    name: com.x.y.key
  - kind: cc_test
    name: arttest
    test_for: [com.android.art]
",
        );
        let tables = fixture.membership();
        declare(&mut fixture.graph, &tables.contents).unwrap();

        let bundle = fixture.graph.module_id("com.android.art").unwrap();
        let node = fixture.graph.variants(bundle)[0];
        fixture.graph.rename_variation(node, "com.android.art");
        fixture.graph.create_alias(bundle, Variation::common(), node);

        assert!(reresolve(&mut fixture.graph).is_empty());
        let test = fixture.graph.module_id("arttest").unwrap();
        let first = fixture.graph.variants(test)[0];
        assert_eq!(fixture.graph.edges(first)[0].to, node);
    }
}
