//! Graph registration
//!
//! Builds the arena from declared modules: variants per [`VariantPolicy`],
//! then every intrinsic link edge between matching variants. Bundle edges are
//! declared later by the dependency phase.

use tracing::debug;

use super::{ModuleGraph, NodeId, Variation, VariationSelector, topological_order};
use crate::config::GraphConfig;
use crate::domain::{DependencyTag, EdgeTarget, Target, TargetCapabilities, VariantPolicy};
use crate::error::Result;

/// Register every declared module and its intrinsic edges
///
/// `targets` is the product target list, primary first.
///
/// # Errors
///
/// Returns an error for duplicate modules, undefined dependencies, missing
/// variations or dependency cycles.
pub fn register(config: &GraphConfig, targets: &[Target]) -> Result<ModuleGraph> {
    let mut graph = ModuleGraph::new();

    for decl in &config.modules {
        let policy = decl.variant_policy();
        let module = graph.add_module(decl.clone())?;
        let variations: Vec<Variation> = match policy {
            VariantPolicy::Common => vec![Variation::common()],
            VariantPolicy::Arch(multilib) => multilib
                .select(targets)
                .into_iter()
                .map(Variation::arch)
                .collect(),
            VariantPolicy::CommonAndArch(multilib) => std::iter::once(Variation::common())
                .chain(multilib.select(targets).into_iter().map(Variation::arch))
                .collect(),
        };
        for variation in variations {
            graph.create_variant(module, variation);
        }
    }

    let primary = targets
        .first()
        .copied()
        .map_or(VariationSelector::Any, VariationSelector::Target);

    for module in graph.module_ids().collect::<Vec<_>>() {
        let nodes: Vec<NodeId> = graph.variants(module).to_vec();
        let decl = graph.module(module).clone();
        for node in nodes {
            let own_target = graph.variation(node).target;
            for link in decl.link_edges() {
                let selector = match link.target {
                    EdgeTarget::Same => {
                        own_target.map_or(VariationSelector::Common, VariationSelector::Target)
                    }
                    EdgeTarget::Common => VariationSelector::Common,
                    EdgeTarget::Primary => primary,
                    EdgeTarget::Any => VariationSelector::Any,
                };
                let tag = DependencyTag::Link(link.kind);
                let to = graph.declare_edge(node, link.dependency, tag, selector)?;
                debug!(
                    from = %decl.name(),
                    variation = %graph.variation(node),
                    to = %graph.variation(to),
                    dependency = link.dependency,
                    kind = link.kind.name(),
                    "declared link edge"
                );
            }
        }
    }

    topological_order(&graph)?;
    Ok(graph)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::{ArchType, LinkKind};
    use crate::error::ApexError;

    fn targets() -> Vec<Target> {
        vec![Target::device(ArchType::Arm64), Target::device(ArchType::Arm)]
    }

    fn config(yaml: &str) -> GraphConfig {
        GraphConfig::from_yaml(yaml).unwrap()
    }

    #[test]
    fn test_arch_variants_per_policy() {
        let config = config(
            r"
modules:
  - kind: cc_library
    name: libfoo
  - kind: cc_binary
    name: toolA
  - kind: java_library
    name: javalib
",
        );
        let graph = register(&config, &targets()).unwrap();
        let variants = |name: &str| graph.variants(graph.module_id(name).unwrap()).len();
        assert_eq!(variants("libfoo"), 2);
        assert_eq!(variants("toolA"), 1);
        assert_eq!(variants("javalib"), 1);
    }

    #[test]
    fn test_link_edges_match_target() {
        let config = config(
            r"
modules:
  - kind: cc_library
    name: libfoo
    shared_libs: [libbar]
  - kind: cc_library
    name: libbar
",
        );
        let graph = register(&config, &targets()).unwrap();
        let foo = graph.module_id("libfoo").unwrap();
        for node in graph.variants(foo) {
            let edges = graph.edges(*node);
            assert_eq!(edges.len(), 1);
            assert_eq!(edges[0].tag, DependencyTag::Link(LinkKind::Shared));
            assert_eq!(graph.variation(edges[0].to), graph.variation(*node));
        }
    }

    #[test]
    fn test_missing_dependency_is_error() {
        let config = config(
            r"
modules:
  - kind: cc_library
    name: libfoo
    shared_libs: [libnope]
",
        );
        assert!(matches!(
            register(&config, &targets()),
            Err(ApexError::DependencyNotFound { .. })
        ));
    }

    #[test]
    fn test_width_mismatch_is_missing_variation() {
        let config = config(
            r"
modules:
  - kind: cc_library
    name: libfoo
    shared_libs: [lib64only]
  - kind: cc_library
    name: lib64only
    compile_multilib: 64
",
        );
        assert!(matches!(
            register(&config, &targets()),
            Err(ApexError::VariationNotFound { .. })
        ));
    }

    #[test]
    fn test_cycle_rejected() {
        let config = config(
            r"
modules:
  - kind: cc_library
    name: liba
    static_libs: [libb]
  - kind: cc_library
    name: libb
    static_libs: [liba]
",
        );
        assert!(matches!(
            register(&config, &targets()),
            Err(ApexError::CircularDependency { .. })
        ));
    }
}
