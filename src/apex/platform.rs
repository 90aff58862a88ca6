//! Platform availability
//!
//! A module is unavailable to the platform when it omits
//! `//apex_available:platform`, or when any dependency inside its container is
//! unavailable. Bootstrap libraries are always available. Host builds have no
//! platform and skip the pass.

use std::collections::BTreeSet;

use super::membership::{ApexContents, Membership};
use crate::domain::{AVAILABLE_TO_PLATFORM, TargetCapabilities, is_bootstrap};
use crate::error::Result;
use crate::graph::{Frozen, ModuleGraph, NodeId, topological_order};

/// Cross-bundle facts consumed by packaging
#[derive(Debug, Clone, Default)]
pub struct PlatformFacts {
    not_available: BTreeSet<String>,
    directly_in_any: BTreeSet<String>,
}

impl PlatformFacts {
    /// Whether every variant of the module may be installed on the platform
    pub fn available_to_platform(&self, module: &str) -> bool {
        !self.not_available.contains(module)
    }

    /// Whether any bundle lists the module directly
    pub fn directly_in_any_apex(&self, module: &str) -> bool {
        self.directly_in_any.contains(module)
    }
}

/// Compute platform availability bottom-up and the directly-in-any set
///
/// # Errors
///
/// Returns an error when the graph has a cycle.
pub fn mark(
    graph: &ModuleGraph,
    contents: &Frozen<String, ApexContents>,
    host: bool,
) -> Result<PlatformFacts> {
    let directly_in_any = contents
        .iter()
        .flat_map(|(_, bundle)| bundle.iter())
        .filter(|(_, membership)| *membership == Membership::Direct)
        .map(|(name, _)| name.to_string())
        .collect();

    let mut not_available = BTreeSet::new();
    if !host {
        let mut unavailable_nodes: BTreeSet<NodeId> = BTreeSet::new();
        for node in topological_order(graph)? {
            let decl = graph.decl(node);
            if !decl.can_have_apex_variants() {
                continue;
            }
            let mut available = decl.available_for(AVAILABLE_TO_PLATFORM);
            for edge in graph.edges(node) {
                let child = graph.decl(edge.to);
                if decl.depends_in_same_container(child, edge.tag)
                    && unavailable_nodes.contains(&edge.to)
                {
                    available = false;
                }
            }
            if is_bootstrap(decl.name()) {
                available = true;
            }
            if !available {
                unavailable_nodes.insert(node);
                not_available.insert(decl.name().to_string());
            }
        }
    }

    Ok(PlatformFacts {
        not_available,
        directly_in_any,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
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
    apex_available: ['//apex_available:platform', com.x.y]
    shared_libs: [libinner]
  - kind: cc_library
    name: libinner
    apex_available: [com.x.y]
  - kind: cc_library
    name: libc
    apex_available: [com.x.y]
";

    #[test]
    fn test_unavailability_propagates_up() {
        let fixture = Fixture::load(YAML);
        let tables = fixture.membership();
        let facts = mark(&fixture.graph, &tables.contents, false).unwrap();
        assert!(!facts.available_to_platform("libinner"));
        assert!(!facts.available_to_platform("libfoo"));
        assert!(facts.available_to_platform("libc"));
        assert!(facts.directly_in_any_apex("libfoo"));
        assert!(!facts.directly_in_any_apex("libinner"));
    }

    #[test]
    fn test_host_skips_marking() {
        let fixture = Fixture::load(YAML);
        let tables = fixture.membership();
        let facts = mark(&fixture.graph, &tables.contents, true).unwrap();
        assert!(facts.available_to_platform("libinner"));
    }
}
