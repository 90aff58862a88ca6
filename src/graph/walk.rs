//! Dependency walks
//!
//! [`walk_deps`] visits every edge reachable from a start node. The visitor is
//! called once per edge (a node reached over two edges is offered twice) and
//! decides whether the walk descends into the child; each node is descended
//! into at most once.

use std::collections::HashSet;

use super::{ModuleGraph, NodeId};
use crate::domain::DependencyTag;

/// One edge offered to a walk visitor
#[derive(Debug)]
pub struct Step<'p> {
    pub parent: NodeId,
    pub child: NodeId,
    pub tag: DependencyTag,
    path: &'p [NodeId],
}

impl Step<'_> {
    /// Nodes from the start node to `child`, both included
    pub fn path(&self) -> &[NodeId] {
        self.path
    }

    /// Whether `parent` is the start node of the walk
    pub fn is_direct(&self) -> bool {
        self.path.len() == 2
    }
}

/// Render a walk path as `a -> b -> c`
pub fn path_string(graph: &ModuleGraph, path: &[NodeId]) -> String {
    path.iter()
        .map(|node| graph.name(*node))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Walk the dependencies of `start` depth-first
pub fn walk_deps<F>(graph: &ModuleGraph, start: NodeId, mut visit: F)
where
    F: FnMut(&Step<'_>) -> bool,
{
    let mut path = vec![start];
    let mut visited = HashSet::new();
    walk_from(graph, start, &mut path, &mut visited, &mut visit);
}

fn walk_from<F>(
    graph: &ModuleGraph,
    node: NodeId,
    path: &mut Vec<NodeId>,
    visited: &mut HashSet<NodeId>,
    visit: &mut F,
) where
    F: FnMut(&Step<'_>) -> bool,
{
    for edge in graph.edges(node) {
        path.push(edge.to);
        let descend = visit(&Step {
            parent: node,
            child: edge.to,
            tag: edge.tag,
            path,
        });
        if descend && visited.insert(edge.to) {
            walk_from(graph, edge.to, path, visited, visit);
        }
        path.pop();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::module::CcLibraryProps;
    use crate::config::{ModuleDecl, ModuleKind};
    use crate::domain::LinkKind;
    use crate::graph::Variation;

    const SHARED: DependencyTag = DependencyTag::Link(LinkKind::Shared);

    fn diamond() -> (ModuleGraph, Vec<NodeId>) {
        let mut graph = ModuleGraph::new();
        let nodes: Vec<NodeId> = ["top", "left", "right", "bottom"]
            .iter()
            .map(|name| {
                let id = graph
                    .add_module(ModuleDecl::new(
                        *name,
                        ModuleKind::CcLibrary(CcLibraryProps::default()),
                    ))
                    .unwrap();
                graph.create_variant(id, Variation::common())
            })
            .collect();
        graph.add_edge(nodes[0], nodes[1], SHARED);
        graph.add_edge(nodes[0], nodes[2], SHARED);
        graph.add_edge(nodes[1], nodes[3], SHARED);
        graph.add_edge(nodes[2], nodes[3], SHARED);
        (graph, nodes)
    }

    #[test]
    fn test_every_edge_offered_each_node_descended_once() {
        let (graph, nodes) = diamond();
        let mut offered = Vec::new();
        walk_deps(&graph, nodes[0], |step| {
            offered.push((step.parent, step.child));
            true
        });
        assert_eq!(offered.len(), 4);
        assert_eq!(offered.iter().filter(|(_, c)| *c == nodes[3]).count(), 2);
    }

    #[test]
    fn test_visitor_prunes() {
        let (graph, nodes) = diamond();
        let mut seen = Vec::new();
        walk_deps(&graph, nodes[0], |step| {
            seen.push(step.child);
            step.child != nodes[1]
        });
        assert_eq!(seen, vec![nodes[1], nodes[2], nodes[3]]);
    }

    #[test]
    fn test_path_string() {
        let (graph, nodes) = diamond();
        let mut paths = Vec::new();
        walk_deps(&graph, nodes[0], |step| {
            paths.push((step.is_direct(), path_string(&graph, step.path())));
            true
        });
        assert_eq!(paths[0], (true, "top -> left".to_string()));
        assert_eq!(paths[1], (false, "top -> left -> bottom".to_string()));
    }
}
