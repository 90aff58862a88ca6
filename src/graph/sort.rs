//! Topological ordering of graph nodes using depth-first search (DFS)
//!
//! Bottom-up phases (variant creation) need every dependency visited before
//! its dependents; registration needs cycles rejected before any walk runs.
//!
//! ## Algorithm
//!
//! DFS with three-color marking:
//!
//! 1. **WHITE** (unvisited): Node hasn't been processed
//! 2. **GRAY** (on stack): Node is in the current recursion path
//! 3. **BLACK** (done): Node and all its dependencies have been emitted
//!
//! Reaching a GRAY node closes a cycle; the error names every module on it.

use std::collections::HashSet;

use super::{ModuleGraph, NodeId};
use crate::domain::DependencyTag;
use crate::error::{Result, circular_dependency};

/// Context for topological sort operations
struct TopoSortContext<'a> {
    graph: &'a ModuleGraph,
    /// Fully processed nodes (BLACK)
    visited: HashSet<NodeId>,
    /// Nodes on the current path (GRAY), in visiting order
    stack: Vec<NodeId>,
    /// Nodes in dependency order
    result: Vec<NodeId>,
}

/// Order every live node so that dependencies precede their dependents
///
/// Roots are processed in node creation order, which keeps the output
/// deterministic for a given declared graph.
///
/// # Errors
///
/// Returns error if a dependency cycle is detected.
///
/// # Example
///
/// ```text
/// Edges:
///   com.x.y -> libfoo
///   libfoo  -> libbar
///
/// Result: [libbar, libfoo, com.x.y]
/// ```
pub fn topological_order(graph: &ModuleGraph) -> Result<Vec<NodeId>> {
    let mut ctx = TopoSortContext {
        graph,
        visited: HashSet::new(),
        stack: Vec::new(),
        result: Vec::new(),
    };

    for node in graph.live_nodes() {
        if !ctx.visited.contains(&node) {
            topo_dfs(&mut ctx, node)?;
        }
    }

    Ok(ctx.result)
}

/// DFS helper with cycle detection; post-order adds nodes to the result
fn topo_dfs(ctx: &mut TopoSortContext, node: NodeId) -> Result<()> {
    if let Some(start) = ctx.stack.iter().position(|on_path| *on_path == node) {
        let mut chain: Vec<&str> = ctx.stack[start..]
            .iter()
            .map(|id| ctx.graph.name(*id))
            .collect();
        chain.push(ctx.graph.name(node));
        return Err(circular_dependency(chain.join(" -> ")));
    }

    if ctx.visited.contains(&node) {
        return Ok(());
    }

    ctx.stack.push(node);
    let graph = ctx.graph;
    // Test-for back-references never order nodes.
    for edge in graph.edges(node) {
        if edge.tag != DependencyTag::TestFor {
            topo_dfs(ctx, edge.to)?;
        }
    }
    ctx.stack.pop();

    ctx.visited.insert(node);
    ctx.result.push(node);
    Ok(())
}
