//! Arena build graph
//!
//! The graph engine the pipeline mutates. Modules are registered once; each
//! module owns one or more variant nodes addressed by a stable [`NodeId`].
//! Edges belong to nodes and carry an immutable [`DependencyTag`].
//!
//! ```text
//! ModuleDecl ──▶ ModuleId ──▶ [NodeId (android_arm64), NodeId (android_arm), ...]
//!                               │
//!                               └── edges: [(NodeId, DependencyTag), ...]
//! ```
//!
//! Phases never hold references into the graph across mutations; side tables
//! are keyed by [`NodeId`] or module name (see [`provider`]).

pub mod provider;
pub mod register;
pub mod sort;
pub mod walk;

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::config::ModuleDecl;
use crate::domain::{DependencyTag, Target};
use crate::error::{Result, config_invalid, dependency_not_found, variation_not_found};

pub use provider::{Frozen, ProviderTable};
pub use register::register;
pub use sort::topological_order;
pub use walk::{Step, path_string, walk_deps};

/// Stable identity of a registered module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModuleId(usize);

/// Stable identity of one variant of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

/// Position of a node on the variation axes (architecture, bundle)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variation {
    /// `None` for architecture-less (`common`) variants
    pub target: Option<Target>,
    /// Bundle variation name, empty for the platform variant
    pub apex: String,
}

impl Variation {
    pub fn common() -> Self {
        Self {
            target: None,
            apex: String::new(),
        }
    }

    pub fn arch(target: Target) -> Self {
        Self {
            target: Some(target),
            apex: String::new(),
        }
    }

    pub fn with_apex(&self, apex: impl Into<String>) -> Self {
        Self {
            target: self.target,
            apex: apex.into(),
        }
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            Some(target) => write!(f, "{target}")?,
            None => f.write_str("common")?,
        }
        if !self.apex.is_empty() {
            write!(f, "_{}", self.apex)?;
        }
        Ok(())
    }
}

/// How a far-variation edge picks the variant of its dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariationSelector {
    Common,
    Target(Target),
    /// The first registered variant, whatever its axis values
    Any,
}

impl fmt::Display for VariationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariationSelector::Common => f.write_str("common"),
            VariationSelector::Target(target) => write!(f, "{target}"),
            VariationSelector::Any => f.write_str("any"),
        }
    }
}

/// A tagged dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub to: NodeId,
    pub tag: DependencyTag,
}

#[derive(Debug, Clone)]
struct Node {
    module: ModuleId,
    variation: Variation,
    edges: Vec<Edge>,
}

/// Arena of modules, variant nodes and edges
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<ModuleDecl>,
    by_name: HashMap<String, ModuleId>,
    nodes: Vec<Node>,
    variants: Vec<Vec<NodeId>>,
    aliases: HashMap<(ModuleId, Variation), NodeId>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module
    ///
    /// # Errors
    ///
    /// Returns an error when a module with the same name is already registered.
    pub fn add_module(&mut self, decl: ModuleDecl) -> Result<ModuleId> {
        if self.by_name.contains_key(decl.name()) {
            return Err(config_invalid(format!(
                "module {:?} registered twice",
                decl.name()
            )));
        }
        let id = ModuleId(self.modules.len());
        self.by_name.insert(decl.name().to_string(), id);
        self.modules.push(decl);
        self.variants.push(Vec::new());
        Ok(id)
    }

    pub fn module(&self, id: ModuleId) -> &ModuleDecl {
        &self.modules[id.0]
    }

    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    pub fn module_ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        (0..self.modules.len()).map(ModuleId)
    }

    /// Create a new variant node of `module`
    pub fn create_variant(&mut self, module: ModuleId, variation: Variation) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            module,
            variation,
            edges: Vec::new(),
        });
        self.variants[module.0].push(id);
        id
    }

    /// Live variants of a module, in creation order
    pub fn variants(&self, module: ModuleId) -> &[NodeId] {
        &self.variants[module.0]
    }

    pub fn node_module(&self, node: NodeId) -> ModuleId {
        self.nodes[node.0].module
    }

    pub fn decl(&self, node: NodeId) -> &ModuleDecl {
        self.module(self.node_module(node))
    }

    pub fn name(&self, node: NodeId) -> &str {
        self.decl(node).name()
    }

    pub fn variation(&self, node: NodeId) -> &Variation {
        &self.nodes[node.0].variation
    }

    pub fn edges(&self, node: NodeId) -> &[Edge] {
        &self.nodes[node.0].edges
    }

    /// Every live node, in creation order
    pub fn live_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.variants.iter().flatten().copied().collect();
        nodes.sort();
        nodes
    }

    /// Find the variant of `module` at `variation`, following aliases
    pub fn find_variant(&self, module: ModuleId, variation: &Variation) -> Option<NodeId> {
        self.variants(module)
            .iter()
            .copied()
            .find(|node| self.variation(*node) == variation)
            .or_else(|| self.aliases.get(&(module, variation.clone())).copied())
    }

    /// Resolve the variant a far-variation edge would point at
    ///
    /// # Errors
    ///
    /// Returns an error when the dependency is undefined or has no matching variant.
    pub fn resolve(
        &self,
        from: &str,
        dependency: &str,
        selector: VariationSelector,
    ) -> Result<NodeId> {
        let module = self
            .module_id(dependency)
            .ok_or_else(|| dependency_not_found(from, dependency))?;
        let found = match selector {
            VariationSelector::Any => self.variants(module).first().copied(),
            VariationSelector::Common => self.find_variant(module, &Variation::common()),
            VariationSelector::Target(target) => {
                self.find_variant(module, &Variation::arch(target))
            }
        };
        found.ok_or_else(|| variation_not_found(from, dependency, selector.to_string()))
    }

    /// Declare an edge from `from` to the variant of `dependency` picked by `selector`
    ///
    /// # Errors
    ///
    /// Returns an error when the dependency cannot be resolved.
    pub fn declare_edge(
        &mut self,
        from: NodeId,
        dependency: &str,
        tag: DependencyTag,
        selector: VariationSelector,
    ) -> Result<NodeId> {
        let to = self.resolve(self.name(from), dependency, selector)?;
        self.add_edge(from, to, tag);
        Ok(to)
    }

    /// Add an edge between two known nodes
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, tag: DependencyTag) {
        self.nodes[from.0].edges.push(Edge { to, tag });
    }

    /// Create one new variant of `node` per bundle variation name
    ///
    /// The new variants copy the outgoing edges of `node`; `node` itself stays
    /// live as the platform variant. Incoming edges are not touched, see
    /// [`ModuleGraph::retarget_edges`].
    pub fn create_variations(&mut self, node: NodeId, names: &[String]) -> Vec<NodeId> {
        let module = self.node_module(node);
        let base = self.variation(node).clone();
        let edges = self.edges(node).to_vec();
        names
            .iter()
            .map(|name| {
                let created = self.create_variant(module, base.with_apex(name.clone()));
                self.nodes[created.0].edges.clone_from(&edges);
                created
            })
            .collect()
    }

    /// Move a node onto a bundle variation in place
    pub fn rename_variation(&mut self, node: NodeId, apex: &str) {
        let renamed = self.variation(node).with_apex(apex);
        self.nodes[node.0].variation = renamed;
    }

    /// Make lookups of `variation` on `module` resolve to `target`
    pub fn create_alias(&mut self, module: ModuleId, variation: Variation, target: NodeId) {
        self.aliases.insert((module, variation), target);
    }

    /// Rewrite the destination of every edge of every live node
    ///
    /// `retarget` receives the source node and the current edge; returning
    /// `None` drops the edge.
    pub fn retarget_edges<F>(&mut self, mut retarget: F)
    where
        F: FnMut(&ModuleGraph, NodeId, &Edge) -> Option<NodeId>,
    {
        for node in self.live_nodes() {
            let current = self.nodes[node.0].edges.clone();
            let rewritten = current
                .iter()
                .filter_map(|edge| {
                    retarget(self, node, edge).map(|to| Edge { to, tag: edge.tag })
                })
                .collect();
            self.nodes[node.0].edges = rewritten;
        }
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.variants.iter().map(Vec::len).sum()
    }
}
