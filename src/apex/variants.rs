//! Bundle variant creation
//!
//! Bottom-up: every node marked as built for one or more bundles gets one new
//! variant per group of bundles that need identical builds of it. Bundles
//! share a variant when their (min_sdk, updatable, platform_apis) settings and
//! the variants of every dependency agree. The original node stays behind as
//! the platform variant.
//!
//! Bundle nodes themselves move onto their own variation; bundles with an
//! alias prefix keep the default variation resolvable through an alias.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use super::deps::DeclaredBundle;
use super::membership::MembershipTables;
use crate::config::ProductConfig;
use crate::domain::{ApiLevel, DependencyTag};
use crate::error::Result;
use crate::graph::{Frozen, ModuleGraph, NodeId, ProviderTable, Variation, topological_order};

/// Bundle settings a created variant is built with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeApexInfo {
    pub variation: String,
    pub in_apex_variants: Vec<String>,
    pub min_sdk: ApiLevel,
    pub updatable: bool,
    pub platform_apis: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VariantKey {
    min_sdk: ApiLevel,
    updatable: bool,
    platform_apis: bool,
    children: Vec<String>,
}

/// Name each group's variation, making merged names unique per module
fn variation_names(groups: &[(VariantKey, Vec<String>)]) -> Vec<String> {
    let mut used: Vec<String> = Vec::new();
    for (key, bundles) in groups {
        let name = match bundles.as_slice() {
            [single] => single.clone(),
            _ => {
                let base = format!("apex{}", key.min_sdk.number());
                let mut candidate = base.clone();
                let mut n = 1;
                while used.contains(&candidate) {
                    candidate = format!("{base}_{n}");
                    n += 1;
                }
                candidate
            }
        };
        used.push(name);
    }
    used
}

/// Split marked nodes into bundle variants and re-point edges at them
///
/// # Errors
///
/// Returns an error when the graph has a cycle or a node is published twice.
pub fn create(
    graph: &mut ModuleGraph,
    bundles: &[DeclaredBundle],
    membership: &MembershipTables,
    product: &ProductConfig,
) -> Result<Frozen<NodeId, NodeApexInfo>> {
    let order = topological_order(graph)?;
    let bundle_nodes: HashMap<NodeId, &str> = bundles
        .iter()
        .map(|bundle| (bundle.node, bundle.name.as_str()))
        .collect();

    let mut published = ProviderTable::new("apex");
    // original node -> bundle -> variation name / created node
    let mut variant_names: HashMap<NodeId, HashMap<String, String>> = HashMap::new();
    let mut created: HashMap<NodeId, HashMap<String, NodeId>> = HashMap::new();
    // node -> bundles whose edges it follows
    let mut owners: HashMap<NodeId, Vec<String>> = HashMap::new();

    for node in order {
        if let Some(bundle) = bundle_nodes.get(&node) {
            graph.rename_variation(node, bundle);
            if product.needs_default_alias(bundle) {
                graph.create_alias(graph.node_module(node), Variation::common(), node);
            }
            owners.insert(node, vec![(*bundle).to_string()]);
            continue;
        }

        let Some(marks) = membership.build_for.get(&node) else {
            continue;
        };

        let mut groups: Vec<(VariantKey, Vec<String>)> = Vec::new();
        for bundle in marks {
            let Some(info) = membership.infos.get(bundle) else {
                continue;
            };
            let children = graph
                .edges(node)
                .iter()
                .map(|edge| {
                    variant_names
                        .get(&edge.to)
                        .and_then(|names| names.get(bundle))
                        .cloned()
                        .unwrap_or_default()
                })
                .collect();
            let key = VariantKey {
                min_sdk: info.min_sdk,
                updatable: info.updatable,
                platform_apis: info.platform_apis,
                children,
            };
            match groups.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, members)) => members.push(bundle.clone()),
                None => groups.push((key, vec![bundle.clone()])),
            }
        }
        if groups.is_empty() {
            continue;
        }

        let names = variation_names(&groups);
        let new_nodes = graph.create_variations(node, &names);
        for (((key, members), name), new_node) in groups.into_iter().zip(names).zip(new_nodes) {
            debug!(
                module = %graph.name(node),
                variation = %graph.variation(new_node),
                bundles = ?members,
                "created bundle variant"
            );
            for bundle in &members {
                variant_names
                    .entry(node)
                    .or_default()
                    .insert(bundle.clone(), name.clone());
                created.entry(node).or_default().insert(bundle.clone(), new_node);
            }
            owners.insert(new_node, members.clone());
            published.publish(
                new_node,
                NodeApexInfo {
                    variation: name,
                    in_apex_variants: members,
                    min_sdk: key.min_sdk,
                    updatable: key.updatable,
                    platform_apis: key.platform_apis,
                },
            )?;
        }
    }

    graph.retarget_edges(|_, node, edge| {
        if edge.tag == DependencyTag::TestFor {
            return Some(edge.to);
        }
        let Some(bundles) = owners.get(&node) else {
            return Some(edge.to);
        };
        let variant = created
            .get(&edge.to)
            .and_then(|per_bundle| bundles.iter().find_map(|b| per_bundle.get(b)))
            .copied();
        Some(variant.unwrap_or(edge.to))
    });

    let infos = published.freeze();
    info!(variants = infos.len(), nodes = graph.node_count(), "bundle variants created");
    Ok(infos)
}
