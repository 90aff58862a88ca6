//! Dynamic common library trimming

use super::context::BundleContext;
use crate::domain::{ApexDepTag, DependencyTag};
use crate::error::{ApexError, multiple_trim_against};

/// Shared libraries the bundle may drop in favour of its DCLA provider
///
/// # Errors
///
/// Returns an internal consistency error when the bundle trims against more
/// than one provider.
pub fn libs_to_trim(ctx: &BundleContext<'_>) -> Result<Vec<String>, ApexError> {
    if !ctx.product.apex_trim_enabled {
        return Ok(Vec::new());
    }
    let providers: Vec<&str> = ctx
        .graph
        .edges(ctx.bundle.node)
        .iter()
        .filter(|edge| edge.tag == DependencyTag::Apex(ApexDepTag::Dcla))
        .map(|edge| ctx.graph.name(edge.to))
        .collect();
    match providers.as_slice() {
        [] => Ok(Vec::new()),
        [provider] => Ok(ctx
            .prepared
            .tables
            .dcla_provided
            .get(&(*provider).to_string())
            .cloned()
            .unwrap_or_default()),
        _ => Err(multiple_trim_against(ctx.name(), providers.len())),
    }
}
