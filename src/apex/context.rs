//! Per-bundle view over the prepared graph

use super::PreparedGraph;
use super::deps::DeclaredBundle;
use super::membership::{ApexContents, ApexInfo, uses_vndk};
use crate::config::{BundleConfig, ModuleDecl, ProductConfig};
use crate::graph::ModuleGraph;

/// Everything the per-bundle phases read about one bundle
#[derive(Clone, Copy)]
pub struct BundleContext<'a> {
    pub prepared: &'a PreparedGraph,
    pub graph: &'a ModuleGraph,
    pub product: &'a ProductConfig,
    pub bundle: &'a DeclaredBundle,
    pub decl: &'a ModuleDecl,
    pub config: &'a BundleConfig,
    pub contents: &'a ApexContents,
    pub info: &'a ApexInfo,
}

impl<'a> BundleContext<'a> {
    /// `None` when the bundle has no published membership
    pub fn new(
        prepared: &'a PreparedGraph,
        product: &'a ProductConfig,
        bundle: &'a DeclaredBundle,
    ) -> Option<Self> {
        let graph = &prepared.graph;
        let decl = graph.decl(bundle.node);
        let (config, _) = decl.bundle()?;
        let contents = prepared.tables.contents.get(&bundle.name)?;
        let info = prepared.tables.infos.get(&bundle.name)?;
        Some(Self {
            prepared,
            graph,
            product,
            bundle,
            decl,
            config,
            contents,
            info,
        })
    }

    pub fn name(&self) -> &'a str {
        &self.bundle.name
    }

    pub fn is_host(&self) -> bool {
        self.product.host
    }

    pub fn is_vendor(&self) -> bool {
        self.decl.common.vendor
    }

    /// Product-specific bundle on a product with an enforced partition interface
    pub fn is_enforced_product(&self) -> bool {
        self.decl.common.product_specific && self.product.enforce_product_partition_interface
    }

    pub fn uses_vndk(&self) -> bool {
        uses_vndk(self.decl, self.product)
    }
}
