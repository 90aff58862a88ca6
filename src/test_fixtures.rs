//! Shared graph builders for unit tests
//!
//! Tests describe a graph inline as YAML and pick how far to run it:
//!
//! ```ignore
//! // Registered and declared only, membership on demand
//! let fixture = Fixture::load(yaml);
//! let tables = fixture.membership();
//!
//! // Every graph phase, ready for per-bundle work
//! let prepared = Prepared::load(yaml);
//! let classified = prepared.classify("com.x.y");
//! ```

#![allow(clippy::expect_used, clippy::panic)]

use std::collections::BTreeSet;

use crate::apex::classify::{Classified, classify};
use crate::apex::deps::{self, DeclaredBundles};
use crate::apex::membership::{self, MembershipTables};
use crate::apex::{BundleContext, NoopObserver, PreparedGraph, prepare};
use crate::config::GraphConfig;
use crate::domain::Target;
use crate::graph::{ModuleGraph, register};

/// Parse an inline module definition document
///
/// # Panics
///
/// Panics if the YAML does not describe a valid graph.
pub fn load_config(yaml: &str) -> GraphConfig {
    GraphConfig::from_yaml(yaml).expect("Failed to parse test graph")
}

/// A graph with its bundle edges declared
pub struct Fixture {
    pub config: GraphConfig,
    pub targets: Vec<Target>,
    pub graph: ModuleGraph,
    pub declared: DeclaredBundles,
}

impl Fixture {
    /// # Panics
    ///
    /// Panics if registration or edge declaration fails.
    pub fn load(yaml: &str) -> Self {
        let config = load_config(yaml);
        let targets = config.product.targets().expect("Failed to select targets");
        let mut graph = register(&config, &targets).expect("Failed to register modules");
        let declared = deps::declare(&mut graph, &config.product, &targets)
            .expect("Failed to declare bundle dependencies");
        Self {
            config,
            targets,
            graph,
            declared,
        }
    }

    /// Run the membership walk for every bundle that declared cleanly
    ///
    /// # Panics
    ///
    /// Panics if a side table is published twice.
    pub fn membership(&self) -> MembershipTables {
        let failed: BTreeSet<String> = self.declared.failures.keys().cloned().collect();
        membership::walk(
            &self.graph,
            &self.declared.bundles,
            &failed,
            &self.config.product,
        )
        .expect("Failed to walk bundle membership")
    }
}

/// A graph that went through every graph phase
pub struct Prepared {
    pub config: GraphConfig,
    pub prepared: PreparedGraph,
}

impl Prepared {
    /// # Panics
    ///
    /// Panics if any graph phase fails.
    pub fn load(yaml: &str) -> Self {
        let config = load_config(yaml);
        let prepared = prepare(&config, &NoopObserver).expect("Failed to prepare graph");
        Self { config, prepared }
    }

    /// # Panics
    ///
    /// Panics if the bundle is unknown or has no membership.
    pub fn context(&self, bundle: &str) -> BundleContext<'_> {
        let declared = self
            .prepared
            .bundle(bundle)
            .unwrap_or_else(|| panic!("no bundle named {bundle}"));
        BundleContext::new(&self.prepared, &self.config.product, declared)
            .expect("Bundle has no membership")
    }

    pub fn classify(&self, bundle: &str) -> Classified {
        classify(&self.context(bundle))
    }
}
