//! Bundle dependency pipeline
//!
//! Graph phases run in a fixed order over the whole module graph; each phase
//! publishes a side table that later phases read but never rewrite:
//!
//! ```text
//! register -> declare -> membership -> test_for -> platform -> variants -> reresolve
//! ```
//!
//! Once the graph is final every bundle is planned independently. An error in
//! a graph phase aborts the run; an error in one bundle fails that bundle only.

pub mod baseline;
pub mod checks;
pub mod classify;
pub mod context;
pub mod dcla;
pub mod deps;
pub mod file;
pub mod membership;
pub mod multilib;
pub mod normalize;
pub mod packaging;
pub mod plan;
pub mod platform;
pub mod signing;
pub mod test_for;
pub mod variants;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use crate::config::GraphConfig;
use crate::error::{ApexError, Result, bundle_failed, config_invalid};
use crate::graph::{Frozen, ModuleGraph, NodeId, register};

pub use context::BundleContext;
pub use deps::DeclaredBundle;
pub use membership::MembershipTables;
pub use plan::{BundlePlan, build_plan};
pub use platform::PlatformFacts;
pub use test_for::TestForInfo;
pub use variants::NodeApexInfo;

/// Graph phases in execution order
pub const PHASES: &[&str] = &[
    "register",
    "declare",
    "membership",
    "test_for",
    "platform",
    "variants",
    "reresolve",
];

/// Receives progress notifications from the pipeline
pub trait PhaseObserver {
    fn phase_started(&self, _phase: &'static str) {}

    fn phase_finished(&self, _phase: &'static str) {}

    fn bundle_finished(&self, _bundle: &str, _ok: bool) {}
}

/// Observer that ignores every notification
pub struct NoopObserver;

impl PhaseObserver for NoopObserver {}

/// The finalized graph with every side table the per-bundle phases read
#[derive(Debug)]
pub struct PreparedGraph {
    pub graph: ModuleGraph,
    /// Every enabled bundle in name order, failed ones included
    pub bundles: Vec<DeclaredBundle>,
    pub tables: MembershipTables,
    /// Test modules and the bundle contents each may link against
    pub test_for: Frozen<String, TestForInfo>,
    pub apex_infos: Frozen<NodeId, NodeApexInfo>,
    pub platform: PlatformFacts,
    /// Bundles that already failed during a graph phase
    pub failures: BTreeMap<String, Vec<ApexError>>,
    pub warnings: Vec<String>,
}

impl PreparedGraph {
    pub fn bundle(&self, name: &str) -> Option<&DeclaredBundle> {
        self.bundles.iter().find(|bundle| bundle.name == name)
    }
}

fn phase<T>(
    observer: &dyn PhaseObserver,
    name: &'static str,
    run: impl FnOnce() -> Result<T>,
) -> Result<T> {
    observer.phase_started(name);
    let out = run()?;
    info!(phase = name, "phase finished");
    observer.phase_finished(name);
    Ok(out)
}

/// Run every graph phase
///
/// # Errors
///
/// Returns the first graph-level error: unknown targets, undefined
/// dependencies, missing variations, cycles or a doubly published table.
pub fn prepare(config: &GraphConfig, observer: &dyn PhaseObserver) -> Result<PreparedGraph> {
    let product = &config.product;
    let targets = product.targets()?;

    let mut graph = phase(observer, "register", || register(config, &targets))?;
    let declared = phase(observer, "declare", || {
        deps::declare(&mut graph, product, &targets)
    })?;
    let mut failures = declared.failures;
    let bundles = declared.bundles;

    let failed: BTreeSet<String> = failures.keys().cloned().collect();
    let mut tables = phase(observer, "membership", || {
        membership::walk(&graph, &bundles, &failed, product)
    })?;
    for (bundle, errors) in std::mem::take(&mut tables.failures) {
        failures.entry(bundle).or_default().extend(errors);
    }

    let test_for = phase(observer, "test_for", || {
        test_for::declare(&mut graph, &tables.contents)
    })?;
    let platform = phase(observer, "platform", || {
        platform::mark(&graph, &tables.contents, product.host)
    })?;
    let apex_infos = phase(observer, "variants", || {
        variants::create(&mut graph, &bundles, &tables, product)
    })?;
    let warnings = phase(observer, "reresolve", || Ok(test_for::reresolve(&mut graph)))?;
    for warning in &warnings {
        warn!("{warning}");
    }

    Ok(PreparedGraph {
        graph,
        bundles,
        tables,
        test_for,
        apex_infos,
        platform,
        failures,
        warnings,
    })
}

/// Outcome of planning one bundle
#[derive(Debug)]
pub struct BundleOutcome {
    pub name: String,
    pub result: std::result::Result<BundlePlan, ApexError>,
}

/// Result of a whole pipeline run
#[derive(Debug)]
pub struct PipelineReport {
    pub prepared: PreparedGraph,
    pub outcomes: Vec<BundleOutcome>,
}

impl PipelineReport {
    pub fn plans(&self) -> impl Iterator<Item = &BundlePlan> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ApexError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Test modules that test at least one of the planned bundles
    pub fn test_modules(&self) -> impl Iterator<Item = (&str, &TestForInfo)> {
        self.prepared
            .test_for
            .iter()
            .filter(move |(_, info)| {
                info.bundles
                    .iter()
                    .any(|bundle| self.outcomes.iter().any(|o| &o.name == bundle))
            })
            .map(|(test, info)| (test.as_str(), info))
    }
}

/// Check that every requested bundle exists
///
/// # Errors
///
/// Returns a configuration error naming the first unknown bundle.
pub fn check_selection(prepared: &PreparedGraph, selection: &[String]) -> Result<()> {
    match selection.iter().find(|name| prepared.bundle(name).is_none()) {
        Some(name) => Err(config_invalid(format!("unknown bundle {name:?}"))),
        None => Ok(()),
    }
}

/// Run the whole pipeline and plan the selected bundles
///
/// An empty selection plans every bundle.
///
/// # Errors
///
/// Returns graph-level errors and unknown bundle names. Per-bundle failures
/// are part of the report.
pub fn run(
    config: &GraphConfig,
    selection: &[String],
    observer: &dyn PhaseObserver,
) -> Result<PipelineReport> {
    let mut prepared = prepare(config, observer)?;
    check_selection(&prepared, selection)?;

    let mut failures = std::mem::take(&mut prepared.failures);
    let mut outcomes = Vec::new();
    for bundle in &prepared.bundles {
        if !selection.is_empty() && !selection.contains(&bundle.name) {
            continue;
        }
        let result = match failures.remove(&bundle.name) {
            Some(errors) => Err(bundle_failed(&bundle.name, errors)),
            None => match BundleContext::new(&prepared, &config.product, bundle) {
                Some(ctx) => build_plan(&ctx),
                None => Err(bundle_failed(&bundle.name, Vec::new())),
            },
        };
        observer.bundle_finished(&bundle.name, result.is_ok());
        outcomes.push(BundleOutcome {
            name: bundle.name.clone(),
            result,
        });
    }
    prepared.failures = failures;
    info!(bundles = outcomes.len(), "pipeline finished");
    Ok(PipelineReport { prepared, outcomes })
}
