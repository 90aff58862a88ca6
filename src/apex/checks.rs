//! Bundle invariant checks
//!
//! Each check is an independent read-only walk. Every violation is collected,
//! so one run reports all problems of a bundle together.

use tracing::debug;

use super::baseline::baseline_apex_available;
use super::context::BundleContext;
use crate::config::ModuleKind;
use crate::domain::{ApexDepTag, DependencyTag, TargetCapabilities};
use crate::error::{
    ApexError, min_sdk_missing, min_sdk_too_high, module_error, not_available, property_error,
    static_executable, stub_static_link,
};
use crate::graph::{NodeId, Step, path_string, walk_deps};

const RUNTIME_APEX: &str = "com.android.runtime";

/// Run every check against one bundle, in a fixed order
pub fn run_checks(ctx: &BundleContext<'_>) -> Vec<ApexError> {
    let mut errors = Vec::new();
    check_availability(ctx, &mut errors);
    check_updatable(ctx, &mut errors);
    check_min_sdk(ctx, &mut errors);
    check_stub_static_links(ctx, &mut errors);
    check_static_executables(ctx, &mut errors);
    check_tests_property(ctx, &mut errors);
    check_updatable_apps(ctx, &mut errors);
    debug!(bundle = %ctx.name(), violations = errors.len(), "checks finished");
    errors
}

/// Walk the payload dependencies of the bundle
///
/// `visit` receives each payload edge and whether its child lives outside
/// the bundle (no variant built for it).
fn walk_payload<F>(ctx: &BundleContext<'_>, mut visit: F)
where
    F: FnMut(&Step<'_>, bool) -> bool,
{
    let graph = ctx.graph;
    walk_deps(graph, ctx.bundle.node, |step| {
        if step.tag.excluded_from_contents() || !step.tag.is_payload() {
            return false;
        }
        if !graph.decl(step.child).can_have_apex_variants() {
            return false;
        }
        let external = ctx
            .prepared
            .apex_infos
            .get(&step.child)
            .is_none_or(|info| !info.in_apex_variants.iter().any(|b| b == ctx.name()));
        visit(step, external)
    });
}

fn same_container(ctx: &BundleContext<'_>, step: &Step<'_>) -> bool {
    ctx.graph
        .decl(step.parent)
        .depends_in_same_container(ctx.graph.decl(step.child), step.tag)
}

fn check_availability(ctx: &BundleContext<'_>, errors: &mut Vec<ApexError>) {
    if ctx.is_host()
        || ctx.bundle.is_test
        || ctx.is_vendor()
        || ctx.is_enforced_product()
        || ctx.product.native_coverage
    {
        return;
    }
    let graph = ctx.graph;
    walk_payload(ctx, |step, external| {
        if external || !same_container(ctx, step) {
            return false;
        }
        let to = graph.decl(step.child);
        if to.available_for(ctx.name()) || baseline_apex_available(ctx.name(), to.name()) {
            return true;
        }
        errors.push(not_available(
            ctx.name(),
            graph.name(step.parent),
            to.name(),
            path_string(graph, step.path()),
        ));
        true
    });
}

fn direct_children<'a>(
    ctx: &BundleContext<'a>,
    tag: ApexDepTag,
) -> impl Iterator<Item = NodeId> + 'a {
    ctx.graph
        .edges(ctx.bundle.node)
        .iter()
        .filter(move |edge| edge.tag == DependencyTag::Apex(tag))
        .map(|edge| edge.to)
}

fn check_updatable(ctx: &BundleContext<'_>, errors: &mut Vec<ApexError>) {
    let config = ctx.config;
    if !config.is_updatable() {
        return;
    }
    let name = ctx.name();
    if ctx.decl.common.min_sdk_version.is_none() {
        errors.push(property_error(
            name,
            "updatable",
            "updatable APEXes should set min_sdk_version as well",
        ));
    }
    if config.platform_apis {
        errors.push(property_error(
            name,
            "updatable",
            "updatable APEXes can't use platform APIs",
        ));
    }
    if config.use_vndk_as_stable {
        errors.push(property_error(
            name,
            "use_vndk_as_stable",
            "updatable APEXes can't use external VNDK libs",
        ));
    }
    if config.future_updatable {
        errors.push(property_error(
            name,
            "future_updatable",
            "Already updatable. Remove `future_updatable: true:`",
        ));
    }

    let fragments = direct_children(ctx, ApexDepTag::BootclasspathFragment)
        .chain(direct_children(ctx, ApexDepTag::SystemServerClasspathFragment));
    for node in fragments {
        let fragment = ctx.graph.decl(node);
        let generates = match &fragment.kind {
            ModuleKind::BootclasspathFragment(props)
            | ModuleKind::SystemserverclasspathFragment(props) => {
                props.generates_classpaths_proto()
            }
            _ => true,
        };
        if !generates {
            errors.push(module_error(
                fragment.name(),
                format!(
                    "is included in updatable apex {name}, it must not set generate_classpaths_proto to false"
                ),
            ));
        }
    }
}

fn check_min_sdk(ctx: &BundleContext<'_>, errors: &mut Vec<ApexError>) {
    let bundle_min = ctx.info.min_sdk;
    if ctx.bundle.is_test || bundle_min.is_future() {
        return;
    }
    let graph = ctx.graph;
    walk_payload(ctx, |step, external| {
        if external || !same_container(ctx, step) {
            return false;
        }
        let to = graph.decl(step.child);
        let path = || path_string(graph, step.path());
        match to.min_sdk() {
            Ok(Some(level)) if level <= bundle_min => true,
            Ok(Some(level)) => {
                errors.push(min_sdk_too_high(
                    ctx.name(),
                    to.name(),
                    level.to_string(),
                    bundle_min.to_string(),
                    path(),
                ));
                false
            }
            Ok(None) => {
                errors.push(min_sdk_missing(
                    ctx.name(),
                    to.name(),
                    bundle_min.to_string(),
                    path(),
                ));
                false
            }
            Err(reason) => {
                errors.push(property_error(to.name(), "min_sdk_version", reason));
                false
            }
        }
    });
}

fn check_stub_static_links(ctx: &BundleContext<'_>, errors: &mut Vec<ApexError>) {
    if ctx.is_host() || ctx.bundle.is_test {
        return;
    }
    let graph = ctx.graph;
    walk_payload(ctx, |step, external| {
        let to = graph.decl(step.child);
        if !matches!(
            to.kind,
            ModuleKind::CcLibrary(_) | ModuleKind::CcBinary(_) | ModuleKind::CcTest(_)
        ) {
            return true;
        }
        if !same_container(ctx, step) {
            return false;
        }
        let from = graph.name(step.parent);
        if ctx.name() == RUNTIME_APEX && matches!(from, "linker" | "crash_dump" | "linkerconfig") {
            return false;
        }
        if to.has_stubs() && !ctx.contents.directly_contains(to.name()) && !external {
            errors.push(stub_static_link(
                ctx.name(),
                from,
                to.name(),
                path_string(graph, step.path()),
            ));
        }
        true
    });
}

fn check_static_executables(ctx: &BundleContext<'_>, errors: &mut Vec<ApexError>) {
    if ctx.is_host() {
        return;
    }
    for node in direct_children(ctx, ApexDepTag::Executable) {
        let executable = ctx.graph.decl(node);
        if !executable.is_static_executable() {
            continue;
        }
        let allowed =
            ctx.name() == RUNTIME_APEX && matches!(executable.name(), "linker" | "linkerconfig");
        if !allowed {
            errors.push(static_executable(ctx.name(), executable.name()));
        }
    }
}

fn check_tests_property(ctx: &BundleContext<'_>, errors: &mut Vec<ApexError>) {
    if !ctx.config.tests.is_empty() && !ctx.bundle.is_test {
        errors.push(property_error(
            ctx.name(),
            "tests",
            "property allowed only in apex_test module type",
        ));
    }
}

fn check_updatable_apps(ctx: &BundleContext<'_>, errors: &mut Vec<ApexError>) {
    for node in direct_children(ctx, ApexDepTag::AndroidApp) {
        let app = ctx.graph.decl(node);
        if ctx.prepared.tables.updatable_apps.contains(app.name())
            && app.common.min_sdk_version.is_none()
        {
            errors.push(module_error(
                app.name(),
                "updatable apps must set min_sdk_version.",
            ));
        }
    }
}
