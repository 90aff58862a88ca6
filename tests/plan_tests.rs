//! End-to-end planning scenarios through `apexdeps plan --json`

mod common;

use common::{TestWorkspace, apexdeps_cmd};
use predicates::prelude::*;
use serde_json::Value;

const HEADER: &str = r"
product:
  device_targets: [arm64, arm]
modules:
  - kind: apex_key
    name: com.x.y.key
";

fn plan_json(yaml: &str) -> Value {
    let workspace = TestWorkspace::with_graph(&format!("{HEADER}{yaml}"));
    let output = apexdeps_cmd(&workspace)
        .args(["plan", "--json"])
        .output()
        .expect("Failed to run apexdeps");
    serde_json::from_slice(&output.stdout).expect("plan output is JSON")
}

fn bundle_plan<'a>(report: &'a Value, name: &str) -> &'a Value {
    report["plans"]
        .as_array()
        .unwrap()
        .iter()
        .find(|plan| plan["name"] == name)
        .unwrap_or_else(|| panic!("no plan for {name}: {report}"))
}

/// (install_dir, module) of every packaged file of one class
fn files_of(plan: &Value, class: &str) -> Vec<(String, String)> {
    let mut files: Vec<(String, String)> = plan["files"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|file| file["class"] == class)
        .map(|file| {
            (
                file["install_dir"].as_str().unwrap().to_string(),
                file["module_name"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    files.sort();
    files
}

fn strings(value: &Value) -> Vec<&str> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

#[test]
fn test_unqualified_library_packaged_for_both_architectures() {
    let report = plan_json(
        r"
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    updatable: false
    native_shared_libs: [libfoo]
  - kind: cc_library
    name: libfoo
    apex_available: [com.x.y]
",
    );
    let plan = bundle_plan(&report, "com.x.y");
    let libs = files_of(plan, "native_shared_lib");
    assert_eq!(libs.len(), 2, "{libs:?}");
    assert_eq!(libs[0].0, "lib");
    assert_eq!(libs[1].0, "lib64");
    assert!(libs.iter().all(|(_, module)| module.starts_with("libfoo")));
    assert!(strings(&plan["provide_native_libs"]).is_empty());
}

#[test]
fn test_binary_packaged_for_primary_architecture_only() {
    let report = plan_json(
        r"
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    updatable: false
    binaries: [toolA]
  - kind: cc_binary
    name: toolA
    apex_available: [com.x.y]
",
    );
    let plan = bundle_plan(&report, "com.x.y");
    let executables = files_of(plan, "native_executable");
    assert_eq!(executables.len(), 1, "{executables:?}");
    assert_eq!(executables[0].0, "bin");
}

#[test]
fn test_indirect_stub_library_is_required_not_packaged() {
    let report = plan_json(
        r"
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    updatable: false
    native_shared_libs: [libfoo]
  - kind: cc_library
    name: libfoo
    shared_libs: [libstub]
    apex_available: [com.x.y]
  - kind: cc_library
    name: libstub
    stubs: true
",
    );
    let plan = bundle_plan(&report, "com.x.y");
    let packaged: Vec<&str> = plan["files"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|file| file["module_name"].as_str())
        .collect();
    assert!(!packaged.iter().any(|m| m.starts_with("libstub")), "{packaged:?}");
    assert_eq!(strings(&plan["require_native_libs"]), vec!["libstub.so"]);
    assert!(strings(&plan["make_modules_to_install"]).contains(&"libstub"));
}

#[test]
fn test_updatable_without_min_sdk_fails_bundle() {
    let workspace = TestWorkspace::with_graph(&format!(
        "{HEADER}{}",
        r"
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    updatable: true
"
    ));
    apexdeps_cmd(&workspace)
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("property \"updatable\""))
        .stderr(predicate::str::contains(
            "updatable APEXes should set min_sdk_version as well",
        ));

    let report = plan_json(
        r"
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    updatable: true
",
    );
    assert!(report["plans"].as_array().unwrap().is_empty());
    assert_eq!(report["failed"][0]["bundle"], "com.x.y");
}

#[test]
fn test_stable_vndk_library_is_not_a_member() {
    let report = plan_json(
        r"
  - kind: apex
    name: com.vendor.x
    key: com.x.y.key
    updatable: false
    vendor: true
    use_vndk_as_stable: true
    native_shared_libs: [libfoo]
  - kind: cc_library
    name: libfoo
    vendor: true
    shared_libs: [libvndk]
  - kind: cc_library
    name: libvndk
    vndk: true
",
    );
    let plan = bundle_plan(&report, "com.vendor.x");
    let packaged: Vec<&str> = plan["files"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|file| file["module_name"].as_str())
        .collect();
    assert!(packaged.iter().any(|m| m.starts_with("libfoo")));
    assert!(!packaged.iter().any(|m| m.starts_with("libvndk")), "{packaged:?}");
    assert_eq!(plan["packaging"]["variants"][0]["partition"], "vendor");
}

#[test]
fn test_plan_is_deterministic() {
    let yaml = r"
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    updatable: false
    native_shared_libs: [libfoo]
  - kind: cc_library
    name: libfoo
    shared_libs: [libbar]
    apex_available: [com.x.y]
  - kind: cc_library
    name: libbar
    apex_available: [com.x.y]
";
    let first = plan_json(yaml);
    let second = plan_json(yaml);
    assert_eq!(first, second);
    let digest = bundle_plan(&first, "com.x.y")["digest"].as_str().unwrap().to_string();
    assert!(digest.starts_with("blake3:"));
}

#[test]
fn test_test_module_sees_bundle_contents() {
    let report = plan_json(
        r"
  - kind: apex
    name: com.x.y
    key: com.x.y.key
    updatable: false
    native_shared_libs: [libfoo]
  - kind: cc_library
    name: libfoo
    apex_available: [com.x.y]
  - kind: cc_test
    name: footest
    test_for: [com.x.y]
",
    );
    let info = &report["test_for"]["footest"];
    assert_eq!(strings(&info["bundles"]), vec!["com.x.y"]);
    assert_eq!(strings(&info["visible"]), vec!["libfoo"]);

    // com.x.y has no default-variation alias once it moves onto its own variant
    let warnings = strings(&report["warnings"]);
    assert!(
        warnings.iter().any(|w| w.contains("test_for of footest on com.x.y")),
        "{warnings:?}"
    );
}
