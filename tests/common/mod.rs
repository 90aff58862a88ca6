//! Common test utilities for apexdeps integration tests

use std::path::PathBuf;
use tempfile::TempDir;

/// A directory holding module definition files
pub struct TestWorkspace {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to the graph root
    pub path: PathBuf,
}

impl TestWorkspace {
    /// Create a new, empty graph directory
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Create a graph directory with one definition file
    pub fn with_graph(yaml: &str) -> Self {
        let workspace = Self::new();
        workspace.write_file("modules.yaml", yaml);
        workspace
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }
}

/// Run the real binary against a workspace
#[allow(deprecated)]
pub fn apexdeps_cmd(workspace: &TestWorkspace) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("apexdeps").expect("binary is built");
    cmd.arg("--graph")
        .arg(&workspace.path)
        .env_remove("APEXDEPS_GRAPH")
        .env_remove("APEXDEPS_LOG");
    cmd
}
