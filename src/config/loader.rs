//! Loading module definition files from a graph directory

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use super::{ModuleDecl, ProductConfig};
use crate::error::{
    Result, config_invalid, config_not_found, config_parse_failed, config_read_failed,
};

/// Contents of one module definition file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GraphFile {
    product: Option<ProductConfig>,
    modules: Vec<ModuleDecl>,
}

/// The whole declared graph: product configuration plus every module
#[derive(Debug, Clone, Default)]
pub struct GraphConfig {
    pub product: ProductConfig,
    pub modules: Vec<ModuleDecl>,
}

fn is_definition_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

impl GraphConfig {
    /// Parse a single module definition document
    ///
    /// # Errors
    ///
    /// Returns an error when the YAML is malformed or a module name repeats.
    #[cfg(test)]
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut origins = HashMap::new();
        config.absorb(parse_file(yaml, "<inline>")?, "<inline>", &mut origins, &mut false)?;
        config.product.validate()?;
        Ok(config)
    }

    /// Load every `*.yaml` / `*.yml` file below `dir`, in path order
    ///
    /// # Errors
    ///
    /// Returns an error when the directory is missing, a file cannot be read or
    /// parsed, two files define `product`, or a module name repeats.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(config_not_found(dir.display().to_string()));
        }

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(dir).follow_links(true) {
            let entry = entry.map_err(|e| config_read_failed(dir.display().to_string(), e.to_string()))?;
            if entry.file_type().is_file() && is_definition_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();

        let mut config = Self::default();
        let mut origins = HashMap::new();
        let mut product_seen = false;
        for path in &files {
            let shown = path.display().to_string();
            let text = std::fs::read_to_string(path)
                .map_err(|e| config_read_failed(&shown, e.to_string()))?;
            debug!(file = %shown, "loading module definitions");
            config.absorb(parse_file(&text, &shown)?, &shown, &mut origins, &mut product_seen)?;
        }
        config.product.validate()?;
        Ok(config)
    }

    fn absorb(
        &mut self,
        file: GraphFile,
        origin: &str,
        origins: &mut HashMap<String, String>,
        product_seen: &mut bool,
    ) -> Result<()> {
        if let Some(product) = file.product {
            if *product_seen {
                return Err(config_invalid(format!(
                    "second product block in {origin}; only one file may define it"
                )));
            }
            *product_seen = true;
            self.product = product;
        }
        for module in file.modules {
            if let Some(first) = origins.get(module.name()) {
                return Err(config_invalid(format!(
                    "module {:?} defined twice ({first} and {origin})",
                    module.name()
                )));
            }
            origins.insert(module.name().to_string(), origin.to_string());
            self.modules.push(module);
        }
        Ok(())
    }
}

fn parse_file(text: &str, origin: &str) -> Result<GraphFile> {
    if text.trim().is_empty() {
        return Ok(GraphFile::default());
    }
    serde_yaml::from_str(text).map_err(|e| config_parse_failed(origin, e.to_string()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ApexError;

    fn write(dir: &Path, name: &str, text: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn test_load_dir_merges_files() {
        let temp = tempfile::TempDir::new().unwrap();
        write(
            temp.path(),
            "product.yaml",
            "product:\n  device_targets: [arm64]\n",
        );
        write(
            temp.path(),
            "libs/foo.yml",
            "modules:\n  - kind: cc_library\n    name: libfoo\n",
        );
        write(temp.path(), "README.md", "not a definition file");

        let config = GraphConfig::load_dir(temp.path()).expect("loads");
        assert_eq!(config.product.device_targets, vec!["arm64".to_string()]);
        assert_eq!(config.modules.len(), 1);
        assert_eq!(config.modules[0].name(), "libfoo");
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let module = "modules:\n  - kind: cc_library\n    name: libfoo\n";
        write(temp.path(), "a.yaml", module);
        write(temp.path(), "b.yaml", module);

        let err = GraphConfig::load_dir(temp.path()).unwrap_err();
        assert!(err.to_string().contains("defined twice"));
    }

    #[test]
    fn test_second_product_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        write(temp.path(), "a.yaml", "product:\n  host: false\n");
        write(temp.path(), "b.yaml", "product:\n  host: true\n");

        assert!(GraphConfig::load_dir(temp.path()).is_err());
    }

    #[test]
    fn test_missing_dir() {
        let err = GraphConfig::load_dir(Path::new("/nonexistent/graph")).unwrap_err();
        assert!(matches!(err, ApexError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_parse_error_names_file() {
        let temp = tempfile::TempDir::new().unwrap();
        write(temp.path(), "broken.yaml", "modules: [unclosed");

        let err = GraphConfig::load_dir(temp.path()).unwrap_err();
        match err {
            ApexError::ConfigParseFailed { path, .. } => assert!(path.ends_with("broken.yaml")),
            other => panic!("unexpected error {other}"),
        }
    }
}
