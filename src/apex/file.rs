//! Packaged file records

use serde::Serialize;

use super::signing::Certificate;
use crate::domain::Multilib;

/// Structural class of a packaged file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileClass {
    App,
    AppSet,
    Etc,
    GoBinary,
    JavaSharedLib,
    NativeExecutable,
    NativeSharedLib,
    NativeTest,
    PyBinary,
    ShBinary,
}

/// Join path segments, skipping empty and `.` segments
pub fn join_path(segments: &[&str]) -> String {
    segments
        .iter()
        .flat_map(|segment| segment.split('/'))
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Last component of a path
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// One file that ends up inside a bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApexFile {
    /// Name of the install module generated for the file
    pub module_name: String,
    pub built_file: String,
    /// Directory relative to the bundle root
    pub install_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_stem: Option<String>,
    pub class: FileClass,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub symlinks: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    pub transitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multilib: Option<Multilib>,
    pub is_jni: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overridden_package_name: Option<String>,
    /// The originating module may also be installed on the platform
    pub available_to_platform: bool,
    /// Installed as a symlink to the platform copy instead of a file
    pub symlink_to_system: bool,
}

impl ApexFile {
    pub fn new(
        module_name: impl Into<String>,
        built_file: impl Into<String>,
        install_dir: impl Into<String>,
        class: FileClass,
    ) -> Self {
        Self {
            module_name: module_name.into(),
            built_file: built_file.into(),
            install_dir: install_dir.into(),
            custom_stem: None,
            class,
            symlinks: Vec::new(),
            required: Vec::new(),
            transitive: false,
            multilib: None,
            is_jni: false,
            certificate: None,
            overridden_package_name: None,
            available_to_platform: false,
            symlink_to_system: false,
        }
    }

    /// Base file name inside the bundle
    pub fn stem(&self) -> &str {
        match &self.custom_stem {
            Some(stem) => stem,
            None => base_name(&self.built_file),
        }
    }

    /// Path relative to the bundle root
    pub fn path(&self) -> String {
        join_path(&[&self.install_dir, self.stem()])
    }

    /// Destination used to detect collisions, ignoring custom stems
    pub fn dest(&self) -> String {
        join_path(&[&self.install_dir, base_name(&self.built_file)])
    }

    pub fn symlink_paths(&self) -> Vec<String> {
        self.symlinks
            .iter()
            .map(|link| join_path(&[&self.install_dir, link]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path_skips_empty_and_dot() {
        assert_eq!(join_path(&["lib64", "", "libfoo.so"]), "lib64/libfoo.so");
        assert_eq!(join_path(&[".", "apex_pubkey"]), "apex_pubkey");
        assert_eq!(join_path(&["bin", "sub/dir", "tool"]), "bin/sub/dir/tool");
    }

    #[test]
    fn test_path_uses_custom_stem() {
        let mut file = ApexFile::new(
            "foo",
            "out/foo/common_com.x.y/dex/foo.jar",
            "javalib",
            FileClass::JavaSharedLib,
        );
        assert_eq!(file.path(), "javalib/foo.jar");
        file.custom_stem = Some("bar.jar".to_string());
        assert_eq!(file.path(), "javalib/bar.jar");
        assert_eq!(file.dest(), "javalib/foo.jar");
    }

    #[test]
    fn test_symlink_paths() {
        let mut file = ApexFile::new("tool", "out/tool/x/tool", "bin", FileClass::NativeExecutable);
        file.symlinks = vec!["tool2".to_string()];
        assert_eq!(file.symlink_paths(), vec!["bin/tool2".to_string()]);
    }
}
