//! Module definition file handling for apexdeps
//!
//! This module contains data structures for:
//! - `product:` - Product-wide build configuration
//! - `modules:` - Declared modules, bundles among them
//!
//! A graph directory holds any number of `*.yaml` / `*.yml` module definition
//! files; [`GraphConfig::load_dir`] merges them.

pub mod bundle;
pub mod loader;
pub mod module;
pub mod product;

// Re-export commonly used types
pub use bundle::{BundleConfig, MultilibProperties, NativeDependencies, ResolvedNativeDependencies};
pub use loader::GraphConfig;
pub use module::{ApexKeyProps, Linkage, ModuleDecl, ModuleKind, NativeLinkProps};
pub use product::ProductConfig;

use serde::{Deserialize, Deserializer};

// Versions and build ids are often written unquoted.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(u64),
}

impl From<TextOrNumber> for String {
    fn from(value: TextOrNumber) -> Self {
        match value {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Number(number) => number.to_string(),
        }
    }
}

pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TextOrNumber>::deserialize(deserializer)?.map(String::from))
}

pub(crate) fn string_or_number_required<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    TextOrNumber::deserialize(deserializer).map(String::from)
}
