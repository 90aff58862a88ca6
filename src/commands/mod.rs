//! Command implementations for the apexdeps CLI

pub mod check;
pub mod completions;
pub mod contents;
pub mod helpers;
pub mod plan;
pub mod version;
