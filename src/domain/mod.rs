//! Domain models for apexdeps
//!
//! This module contains the vocabulary shared by every pipeline phase: compile
//! targets, API levels, dependency tags and the capability surface of declared
//! modules.

pub mod api_level;
pub mod arch;
pub mod capability;
pub mod tag;

pub use api_level::ApiLevel;
pub use arch::{ArchType, CompileMultilib, Multilib, OsType, Target};
pub use capability::{
    AVAILABLE_TO_ANY_APEX, AVAILABLE_TO_PLATFORM, EdgeTarget, TargetCapabilities, VariantPolicy,
    is_bootstrap,
};
pub use tag::{ApexDepTag, DependencyTag, LinkKind};
