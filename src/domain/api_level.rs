//! Platform API levels used by min_sdk_version checks

use std::fmt;

use serde::{Serialize, Serializer};

/// A platform API level. Unreleased codenames and "current" map to [`ApiLevel::FUTURE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiLevel(u32);

const CODENAMES: &[(&str, u32)] = &[
    ("Q", 29),
    ("R", 30),
    ("S", 31),
    ("Sv2", 32),
    ("Tiramisu", 33),
    ("UpsideDownCake", 34),
];

impl ApiLevel {
    /// Level used for code built against the in-development platform
    pub const FUTURE: ApiLevel = ApiLevel(10_000);

    pub fn new(level: u32) -> Self {
        Self(level)
    }

    /// Parses a min_sdk_version value.
    ///
    /// # Errors
    ///
    /// Returns a message when the value is neither a number, a known codename
    /// nor "current".
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        let raw = raw.trim();
        if raw == "current" {
            return Ok(Self::FUTURE);
        }
        if let Ok(level) = raw.parse::<u32>() {
            return Ok(Self(level));
        }
        CODENAMES
            .iter()
            .find(|(name, _)| *name == raw)
            .map(|(_, level)| Self(*level))
            .ok_or_else(|| format!("{raw:?} is not a valid API level"))
    }

    pub fn is_future(self) -> bool {
        self == Self::FUTURE
    }

    pub fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ApiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_future() {
            f.write_str("current")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Serialize for ApiLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
