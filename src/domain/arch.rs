//! Architectures, operating systems and compile targets

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};

/// Instruction set architecture of a compile target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchType {
    Arm,
    Arm64,
    Riscv64,
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
}

impl ArchType {
    /// Instruction-set width of this architecture
    pub fn multilib(self) -> Multilib {
        match self {
            ArchType::Arm | ArchType::X86 => Multilib::Lib32,
            ArchType::Arm64 | ArchType::Riscv64 | ArchType::X86_64 => Multilib::Lib64,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArchType::Arm => "arm",
            ArchType::Arm64 => "arm64",
            ArchType::Riscv64 => "riscv64",
            ArchType::X86 => "x86",
            ArchType::X86_64 => "x86_64",
        }
    }
}

impl fmt::Display for ArchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "arm" => Ok(ArchType::Arm),
            "arm64" => Ok(ArchType::Arm64),
            "riscv64" => Ok(ArchType::Riscv64),
            "x86" => Ok(ArchType::X86),
            "x86_64" => Ok(ArchType::X86_64),
            other => Err(format!(
                "unsupported arch {other:?} (expected arm, arm64, riscv64, x86 or x86_64)"
            )),
        }
    }
}

/// Instruction-set width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multilib {
    Lib32,
    Lib64,
}

impl Multilib {
    /// Directory native libraries of this width are installed to
    pub fn lib_dir(self) -> &'static str {
        match self {
            Multilib::Lib32 => "lib",
            Multilib::Lib64 => "lib64",
        }
    }
}

/// Operating system of a compile target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsType {
    Android,
    LinuxGlibc,
    LinuxBionic,
}

impl OsType {
    pub fn as_str(self) -> &'static str {
        match self {
            OsType::Android => "android",
            OsType::LinuxGlibc => "linux_glibc",
            OsType::LinuxBionic => "linux_bionic",
        }
    }
}

/// One (os, arch) pair a native module can be compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target {
    pub os: OsType,
    pub arch: ArchType,
}

impl Target {
    pub fn new(os: OsType, arch: ArchType) -> Self {
        Self { os, arch }
    }

    pub fn device(arch: ArchType) -> Self {
        Self::new(OsType::Android, arch)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os.as_str(), self.arch)
    }
}

/// Which instruction-set widths a module is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CompileMultilib {
    #[default]
    #[serde(rename = "both")]
    Both,
    #[serde(rename = "first")]
    First,
    #[serde(rename = "32")]
    Lib32,
    #[serde(rename = "64")]
    Lib64,
    #[serde(rename = "prefer32")]
    Prefer32,
}

impl FromStr for CompileMultilib {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "both" => Ok(CompileMultilib::Both),
            "first" => Ok(CompileMultilib::First),
            "32" => Ok(CompileMultilib::Lib32),
            "64" => Ok(CompileMultilib::Lib64),
            "prefer32" => Ok(CompileMultilib::Prefer32),
            other => Err(format!(
                "compile_multilib Invalid value {other:?} (expected both, first, 32, 64 or prefer32)"
            )),
        }
    }
}

// `32` and `64` are commonly written unquoted in YAML.
impl<'de> Deserialize<'de> for CompileMultilib {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Width(u64),
        }
        let raw = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text,
            Raw::Width(width) => width.to_string(),
        };
        raw.parse().map_err(de::Error::custom)
    }
}

impl CompileMultilib {
    /// Selects the targets this setting enables out of the configured list.
    ///
    /// The first entry of `targets` is the primary target.
    pub fn select(self, targets: &[Target]) -> Vec<Target> {
        let of_width = |width: Multilib| -> Vec<Target> {
            targets
                .iter()
                .copied()
                .filter(|t| t.arch.multilib() == width)
                .collect()
        };
        match self {
            CompileMultilib::Both => targets.to_vec(),
            CompileMultilib::First => targets.first().copied().into_iter().collect(),
            CompileMultilib::Lib32 => of_width(Multilib::Lib32),
            CompileMultilib::Lib64 => of_width(Multilib::Lib64),
            CompileMultilib::Prefer32 => {
                let lib32 = of_width(Multilib::Lib32);
                if lib32.is_empty() {
                    targets.first().copied().into_iter().collect()
                } else {
                    lib32
                }
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompileMultilib::Both => "both",
            CompileMultilib::First => "first",
            CompileMultilib::Lib32 => "32",
            CompileMultilib::Lib64 => "64",
            CompileMultilib::Prefer32 => "prefer32",
        }
    }
}
