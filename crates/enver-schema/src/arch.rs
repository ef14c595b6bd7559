//! Host platform and CPU architecture.
//!
//! Release metadata carries one download variant per platform and
//! architecture. These types select the variant matching the running host.
//!
//! # Example
//!
//! ```
//! use enver_schema::{Arch, Platform};
//!
//! println!("Running on: {} {}", Platform::current(), Arch::current());
//! ```

use serde::{Deserialize, Serialize};

/// Error returned when a platform or architecture name is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct ParseTargetError {
    kind: &'static str,
    value: String,
}

/// Operating system family an engine build targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    /// Microsoft Windows
    Windows,
    /// Apple macOS
    MacOs,
    /// Linux desktop
    Linux,
}

impl Platform {
    /// Get the current platform
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }

    /// Name used by the release API (`WINDOWS`, `MAC_OS`, `LINUX`).
    pub fn api_name(self) -> &'static str {
        match self {
            Self::Windows => "WINDOWS",
            Self::MacOs => "MAC_OS",
            Self::Linux => "LINUX",
        }
    }

    /// Short lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" | "win" => Ok(Self::Windows),
            "macos" | "mac_os" | "osx" | "darwin" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            _ => Err(ParseTargetError {
                kind: "platform",
                value: s.to_string(),
            }),
        }
    }
}

/// CPU architecture of an engine build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Arch {
    /// `x86_64` (Intel / AMD)
    X86_64,
    /// ARM64 (Apple Silicon, Windows on ARM)
    Arm64,
}

impl Arch {
    /// Get the current architecture
    pub fn current() -> Self {
        #[cfg(target_arch = "aarch64")]
        {
            Self::Arm64
        }
        #[cfg(not(target_arch = "aarch64"))]
        {
            Self::X86_64
        }
    }

    /// Name used by the release API (`X86_64`, `ARM64`).
    pub fn api_name(self) -> &'static str {
        match self {
            Self::X86_64 => "X86_64",
            Self::Arm64 => "ARM64",
        }
    }

    /// Convert to string representation
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Ok(Self::X86_64),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            _ => Err(ParseTargetError {
                kind: "architecture",
                value: s.to_string(),
            }),
        }
    }
}
