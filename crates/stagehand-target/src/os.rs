//! Operating system classification.

use crate::TargetError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target operating system as it appears in the destination layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    Windows,
    Darwin,
    Linux,
    Qnx,
    Unknown,
}

/// Which executability model applies when classifying and deploying files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostFamily {
    /// Executable permission bits; `.so` shared libraries.
    Posix,
    /// Extension-based executability; `.dll` shared libraries.
    Windows,
}

/// Raw platform flags as reported by the toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformFlags {
    pub windows: bool,
    pub apple: bool,
    pub posix: bool,
    pub system_name: String,
}

impl PlatformFlags {
    /// Flags for the platform this binary was compiled for.
    pub fn host() -> Self {
        Self {
            windows: cfg!(windows),
            apple: cfg!(target_vendor = "apple"),
            posix: cfg!(unix),
            system_name: std::env::consts::OS.to_owned(),
        }
    }
}

fn is_realtime_os(system_name: &str) -> bool {
    system_name.to_ascii_lowercase().contains("qnx")
}

impl OperatingSystem {
    /// Classify flags in priority order: Windows, Apple, real-time POSIX,
    /// other POSIX, unknown.
    pub fn classify(flags: &PlatformFlags) -> Self {
        if flags.windows {
            Self::Windows
        } else if flags.apple {
            Self::Darwin
        } else if flags.posix && is_realtime_os(&flags.system_name) {
            Self::Qnx
        } else if flags.posix {
            Self::Linux
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::Qnx => "qnx",
            Self::Unknown => "unknown",
        }
    }

    pub fn family(self) -> HostFamily {
        match self {
            Self::Windows => HostFamily::Windows,
            Self::Darwin | Self::Linux | Self::Qnx | Self::Unknown => HostFamily::Posix,
        }
    }
}

impl HostFamily {
    /// Dynamic-library extension, without the leading dot.
    pub fn shared_library_extension(self) -> &'static str {
        match self {
            Self::Posix => "so",
            Self::Windows => "dll",
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatingSystem {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windows" | "win32" => Ok(Self::Windows),
            "darwin" | "macos" => Ok(Self::Darwin),
            "linux" => Ok(Self::Linux),
            "qnx" => Ok(Self::Qnx),
            "unknown" => Ok(Self::Unknown),
            other => Err(TargetError::UnknownOs(other.to_owned())),
        }
    }
}
