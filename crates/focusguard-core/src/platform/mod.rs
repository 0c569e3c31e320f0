//! Host operating system detection.
//!
//! Only used to pick which remediation instructions to show, so detection
//! never fails: anything unknown is treated as Linux.

mod instructions;

pub use instructions::{instructions_for, PlatformInstructions};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(rename = "macos")]
    MacOS,
    Windows,
    #[default]
    Linux,
}

impl Platform {
    /// Map an OS name to a platform.
    ///
    /// macOS and iOS map to `MacOS`, Windows to `Windows`, everything else
    /// (Linux, Android, unknown) to `Linux`.
    pub fn from_os_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "macos" | "darwin" | "ios" => Platform::MacOS,
            "windows" | "win32" => Platform::Windows,
            _ => Platform::Linux,
        }
    }

    /// Platform this binary was built for.
    pub fn detect() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Detect through a fallible host API, using `fallback` if it fails.
    pub fn detect_with<F, E>(source: F, fallback: Platform) -> Self
    where
        F: FnOnce() -> Result<String, E>,
        E: std::fmt::Display,
    {
        match source() {
            Ok(name) => Self::from_os_name(&name),
            Err(e) => {
                tracing::warn!(error = %e, fallback = %fallback, "platform detection failed");
                fallback
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::MacOS => "macos",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::MacOS => "macOS",
            Platform::Windows => "Windows",
            Platform::Linux => "Linux",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
