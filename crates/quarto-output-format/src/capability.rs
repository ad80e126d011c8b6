/*
 * capability.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Pandoc version detection and capability queries.
 */

//! Capability oracle for the conversion engine.
//!
//! Some arguments are only understood by newer Pandoc releases. Format
//! builders never run Pandoc themselves; they ask a [`CapabilityOracle`]
//! whether the detected version is at least some minimum and degrade
//! gracefully when it is not.
//!
//! # Finding Pandoc
//!
//! [`find_pandoc`] searches in this order:
//! 1. `QUARTO_PANDOC` environment variable (path to the pandoc binary)
//! 2. System PATH via `which`

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::Serialize;

/// Environment variable pointing at a specific pandoc binary.
pub const PANDOC_ENV_VAR: &str = "QUARTO_PANDOC";

/// A Pandoc release number.
///
/// Pandoc uses up to four numeric components (e.g. `3.1.11.1`). Missing
/// components compare as zero, so `2.10` == `2.10.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PandocVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: u32,
}

impl PandocVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            build: 0,
        }
    }

    /// Parse the first line of `pandoc --version` output.
    ///
    /// ```text
    /// pandoc 3.1.11.1
    /// Features: +server +lua
    /// ```
    pub fn from_version_output(output: &str) -> Option<Self> {
        static VERSION_LINE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^pandoc(?:\.exe)?\s+(\d+(?:\.\d+){0,3})").expect("valid regex")
        });
        let first = output.lines().next()?.trim();
        let caps = VERSION_LINE.captures(first)?;
        caps.get(1)?.as_str().parse().ok()
    }
}

impl fmt::Display for PandocVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.build != 0 {
            write!(f, ".{}", self.build)?;
        }
        Ok(())
    }
}

impl FromStr for PandocVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.is_empty() || parts.len() > 4 {
            return Err(format!("Invalid pandoc version: {}", s));
        }
        let mut numbers = [0u32; 4];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("Invalid pandoc version: {}", s))?;
        }
        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            build: numbers[3],
        })
    }
}

/// Read-only answers about what the conversion engine supports.
///
/// Implementations must be cheap to query repeatedly; builders call
/// [`supports`](CapabilityOracle::supports) once per gated feature.
pub trait CapabilityOracle: Send + Sync {
    /// The detected engine version, or `None` if no engine was found.
    fn pandoc_version(&self) -> Option<PandocVersion>;

    /// Whether the detected engine is at least `required`.
    ///
    /// Default: `false` when no engine was detected.
    fn supports(&self, required: PandocVersion) -> bool {
        self.pandoc_version().is_some_and(|v| v >= required)
    }
}

/// A capability oracle with a fixed, known version.
///
/// Used when the caller already knows which Pandoc it will run, and in
/// tests to simulate old or new engines.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCapabilities {
    version: Option<PandocVersion>,
}

impl StaticCapabilities {
    pub fn new(version: PandocVersion) -> Self {
        Self {
            version: Some(version),
        }
    }

    /// An oracle that reports no engine at all. Every gated feature is
    /// unsupported.
    pub fn none() -> Self {
        Self { version: None }
    }
}

impl CapabilityOracle for StaticCapabilities {
    fn pandoc_version(&self) -> Option<PandocVersion> {
        self.version
    }
}

/// Capability oracle backed by a pandoc binary on this machine.
///
/// The version is queried lazily with `pandoc --version`, at most once per
/// instance.
#[derive(Debug, Default)]
pub struct PandocBinary {
    path: Option<PathBuf>,
    version: OnceCell<Option<PandocVersion>>,
}

impl PandocBinary {
    /// Locate pandoc via [`find_pandoc`].
    pub fn discover() -> Self {
        Self::at(find_pandoc())
    }

    /// Use a specific binary (or none).
    pub fn at(path: Option<PathBuf>) -> Self {
        Self {
            path,
            version: OnceCell::new(),
        }
    }

    /// Path of the binary, if one was found.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl CapabilityOracle for PandocBinary {
    fn pandoc_version(&self) -> Option<PandocVersion> {
        *self
            .version
            .get_or_init(|| self.path.as_deref().and_then(query_version))
    }
}

/// Find the pandoc binary on the system.
///
/// # Returns
///
/// `Some(path)` if pandoc is found, `None` otherwise.
pub fn find_pandoc() -> Option<PathBuf> {
    if let Ok(value) = std::env::var(PANDOC_ENV_VAR) {
        let path = PathBuf::from(value);
        if path.is_file() {
            return Some(path);
        }
        tracing::debug!(
            path = %path.display(),
            "{} does not point to a file, falling back to PATH",
            PANDOC_ENV_VAR
        );
    }

    which::which("pandoc").ok()
}

fn query_version(path: &Path) -> Option<PandocVersion> {
    let output = match Command::new(path).arg("--version").output() {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Failed to run pandoc --version");
            return None;
        }
    };
    if !output.status.success() {
        tracing::debug!(path = %path.display(), status = %output.status, "pandoc --version failed");
        return None;
    }
    let version = PandocVersion::from_version_output(&String::from_utf8_lossy(&output.stdout));
    tracing::debug!(path = %path.display(), version = ?version, "Detected pandoc version");
    version
}
