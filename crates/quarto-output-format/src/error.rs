/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for output format construction and render-time hooks.
 */

//! Error types for quarto-output-format.
//!
//! Construction of a format descriptor fails only with [`InvalidOptionError`]
//! (wrapped in [`FormatError`]). Unsupported engine features are not errors;
//! they surface as [`crate::CapabilityWarning`]s. Hook failures happen at
//! render time and are reported as [`HookError`].

use std::path::PathBuf;

use thiserror::Error;

/// A malformed or unrecognized option value.
///
/// Always fatal to descriptor construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value for `{field}`: {value} (expected {expected})")]
pub struct InvalidOptionError {
    /// Option name as written by the user (e.g. `toc-depth`)
    pub field: String,
    /// The offending value, rendered for display
    pub value: String,
    /// Human-readable description of what is accepted
    pub expected: String,
    /// The closed set of accepted values, for enumerated options
    pub accepted: Vec<String>,
}

impl InvalidOptionError {
    /// Error for a value outside a closed set of choices.
    pub fn not_one_of(field: &str, value: impl Into<String>, accepted: &[&str]) -> Self {
        let accepted: Vec<String> = accepted.iter().map(|s| s.to_string()).collect();
        Self {
            field: field.to_string(),
            value: value.into(),
            expected: format!("one of {}", accepted.join(", ")),
            accepted,
        }
    }

    /// Error for a value that fails a structural check.
    pub fn invalid(field: &str, value: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
            expected: expected.into(),
            accepted: Vec::new(),
        }
    }
}

/// Failure to stage an auxiliary input file before the engine runs.
#[derive(Debug, Error)]
pub enum StagingError {
    /// The intermediates hook ran before the pre-processing hook captured
    /// a staging directory.
    #[error("No staging directory captured; the pre-processing hook has not run for this render")]
    NotPrepared,

    /// The file to stage does not exist.
    #[error("Reference document not found: {}", path.display())]
    MissingSource {
        /// Resolved source path
        path: PathBuf,
    },

    /// Copying the file into the staging directory failed.
    #[error("Failed to stage {} into {}: {source}", from.display(), to.display())]
    Copy {
        /// Source path
        from: PathBuf,
        /// Destination path
        to: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Error raised by a hook during a render.
#[derive(Debug, Error)]
pub enum HookError {
    /// An intermediates generator could not stage its files.
    #[error("Hook '{hook}' failed: {source}")]
    Staging {
        /// Name of the failing hook
        hook: String,
        /// Underlying staging error
        #[source]
        source: StagingError,
    },

    /// A pre-processor failed.
    #[error("Hook '{hook}' failed: {message}")]
    PreProcess {
        /// Name of the failing hook
        hook: String,
        /// Error message
        message: String,
    },
}

impl HookError {
    /// Name of the hook that failed.
    pub fn hook(&self) -> &str {
        match self {
            HookError::Staging { hook, .. } | HookError::PreProcess { hook, .. } => hook,
        }
    }
}

/// Errors that can occur while building an output format.
#[derive(Debug, Error)]
pub enum FormatError {
    /// An option value was rejected.
    #[error(transparent)]
    InvalidOption(#[from] InvalidOptionError),

    /// The options block could not be parsed.
    #[error("Failed to parse output options: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The requested format name is not known.
    #[error("Unknown output format: {0}")]
    UnknownFormat(String),
}

pub type Result<T> = std::result::Result<T, FormatError>;
