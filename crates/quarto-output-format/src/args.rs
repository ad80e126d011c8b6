/*
 * args.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Engine argument assembly.
 */

//! Argument assembly.
//!
//! [`assemble`] reduces [`ResolvedOptions`] to the flat list of engine
//! arguments. The order is fixed:
//!
//! 1. table of contents
//! 2. section numbering
//! 3. template
//! 4. highlighting
//! 5. includes (in-header, before-body, after-body; caller order kept)
//! 6. reference document, by its [`staged_path`] (relative to the staging
//!    directory the engine runs from)
//! 7. built-in filters
//! 8. user `pandoc-args`, verbatim
//!
//! Passthrough arguments come last so the user can override anything the
//! builder emitted.

use std::path::{Component, Path, PathBuf};

use crate::error::InvalidOptionError;
use crate::options::Setting;
use crate::paths::PathNormalizer;
use crate::resolve::ResolvedOptions;

/// A file that must be copied into the staging directory before the engine
/// runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingObligation {
    /// Path as written by the user (relative to the input document, or
    /// absolute)
    pub source: PathBuf,
    /// Location of the copy relative to the staging directory; this is the
    /// path handed to the engine
    pub staged: PathBuf,
}

impl StagingObligation {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let staged = staged_path(&source);
        Self { source, staged }
    }
}

/// Where `reference` lands under the staging directory.
///
/// Plain relative paths keep their layout (`./` segments dropped). Absolute
/// paths, `~` paths and paths leaving the document directory with `..` are
/// staged by file name.
pub fn staged_path(reference: &Path) -> PathBuf {
    let plain = !reference.starts_with("~")
        && reference
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if plain {
        reference
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect()
    } else {
        reference
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| reference.to_path_buf())
    }
}

/// Output of [`assemble`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledArgs {
    pub args: Vec<String>,
    /// Set when an explicit reference document was passed to the engine
    pub staging: Option<StagingObligation>,
}

/// Build the engine argument list.
///
/// Fails only on a non-positive TOC depth; everything else was validated
/// during resolution.
pub fn assemble(
    resolved: &ResolvedOptions,
    paths: &dyn PathNormalizer,
    filter_dir: &Path,
) -> Result<AssembledArgs, InvalidOptionError> {
    let mut args = Vec::new();

    if let Some(depth) = resolved.toc_depth {
        if depth <= 0 {
            return Err(InvalidOptionError::invalid(
                "toc-depth",
                depth.to_string(),
                "a positive integer",
            ));
        }
        args.push("--table-of-contents".to_string());
        args.push(format!("--toc-depth={}", depth));
    }

    if resolved.number_sections {
        args.push("--number-sections".to_string());
    }

    if let Setting::Explicit(template) = &resolved.template {
        args.push("--template".to_string());
        args.push(paths.normalize(template));
    }

    if let Some(style) = resolved.highlight {
        args.push("--highlight-style".to_string());
        args.push(style.as_str().to_string());
    }

    let includes = &resolved.includes;
    for (flag, files) in [
        ("--include-in-header", &includes.in_header),
        ("--include-before-body", &includes.before_body),
        ("--include-after-body", &includes.after_body),
    ] {
        for file in files {
            args.push(flag.to_string());
            args.push(paths.normalize(file));
        }
    }

    let staging = resolved.reference_doc.as_ref().map(|reference| {
        let obligation = StagingObligation::new(&reference.path);
        args.push(reference.flag.to_string());
        args.push(paths.normalize(&obligation.staged));
        obligation
    });

    for filter in &resolved.filters {
        args.push("--lua-filter".to_string());
        args.push(paths.normalize(&filter_dir.join(filter.name)));
    }

    args.extend(resolved.pandoc_args.iter().cloned());

    tracing::debug!(format = %resolved.format, args = ?args, "Assembled pandoc arguments");

    Ok(AssembledArgs { args, staging })
}
