/*
 * builder.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Output format builders.
 */

//! Output format builders.
//!
//! A builder runs the whole construction pipeline for one format:
//!
//! ```text
//! OutputOptions ──resolve──▶ ResolvedOptions ──assemble──▶ engine args
//!                                                        └─▶ staging obligation ──▶ HookSet
//! ```
//!
//! and bundles the result into an [`OutputFormat`]. Builders never touch the
//! filesystem; the only side effects happen later, when the render driver
//! runs the hooks.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::args::assemble;
use crate::capability::{CapabilityOracle, PandocBinary};
use crate::descriptor::{EngineInvocation, OutputFormat};
use crate::diagnostic::CapabilityWarning;
use crate::error::{FormatError, Result};
use crate::filters::BUILTIN_FILTERS;
use crate::format::FormatIdentifier;
use crate::hooks::{HookSet, ReferenceDocStager, StagingDirCapture};
use crate::knitr::{ChunkDefaults, KnitrOptions};
use crate::options::{OutputOptions, Setting};
use crate::paths::{PandocPathArg, PathNormalizer};
use crate::resolve::resolve;

/// Collaborators shared by every build: the engine's capabilities, path
/// handling and the location of the built-in filters.
#[derive(Clone)]
pub struct FormatEnvironment {
    pub oracle: Arc<dyn CapabilityOracle>,
    pub paths: Arc<dyn PathNormalizer>,
    pub filter_dir: PathBuf,
}

impl FormatEnvironment {
    pub fn new(oracle: Arc<dyn CapabilityOracle>, filter_dir: impl Into<PathBuf>) -> Self {
        Self {
            oracle,
            paths: Arc::new(PandocPathArg),
            filter_dir: filter_dir.into(),
        }
    }

    pub fn with_paths(mut self, paths: Arc<dyn PathNormalizer>) -> Self {
        self.paths = paths;
        self
    }

    /// Environment for this machine: pandoc from `QUARTO_PANDOC` or `PATH`,
    /// built-in filters extracted to a temp directory.
    pub fn native() -> io::Result<Self> {
        let filter_dir = BUILTIN_FILTERS.path()?.to_path_buf();
        Ok(Self::new(Arc::new(PandocBinary::discover()), filter_dir))
    }
}

impl std::fmt::Debug for FormatEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatEnvironment")
            .field("pandoc_version", &self.oracle.pandoc_version())
            .field("filter_dir", &self.filter_dir)
            .finish_non_exhaustive()
    }
}

/// A built descriptor together with the features that were dropped while
/// building it.
#[derive(Debug)]
pub struct BuildOutcome {
    pub format: OutputFormat,
    pub warnings: Vec<CapabilityWarning>,
}

/// Build the output format descriptor for `id`.
pub fn build_output_format(
    id: FormatIdentifier,
    options: &OutputOptions,
    env: &FormatEnvironment,
) -> Result<BuildOutcome> {
    let profile = id.profile();
    let resolved = resolve(profile, options, env.oracle.as_ref())?;
    let assembled = assemble(&resolved, env.paths.as_ref(), &env.filter_dir)?;

    let reference = match assembled.staging {
        Some(obligation) => Setting::Explicit(obligation.source),
        None => Setting::Default,
    };
    let hooks = HookSet::new()
        .with_pre_processor(StagingDirCapture)
        .with_intermediates_generator(ReferenceDocStager::new(reference));

    let knitr = KnitrOptions::new(ChunkDefaults::for_document(
        resolved.fig_width,
        resolved.fig_height,
    ));
    let pandoc = EngineInvocation::new(profile.pandoc_to, resolved.from, assembled.args);

    tracing::debug!(
        format = %id,
        warnings = resolved.warnings.len(),
        "Built output format"
    );

    Ok(BuildOutcome {
        format: OutputFormat::new(
            id,
            knitr,
            pandoc,
            resolved.keep_md,
            resolved.df_print,
            hooks,
        ),
        warnings: resolved.warnings,
    })
}

/// Build a format by name (`odt`, `word_document`, ...).
pub fn build_output_format_named(
    name: &str,
    options: &OutputOptions,
    env: &FormatEnvironment,
) -> Result<BuildOutcome> {
    let id = FormatIdentifier::try_from(name).map_err(|_| FormatError::UnknownFormat(name.to_string()))?;
    build_output_format(id, options, env)
}

/// OpenDocument text output.
pub fn odt_document(options: &OutputOptions, env: &FormatEnvironment) -> Result<BuildOutcome> {
    build_output_format(FormatIdentifier::Odt, options, env)
}

/// Word document output.
pub fn word_document(options: &OutputOptions, env: &FormatEnvironment) -> Result<BuildOutcome> {
    build_output_format(FormatIdentifier::Docx, options, env)
}

/// PowerPoint output.
pub fn powerpoint_presentation(
    options: &OutputOptions,
    env: &FormatEnvironment,
) -> Result<BuildOutcome> {
    build_output_format(FormatIdentifier::Pptx, options, env)
}
