/*
 * hooks.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render-time hooks attached to an output format.
 */

//! Render-time hooks.
//!
//! An output format may carry two kinds of hooks, run by the render driver
//! around the engine invocation:
//!
//! 1. **Pre-processors** run once before conversion. They may record state
//!    for later hooks and may return extra engine arguments.
//! 2. **Intermediates generators** run once after pre-processing and before
//!    the engine. They stage auxiliary input files and return their paths so
//!    the driver can clean them up.
//!
//! State flows between the two stages through an explicit [`HookState`]
//! owned by the [`HookSet`] (and therefore by exactly one descriptor). Hooks
//! receive it by reference; nothing is captured implicitly, so two
//! descriptors never observe each other's state.
//!
//! ```text
//!          pre_process()               generate_intermediates()
//!   Idle ────────────────▶ PreProcessed ──────────────────────────▶ Idle
//!                         (state holds             (state cleared)
//!                          staging dir)
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::args::staged_path;
use crate::error::{HookError, StagingError};
use crate::options::Setting;
use crate::paths::expand_tilde;

/// How the document will be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    #[default]
    Static,
    Shiny,
    ShinyPrerendered,
}

/// Render-time information handed to every hook.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Document front matter
    pub metadata: Value,

    /// The document being rendered
    pub input_file: PathBuf,

    pub runtime: RuntimeMode,

    /// Metadata emitted by knitr (dependencies etc.)
    pub knit_meta: Vec<Value>,

    /// Directory for generated assets of this render (`{stem}_files/`)
    pub files_dir: PathBuf,

    pub output_dir: PathBuf,
}

impl HookContext {
    /// Create a context for `input_file` using `files_dir` for generated
    /// assets. Output defaults to the input's directory.
    pub fn new(input_file: impl Into<PathBuf>, files_dir: impl Into<PathBuf>) -> Self {
        let input_file = input_file.into();
        let input_dir = input_dir(&input_file);
        Self {
            metadata: Value::Null,
            input_file,
            runtime: RuntimeMode::default(),
            knit_meta: Vec::new(),
            files_dir: files_dir.into(),
            output_dir: input_dir,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_runtime(mut self, runtime: RuntimeMode) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Directory containing the input file.
    pub fn input_dir(&self) -> PathBuf {
        input_dir(&self.input_file)
    }
}

fn input_dir(input_file: &Path) -> PathBuf {
    input_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// State shared between the hooks of one descriptor during one render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookState {
    staging_dir: Option<PathBuf>,
}

impl HookState {
    /// The staging directory captured by pre-processing, if any.
    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging_dir.as_deref()
    }

    pub fn capture_staging_dir(&mut self, dir: impl Into<PathBuf>) {
        self.staging_dir = Some(dir.into());
    }

    pub fn clear(&mut self) {
        self.staging_dir = None;
    }
}

/// A hook run before conversion.
pub trait PreProcessor: Send + Sync {
    fn name(&self) -> &str;

    /// Returns extra engine arguments; empty means nothing to inject.
    fn pre_process(&self, ctx: &HookContext, state: &mut HookState) -> Result<Vec<String>, HookError>;
}

/// A hook that stages auxiliary input files before the engine runs.
pub trait IntermediatesGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the staged files, for the driver to preserve or clean up.
    fn generate(&self, ctx: &HookContext, state: &HookState) -> Result<Vec<PathBuf>, StagingError>;
}

/// Pre-processor that records the render's asset directory as the staging
/// directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct StagingDirCapture;

impl PreProcessor for StagingDirCapture {
    fn name(&self) -> &str {
        "staging-dir"
    }

    fn pre_process(&self, ctx: &HookContext, state: &mut HookState) -> Result<Vec<String>, HookError> {
        state.capture_staging_dir(&ctx.files_dir);
        Ok(Vec::new())
    }
}

/// Intermediates generator that copies an explicit reference document into
/// the staging directory.
///
/// Relative references are resolved against the input document's directory.
/// The copy lands at [`staged_path`] under the staging directory, which is
/// the same relative path the assembler passed to the engine, so the engine
/// finds it when run from the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDocStager {
    reference: Setting<PathBuf>,
}

impl ReferenceDocStager {
    pub fn new(reference: Setting<PathBuf>) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &Setting<PathBuf> {
        &self.reference
    }
}

impl IntermediatesGenerator for ReferenceDocStager {
    fn name(&self) -> &str {
        "reference-doc"
    }

    fn generate(&self, ctx: &HookContext, state: &HookState) -> Result<Vec<PathBuf>, StagingError> {
        let Setting::Explicit(reference) = &self.reference else {
            return Ok(Vec::new());
        };
        let staging_dir = state.staging_dir().ok_or(StagingError::NotPrepared)?;

        let expanded = expand_tilde(reference);
        let source = if expanded.is_absolute() {
            expanded
        } else {
            ctx.input_dir().join(expanded)
        };
        if !source.is_file() {
            return Err(StagingError::MissingSource { path: source });
        }

        let target = staging_dir.join(staged_path(reference));
        if !is_same_file(&source, &target) {
            copy_file(&source, &target)?;
        }

        tracing::debug!(
            source = %source.display(),
            staged = %target.display(),
            "Staged reference document"
        );
        Ok(vec![target])
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn copy_file(from: &Path, to: &Path) -> Result<(), StagingError> {
    let copy_error = |source| StagingError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(copy_error)?;
    }
    fs::copy(from, to).map_err(copy_error)?;
    Ok(())
}

/// A pre-processor backed by a closure.
pub struct FnPreProcessor<F> {
    name: String,
    f: F,
}

impl<F> FnPreProcessor<F>
where
    F: Fn(&HookContext, &mut HookState) -> Result<Vec<String>, HookError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> PreProcessor for FnPreProcessor<F>
where
    F: Fn(&HookContext, &mut HookState) -> Result<Vec<String>, HookError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn pre_process(&self, ctx: &HookContext, state: &mut HookState) -> Result<Vec<String>, HookError> {
        (self.f)(ctx, state)
    }
}

/// Where a [`HookSet`] is in its per-render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookStage {
    #[default]
    Idle,
    PreProcessed,
}

/// The hooks of one output format, with their private state.
#[derive(Default)]
pub struct HookSet {
    pre_processors: Vec<Box<dyn PreProcessor>>,
    generators: Vec<Box<dyn IntermediatesGenerator>>,
    state: HookState,
    stage: HookStage,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pre_processor(mut self, hook: impl PreProcessor + 'static) -> Self {
        self.pre_processors.push(Box::new(hook));
        self
    }

    pub fn with_intermediates_generator(
        mut self,
        hook: impl IntermediatesGenerator + 'static,
    ) -> Self {
        self.generators.push(Box::new(hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pre_processors.is_empty() && self.generators.is_empty()
    }

    pub fn pre_processor_names(&self) -> Vec<&str> {
        self.pre_processors.iter().map(|h| h.name()).collect()
    }

    pub fn intermediates_generator_names(&self) -> Vec<&str> {
        self.generators.iter().map(|h| h.name()).collect()
    }

    pub fn state(&self) -> &HookState {
        &self.state
    }

    pub fn stage(&self) -> HookStage {
        self.stage
    }

    /// Run every pre-processor in order.
    ///
    /// Starts a new render cycle: state left over from an earlier render is
    /// discarded first. Returns the concatenated extra engine arguments.
    pub fn pre_process(&mut self, ctx: &HookContext) -> Result<Vec<String>, HookError> {
        self.state.clear();
        self.stage = HookStage::Idle;

        let mut extra_args = Vec::new();
        for hook in &self.pre_processors {
            tracing::debug!(hook = hook.name(), input = %ctx.input_file.display(), "Running pre-processor");
            match hook.pre_process(ctx, &mut self.state) {
                Ok(args) => extra_args.extend(args),
                Err(e) => {
                    // An aborted cycle leaves nothing for stage 2
                    self.state.clear();
                    return Err(e);
                }
            }
        }
        self.stage = HookStage::PreProcessed;
        Ok(extra_args)
    }

    /// Run every intermediates generator in order and end the render cycle.
    ///
    /// Fails with [`StagingError::NotPrepared`] unless [`pre_process`]
    /// completed for this cycle. Whatever the outcome, the set is `Idle`
    /// with cleared state afterwards.
    ///
    /// [`pre_process`]: HookSet::pre_process
    pub fn generate_intermediates(&mut self, ctx: &HookContext) -> Result<Vec<PathBuf>, HookError> {
        let result = match (self.stage, self.generators.first()) {
            (HookStage::Idle, Some(first)) => Err(HookError::Staging {
                hook: first.name().to_string(),
                source: StagingError::NotPrepared,
            }),
            _ => self.run_generators(ctx),
        };
        self.state.clear();
        self.stage = HookStage::Idle;
        result
    }

    fn run_generators(&self, ctx: &HookContext) -> Result<Vec<PathBuf>, HookError> {
        let mut staged = Vec::new();
        for hook in &self.generators {
            tracing::debug!(hook = hook.name(), input = %ctx.input_file.display(), "Running intermediates generator");
            let files = hook
                .generate(ctx, &self.state)
                .map_err(|source| HookError::Staging {
                    hook: hook.name().to_string(),
                    source,
                })?;
            staged.extend(files);
        }
        Ok(staged)
    }

    /// Append the hooks of `other` after this set's own. State is not
    /// carried over.
    pub fn extend(&mut self, other: HookSet) {
        self.pre_processors.extend(other.pre_processors);
        self.generators.extend(other.generators);
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("pre_processors", &self.pre_processor_names())
            .field("intermediates_generators", &self.intermediates_generator_names())
            .field("state", &self.state)
            .field("stage", &self.stage)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn reference_hooks(reference: Setting<PathBuf>) -> HookSet {
        HookSet::new()
            .with_pre_processor(StagingDirCapture)
            .with_intermediates_generator(ReferenceDocStager::new(reference))
    }

    #[test]
    fn test_pre_process_captures_staging_dir() {
        let mut hooks = reference_hooks(Setting::Default);
        let ctx = HookContext::new("/docs/report.Rmd", "/docs/report_files");

        let args = hooks.pre_process(&ctx).unwrap();
        assert!(args.is_empty());
        assert_eq!(hooks.stage(), HookStage::PreProcessed);
        assert_eq!(hooks.state().staging_dir(), Some(Path::new("/docs/report_files")));
    }

    #[test]
    fn test_sentinel_reference_stages_nothing() {
        let mut hooks = reference_hooks(Setting::Default);
        let ctx = HookContext::new("/docs/report.Rmd", "/docs/report_files");
        hooks.pre_process(&ctx).unwrap();
        assert!(hooks.generate_intermediates(&ctx).unwrap().is_empty());
        assert_eq!(hooks.stage(), HookStage::Idle);
        assert_eq!(hooks.state().staging_dir(), None);
    }

    #[test]
    fn test_stages_relative_reference() {
        let temp = TempDir::new().unwrap();
        let doc_dir = temp.path().join("doc");
        fs::create_dir_all(doc_dir.join("styles")).unwrap();
        fs::write(doc_dir.join("styles/house.odt"), b"odt").unwrap();
        let staging = temp.path().join("staging");

        let mut hooks = reference_hooks(Setting::from("styles/house.odt"));
        let ctx = HookContext::new(doc_dir.join("report.Rmd"), &staging);
        hooks.pre_process(&ctx).unwrap();
        let staged = hooks.generate_intermediates(&ctx).unwrap();

        assert_eq!(staged, vec![staging.join("styles/house.odt")]);
        assert_eq!(fs::read(&staged[0]).unwrap(), b"odt");
    }

    #[test]
    fn test_stages_absolute_reference_by_file_name() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("shared/house.docx");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, b"docx").unwrap();
        let staging = temp.path().join("staging");

        let mut hooks = reference_hooks(Setting::Explicit(source.clone()));
        let ctx = HookContext::new(temp.path().join("report.Rmd"), &staging);
        hooks.pre_process(&ctx).unwrap();

        assert_eq!(
            hooks.generate_intermediates(&ctx).unwrap(),
            vec![staging.join("house.docx")]
        );
    }

    #[test]
    fn test_parent_relative_reference_is_flattened() {
        let temp = TempDir::new().unwrap();
        let doc_dir = temp.path().join("doc");
        fs::create_dir_all(temp.path().join("shared")).unwrap();
        fs::create_dir_all(&doc_dir).unwrap();
        fs::write(temp.path().join("shared/house.odt"), b"odt").unwrap();
        let staging = temp.path().join("D");

        let mut hooks = reference_hooks(Setting::from("../shared/house.odt"));
        let ctx = HookContext::new(doc_dir.join("report.Rmd"), &staging);
        hooks.pre_process(&ctx).unwrap();

        assert_eq!(
            hooks.generate_intermediates(&ctx).unwrap(),
            vec![staging.join("house.odt")]
        );
    }

    #[test]
    fn test_current_dir_prefix_is_dropped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("house.odt"), b"odt").unwrap();
        let staging = temp.path().join("D");

        let mut hooks = reference_hooks(Setting::from("./house.odt"));
        let ctx = HookContext::new(temp.path().join("report.Rmd"), &staging);
        hooks.pre_process(&ctx).unwrap();

        let staged = hooks.generate_intermediates(&ctx).unwrap();
        assert_eq!(staged, vec![staging.join("house.odt")]);
        assert_eq!(staged[0].to_string_lossy(), staging.join("house.odt").to_string_lossy());
    }

    #[test]
    fn test_copy_failure_names_both_paths() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("house.odt"), b"odt").unwrap();
        // The staging directory is a regular file, so it cannot be created
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"").unwrap();

        let mut hooks = reference_hooks(Setting::from("house.odt"));
        let ctx = HookContext::new(temp.path().join("report.Rmd"), &blocker);
        hooks.pre_process(&ctx).unwrap();

        let err = hooks.generate_intermediates(&ctx).unwrap_err();
        assert_eq!(err.hook(), "reference-doc");
        match err {
            HookError::Staging {
                source: StagingError::Copy { from, to, .. },
                ..
            } => {
                assert_eq!(from, temp.path().join("house.odt"));
                assert_eq!(to, blocker.join("house.odt"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(hooks.stage(), HookStage::Idle);
        assert_eq!(hooks.state().staging_dir(), None);
    }

    #[test]
    fn test_failed_pre_process_leaves_nothing_to_stage() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("house.odt"), b"odt").unwrap();
        let staging = temp.path().join("D");

        let mut hooks = HookSet::new()
            .with_pre_processor(StagingDirCapture)
            .with_pre_processor(FnPreProcessor::new("broken", |_, _| {
                Err(HookError::PreProcess {
                    hook: "broken".to_string(),
                    message: "no metadata".to_string(),
                })
            }))
            .with_intermediates_generator(ReferenceDocStager::new(Setting::from("house.odt")));
        let ctx = HookContext::new(temp.path().join("report.Rmd"), &staging);

        assert_eq!(hooks.pre_process(&ctx).unwrap_err().hook(), "broken");
        assert_eq!(hooks.stage(), HookStage::Idle);
        assert_eq!(hooks.state().staging_dir(), None);

        let err = hooks.generate_intermediates(&ctx).unwrap_err();
        assert!(matches!(
            err,
            HookError::Staging {
                source: StagingError::NotPrepared,
                ..
            }
        ));
        assert!(!staging.exists());
    }

    #[test]
    fn test_generate_twice_requires_new_pre_process() {
        let mut hooks = reference_hooks(Setting::Default);
        let ctx = HookContext::new("/docs/report.Rmd", "/docs/report_files");
        hooks.pre_process(&ctx).unwrap();
        assert!(hooks.generate_intermediates(&ctx).unwrap().is_empty());

        let err = hooks.generate_intermediates(&ctx).unwrap_err();
        assert_eq!(err.hook(), "reference-doc");
    }

    #[test]
    fn test_set_without_generators_has_nothing_to_prepare() {
        let mut hooks = HookSet::new().with_pre_processor(StagingDirCapture);
        let ctx = HookContext::new("/docs/report.Rmd", "/docs/report_files");
        assert!(hooks.generate_intermediates(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_staging_onto_itself_keeps_content() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("house.odt"), b"original").unwrap();

        let mut hooks = reference_hooks(Setting::from("house.odt"));
        let ctx = HookContext::new(temp.path().join("report.Rmd"), temp.path());
        hooks.pre_process(&ctx).unwrap();
        let staged = hooks.generate_intermediates(&ctx).unwrap();

        assert_eq!(fs::read(&staged[0]).unwrap(), b"original");
    }

    #[test]
    fn test_missing_reference_is_a_staging_error() {
        let temp = TempDir::new().unwrap();
        let mut hooks = reference_hooks(Setting::from("nope.odt"));
        let ctx = HookContext::new(temp.path().join("report.Rmd"), temp.path().join("s"));
        hooks.pre_process(&ctx).unwrap();

        let err = hooks.generate_intermediates(&ctx).unwrap_err();
        assert_eq!(err.hook(), "reference-doc");
        match err {
            HookError::Staging {
                source: StagingError::MissingSource { path },
                ..
            } => assert_eq!(path, temp.path().join("nope.odt")),
            other => panic!("unexpected error: {other:?}"),
        }
        // The cycle is over even though it failed
        assert_eq!(hooks.stage(), HookStage::Idle);
    }

    #[test]
    fn test_generate_without_pre_process_is_not_prepared() {
        let mut hooks = reference_hooks(Setting::from("house.odt"));
        let ctx = HookContext::new("/docs/report.Rmd", "/docs/report_files");
        let err = hooks.generate_intermediates(&ctx).unwrap_err();
        assert!(matches!(
            err,
            HookError::Staging {
                source: StagingError::NotPrepared,
                ..
            }
        ));
    }

    #[test]
    fn test_second_render_does_not_see_first_staging_dir() {
        let mut hooks = reference_hooks(Setting::Default);
        hooks
            .pre_process(&HookContext::new("/a/one.Rmd", "/a/one_files"))
            .unwrap();
        hooks
            .generate_intermediates(&HookContext::new("/a/one.Rmd", "/a/one_files"))
            .unwrap();
        assert_eq!(hooks.state().staging_dir(), None);

        hooks
            .pre_process(&HookContext::new("/b/two.Rmd", "/b/two_files"))
            .unwrap();
        assert_eq!(hooks.state().staging_dir(), Some(Path::new("/b/two_files")));
    }

    #[test]
    fn test_fn_pre_processor_args_are_concatenated() {
        let mut hooks = HookSet::new()
            .with_pre_processor(FnPreProcessor::new("one", |_, _| Ok(vec!["--a".to_string()])))
            .with_pre_processor(FnPreProcessor::new("two", |_, _| Ok(vec!["--b".to_string()])));
        let args = hooks
            .pre_process(&HookContext::new("doc.Rmd", "doc_files"))
            .unwrap();
        assert_eq!(args, vec!["--a", "--b"]);
        assert_eq!(hooks.pre_processor_names(), vec!["one", "two"]);
    }

    #[test]
    fn test_pre_processor_error_propagates() {
        let mut hooks = HookSet::new().with_pre_processor(FnPreProcessor::new("broken", |_, _| {
            Err(HookError::PreProcess {
                hook: "broken".to_string(),
                message: "no metadata".to_string(),
            })
        }));
        let err = hooks
            .pre_process(&HookContext::new("doc.Rmd", "doc_files"))
            .unwrap_err();
        assert_eq!(err.hook(), "broken");
        assert_eq!(hooks.stage(), HookStage::Idle);
    }

    #[test]
    fn test_extend_appends_in_order() {
        let mut base = HookSet::new().with_pre_processor(StagingDirCapture);
        base.extend(
            HookSet::new()
                .with_pre_processor(FnPreProcessor::new("overlay", |_, _| Ok(Vec::new())))
                .with_intermediates_generator(ReferenceDocStager::new(Setting::Default)),
        );
        assert_eq!(base.pre_processor_names(), vec!["staging-dir", "overlay"]);
        assert_eq!(base.intermediates_generator_names(), vec!["reference-doc"]);
    }

    #[test]
    fn test_context_defaults_to_input_dir() {
        let ctx = HookContext::new("/docs/report.Rmd", "/docs/report_files")
            .with_runtime(RuntimeMode::Shiny);
        assert_eq!(ctx.output_dir, PathBuf::from("/docs"));
        assert_eq!(ctx.runtime, RuntimeMode::Shiny);
    }
}
