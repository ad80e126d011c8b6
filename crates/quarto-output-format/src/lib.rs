//! Output format descriptors for pandoc-based document formats
//!
//! This crate turns user-facing output options (table of contents, section
//! numbering, figure sizing, highlighting, templates, reference documents)
//! into the descriptor a render driver consumes: knitr defaults, the pandoc
//! invocation, and a pair of hooks that stage auxiliary files before pandoc
//! runs.
//!
//! # Architecture
//!
//! - [`OutputOptions`] - User configuration, usually from YAML front matter
//! - [`resolve`](resolve::resolve) - Validation and capability gating
//! - [`assemble`](args::assemble) - Ordered pandoc arguments
//! - [`HookSet`] - Pre-processing and intermediates hooks with their state
//! - [`OutputFormat`] - The descriptor handed to the render driver
//!
//! # Example
//!
//! ```ignore
//! use quarto_output_format::{FormatEnvironment, HookContext, OutputOptions, word_document};
//!
//! let options = OutputOptions::from_yaml("toc: true\nreference-doc: house.docx")?;
//! let env = FormatEnvironment::native()?;
//! let mut outcome = word_document(&options, &env)?;
//!
//! let ctx = HookContext::new("report.Rmd", "report_files");
//! let extra = outcome.format.pre_process(&ctx)?;
//! let staged = outcome.format.generate_intermediates(&ctx)?;
//! let argv = outcome
//!     .format
//!     .pandoc()
//!     .command_line("report.knit.md".as_ref(), "report.docx".as_ref(), &extra);
//! ```

pub mod args;
pub mod builder;
pub mod capability;
pub mod descriptor;
pub mod diagnostic;
pub mod error;
pub mod filters;
pub mod format;
pub mod hooks;
pub mod knitr;
pub mod options;
pub mod paths;
pub mod resolve;

// Re-export commonly used types
pub use builder::{
    BuildOutcome, FormatEnvironment, build_output_format, build_output_format_named,
    odt_document, powerpoint_presentation, word_document,
};
pub use capability::{CapabilityOracle, PandocBinary, PandocVersion, StaticCapabilities};
pub use descriptor::{EngineInvocation, OutputFormat};
pub use diagnostic::{CapabilityWarning, GatedFeature};
pub use error::{FormatError, HookError, InvalidOptionError, Result, StagingError};
pub use format::{FormatIdentifier, FormatProfile};
pub use hooks::{HookContext, HookSet, HookStage, HookState, RuntimeMode};
pub use knitr::{ChunkDefaults, KnitrOptions};
pub use options::{Includes, OutputOptions, Setting};
pub use paths::{PandocPathArg, PathNormalizer};
pub use resolve::{DataFramePrint, HighlightStyle};
