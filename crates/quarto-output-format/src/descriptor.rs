/*
 * descriptor.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The output format descriptor consumed by the render driver.
 */

//! Output format descriptor.
//!
//! An [`OutputFormat`] is built once per render and handed to the render
//! driver, which:
//!
//! 1. runs knitr with [`OutputFormat::knitr`],
//! 2. calls [`OutputFormat::pre_process`],
//! 3. calls [`OutputFormat::generate_intermediates`],
//! 4. invokes pandoc with [`OutputFormat::pandoc`].
//!
//! Configuration is read-only after construction. The only mutable part is
//! the hook state, which belongs to this descriptor alone and is reached
//! through `&mut self`.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::HookError;
use crate::format::FormatIdentifier;
use crate::hooks::{HookContext, HookSet};
use crate::knitr::KnitrOptions;
use crate::resolve::DataFramePrint;

/// How the engine is invoked for this format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInvocation {
    /// Target format (`--to`)
    #[serde(rename = "targetFormat")]
    pub to: String,

    /// Source format (`--from`)
    #[serde(rename = "sourceFormat")]
    pub from: String,

    /// Ordered engine arguments
    #[serde(rename = "arguments")]
    pub args: Vec<String>,
}

impl EngineInvocation {
    pub fn new(to: impl Into<String>, from: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            to: to.into(),
            from: from.into(),
            args,
        }
    }

    /// Full pandoc command line (without the program name).
    ///
    /// `extra_args` are the arguments returned by the pre-processing hooks;
    /// they follow the format's own arguments.
    pub fn command_line(&self, input: &Path, output: &Path, extra_args: &[String]) -> Vec<String> {
        let mut line = vec![
            "--from".to_string(),
            self.from.clone(),
            "--to".to_string(),
            self.to.clone(),
            "--output".to_string(),
            output.to_string_lossy().into_owned(),
        ];
        line.extend(self.args.iter().cloned());
        line.extend(extra_args.iter().cloned());
        line.push(input.to_string_lossy().into_owned());
        line
    }
}

/// The descriptor produced by a format builder.
#[derive(Debug)]
pub struct OutputFormat {
    identifier: FormatIdentifier,
    knitr: KnitrOptions,
    pandoc: EngineInvocation,
    keep_md: bool,
    clean_supporting: bool,
    df_print: DataFramePrint,
    hooks: HookSet,
}

impl OutputFormat {
    /// Compose a descriptor from already-resolved parts.
    pub fn new(
        identifier: FormatIdentifier,
        knitr: KnitrOptions,
        pandoc: EngineInvocation,
        keep_md: bool,
        df_print: DataFramePrint,
        hooks: HookSet,
    ) -> Self {
        Self {
            identifier,
            knitr,
            pandoc,
            keep_md,
            clean_supporting: true,
            df_print,
            hooks,
        }
    }

    /// Whether supporting files (`{stem}_files/`) are removed after the
    /// render. Default: `true`.
    pub fn with_clean_supporting(mut self, clean: bool) -> Self {
        self.clean_supporting = clean;
        self
    }

    /// Layer this format on top of `base`.
    ///
    /// - knitr options: `self` overlays `base`
    /// - engine arguments: `base` first, then `self`
    /// - hooks: `base` hooks run first
    /// - everything else comes from `self`
    pub fn with_base(self, base: OutputFormat) -> OutputFormat {
        let knitr = base.knitr.merged_with(&self.knitr);

        let mut args = base.pandoc.args;
        args.extend(self.pandoc.args);

        let mut hooks = base.hooks;
        hooks.extend(self.hooks);

        OutputFormat {
            identifier: self.identifier,
            knitr,
            pandoc: EngineInvocation {
                to: self.pandoc.to,
                from: self.pandoc.from,
                args,
            },
            keep_md: self.keep_md,
            clean_supporting: self.clean_supporting,
            df_print: self.df_print,
            hooks,
        }
    }

    pub fn identifier(&self) -> FormatIdentifier {
        self.identifier
    }

    /// Where the engine writes its output for `input`.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        self.identifier.profile().output_path(input)
    }

    pub fn knitr(&self) -> &KnitrOptions {
        &self.knitr
    }

    pub fn pandoc(&self) -> &EngineInvocation {
        &self.pandoc
    }

    /// Keep the intermediate markdown file.
    pub fn keep_md(&self) -> bool {
        self.keep_md
    }

    pub fn clean_supporting(&self) -> bool {
        self.clean_supporting
    }

    pub fn df_print(&self) -> DataFramePrint {
        self.df_print
    }

    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    /// Run the pre-processing hooks for a render.
    pub fn pre_process(&mut self, ctx: &HookContext) -> Result<Vec<String>, HookError> {
        self.hooks.pre_process(ctx)
    }

    /// Run the intermediates generators for a render.
    pub fn generate_intermediates(&mut self, ctx: &HookContext) -> Result<Vec<PathBuf>, HookError> {
        self.hooks.generate_intermediates(ctx)
    }

    /// A JSON view of the descriptor, for logs and for the knitr side.
    pub fn summary(&self) -> serde_json::Value {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Summary<'a> {
            format: FormatIdentifier,
            knitr_defaults: &'a KnitrOptions,
            engine_invocation: &'a EngineInvocation,
            keep_intermediate_markdown: bool,
            data_frame_print_mode: &'static str,
            pre_process_hooks: Vec<&'a str>,
            intermediate_generator_hooks: Vec<&'a str>,
        }

        let summary = Summary {
            format: self.identifier,
            knitr_defaults: &self.knitr,
            engine_invocation: &self.pandoc,
            keep_intermediate_markdown: self.keep_md,
            data_frame_print_mode: self.df_print.as_str(),
            pre_process_hooks: self.hooks.pre_processor_names(),
            intermediate_generator_hooks: self.hooks.intermediates_generator_names(),
        };
        serde_json::to_value(summary).unwrap_or(serde_json::Value::Null)
    }
}
