/*
 * resolve.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Option validation and capability gating.
 */

//! Option resolution.
//!
//! [`resolve`] validates raw [`OutputOptions`] against a format profile and
//! the engine's capabilities, producing [`ResolvedOptions`]:
//!
//! - Enumerated options (highlight theme, data frame printing) are checked
//!   against their closed sets. Unknown values are fatal.
//! - Features the detected engine cannot honor are dropped with a
//!   [`CapabilityWarning`] instead of failing.
//! - `Setting::Default` values skip path handling entirely.
//!
//! Resolution is pure: the only input besides the options is the read-only
//! [`CapabilityOracle`].

use std::fmt;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::capability::CapabilityOracle;
use crate::diagnostic::{CapabilityWarning, GatedFeature};
use crate::error::InvalidOptionError;
use crate::format::{BuiltinFilter, FormatIdentifier, FormatProfile};
use crate::options::{DEFAULT_SENTINEL, Includes, OutputOptions, Setting};

/// Base markdown dialect read by the engine.
pub const MARKDOWN_BASE: &str = "markdown+autolink_bare_uris+tex_math_single_backslash";

/// Accepted values of the `highlight` option.
pub const HIGHLIGHT_STYLES: &[&str] = &[
    DEFAULT_SENTINEL,
    "tango",
    "pygments",
    "kate",
    "monochrome",
    "espresso",
    "zenburn",
    "haddock",
    "breezedark",
];

/// Accepted values of the `df-print` option.
pub const DF_PRINT_MODES: &[&str] = &[DEFAULT_SENTINEL, "kable", "tibble", "paged"];

/// A syntax highlighting theme understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightStyle {
    Tango,
    Pygments,
    Kate,
    Monochrome,
    Espresso,
    Zenburn,
    Haddock,
    Breezedark,
}

impl HighlightStyle {
    /// Parse a theme name. `"default"` selects tango.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            DEFAULT_SENTINEL | "tango" => HighlightStyle::Tango,
            "pygments" => HighlightStyle::Pygments,
            "kate" => HighlightStyle::Kate,
            "monochrome" => HighlightStyle::Monochrome,
            "espresso" => HighlightStyle::Espresso,
            "zenburn" => HighlightStyle::Zenburn,
            "haddock" => HighlightStyle::Haddock,
            "breezedark" => HighlightStyle::Breezedark,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightStyle::Tango => "tango",
            HighlightStyle::Pygments => "pygments",
            HighlightStyle::Kate => "kate",
            HighlightStyle::Monochrome => "monochrome",
            HighlightStyle::Espresso => "espresso",
            HighlightStyle::Zenburn => "zenburn",
            HighlightStyle::Haddock => "haddock",
            HighlightStyle::Breezedark => "breezedark",
        }
    }
}

impl fmt::Display for HighlightStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How data frames are printed in chunk output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataFramePrint {
    #[default]
    Default,
    Kable,
    Tibble,
    Paged,
}

impl DataFramePrint {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            DEFAULT_SENTINEL => DataFramePrint::Default,
            "kable" => DataFramePrint::Kable,
            "tibble" => DataFramePrint::Tibble,
            "paged" => DataFramePrint::Paged,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataFramePrint::Default => DEFAULT_SENTINEL,
            DataFramePrint::Kable => "kable",
            DataFramePrint::Tibble => "tibble",
            DataFramePrint::Paged => "paged",
        }
    }
}

/// A reference document the engine will be pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDocArg {
    /// `--reference-doc` or a legacy per-format flag
    pub flag: &'static str,
    /// Path as written by the user
    pub path: PathBuf,
}

/// Options after validation and capability gating.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub format: FormatIdentifier,

    /// Requested TOC depth; `None` when no TOC was requested. The depth is
    /// checked by the argument assembler.
    pub toc_depth: Option<i64>,

    /// Numbering was requested and the engine supports it
    pub number_sections: bool,

    pub template: Setting<PathBuf>,

    /// `None` when highlighting is disabled
    pub highlight: Option<HighlightStyle>,

    pub includes: Includes,

    /// `None` for the built-in default, or when the engine cannot take one
    pub reference_doc: Option<ReferenceDocArg>,

    /// Built-in filters the engine can run
    pub filters: Vec<BuiltinFilter>,

    pub pandoc_args: Vec<String>,

    /// Source format (`--from`)
    pub from: String,

    pub df_print: DataFramePrint,
    pub fig_width: f64,
    pub fig_height: f64,
    pub keep_md: bool,

    /// Features dropped because of engine limitations
    pub warnings: Vec<CapabilityWarning>,
}

/// Validate and normalize `options` for `profile`.
pub fn resolve(
    profile: &FormatProfile,
    options: &OutputOptions,
    oracle: &dyn CapabilityOracle,
) -> Result<ResolvedOptions, InvalidOptionError> {
    let format = profile.identifier;
    let detected = oracle.pandoc_version();
    let mut warnings = Vec::new();

    let highlight = match options.highlight.as_deref() {
        None => None,
        Some(name) => Some(
            HighlightStyle::parse(name)
                .ok_or_else(|| InvalidOptionError::not_one_of("highlight", name, HIGHLIGHT_STYLES))?,
        ),
    };

    let df_print = DataFramePrint::parse(&options.df_print).ok_or_else(|| {
        InvalidOptionError::not_one_of("df-print", options.df_print.as_str(), DF_PRINT_MODES)
    })?;

    // Checked even when `toc` is off
    if options.toc_depth <= 0 {
        return Err(InvalidOptionError::invalid(
            "toc-depth",
            options.toc_depth.to_string(),
            "a positive integer",
        ));
    }

    let fig_width = positive_dimension("fig-width", options.fig_width)?;
    let fig_height = positive_dimension("fig-height", options.fig_height)?;

    let from = source_format(options.fig_caption, options.md_extensions.as_deref())?;

    let number_sections = options.number_sections
        && match profile.number_sections_since {
            Some(since) if oracle.supports(since) => true,
            required => {
                warnings.push(CapabilityWarning::new(
                    GatedFeature::NumberSections,
                    format,
                    required,
                    detected,
                ));
                false
            }
        };

    let reference_doc = match &options.reference_doc {
        Setting::Default => None,
        Setting::Explicit(path) => {
            let support = profile.reference_doc;
            let flag = if oracle.supports(support.since) {
                Some("--reference-doc")
            } else {
                support.legacy_flag
            };
            match flag {
                Some(flag) => Some(ReferenceDocArg {
                    flag,
                    path: path.clone(),
                }),
                None => {
                    warnings.push(CapabilityWarning::new(
                        GatedFeature::ReferenceDoc,
                        format,
                        Some(support.since),
                        detected,
                    ));
                    None
                }
            }
        }
    };

    let filters = profile
        .builtin_filters
        .iter()
        .filter(|filter| {
            let supported = oracle.supports(filter.since);
            if !supported {
                tracing::debug!(
                    filter = filter.name,
                    format = %format,
                    "Skipping built-in filter unsupported by this pandoc"
                );
            }
            supported
        })
        .copied()
        .collect();

    for warning in &warnings {
        warning.emit();
    }

    Ok(ResolvedOptions {
        format,
        toc_depth: options.toc.then_some(options.toc_depth),
        number_sections,
        template: options.template.clone(),
        highlight,
        includes: options.includes.clone(),
        reference_doc,
        filters,
        pandoc_args: options.pandoc_args.clone(),
        from,
        df_print,
        fig_width,
        fig_height,
        keep_md: options.keep_md,
        warnings,
    })
}

fn positive_dimension(field: &str, value: f64) -> Result<f64, InvalidOptionError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(InvalidOptionError::invalid(
            field,
            value.to_string(),
            "a positive number of inches",
        ))
    }
}

/// Compose the engine's source format from the caption flag and user
/// extensions.
fn source_format(fig_caption: bool, md_extensions: Option<&str>) -> Result<String, InvalidOptionError> {
    static EXTENSIONS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(?:[+-][a-z0-9_]+)+$").expect("valid regex"));

    let mut from = String::from(MARKDOWN_BASE);
    if !fig_caption {
        from.push_str("-implicit_figures");
    }
    if let Some(ext) = md_extensions.map(str::trim).filter(|e| !e.is_empty()) {
        if !EXTENSIONS.is_match(ext) {
            return Err(InvalidOptionError::invalid(
                "md-extensions",
                ext,
                "extensions like +name or -name",
            ));
        }
        from.push_str(ext);
    }
    Ok(from)
}
