/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * User-facing output format options.
 */

//! User-facing options for document output formats.
//!
//! [`OutputOptions`] is what a user writes under a format key in document
//! front matter:
//!
//! ```yaml
//! toc: true
//! toc-depth: 2
//! highlight: zenburn
//! reference-doc: styles/house.odt
//! includes:
//!   in-header: header.xml
//! pandoc-args: ["--wrap=none"]
//! ```
//!
//! The values here are raw: enumerations are plain strings and are only
//! checked by [`crate::resolve`]. The one exception is the reserved
//! `"default"` sentinel, which becomes [`Setting::Default`] at parse time.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

use crate::error::Result;

/// The reserved value meaning "use the built-in style".
pub const DEFAULT_SENTINEL: &str = "default";

/// An option that is either the built-in default or an explicit value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Setting<T> {
    /// Use the built-in style
    #[default]
    Default,
    /// A value chosen by the user
    Explicit(T),
}

impl<T> Setting<T> {
    pub fn is_default(&self) -> bool {
        matches!(self, Setting::Default)
    }

    /// The explicit value, if any.
    pub fn explicit(&self) -> Option<&T> {
        match self {
            Setting::Default => None,
            Setting::Explicit(value) => Some(value),
        }
    }
}

impl Setting<PathBuf> {
    /// Interpret a raw option string, recognizing the sentinel first.
    pub fn from_raw(raw: &str) -> Self {
        if raw == DEFAULT_SENTINEL {
            Setting::Default
        } else {
            Setting::Explicit(PathBuf::from(raw))
        }
    }
}

impl From<&str> for Setting<PathBuf> {
    fn from(raw: &str) -> Self {
        Setting::from_raw(raw)
    }
}

impl<'de> Deserialize<'de> for Setting<PathBuf> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // null is treated like the sentinel
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(Setting::Default, Setting::from_raw))
    }
}

/// Extra content fragments spliced into the output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Includes {
    #[serde(deserialize_with = "one_or_many")]
    pub in_header: Vec<PathBuf>,
    #[serde(deserialize_with = "one_or_many")]
    pub before_body: Vec<PathBuf>,
    #[serde(deserialize_with = "one_or_many")]
    pub after_body: Vec<PathBuf>,
}

impl Includes {
    pub fn is_empty(&self) -> bool {
        self.in_header.is_empty() && self.before_body.is_empty() && self.after_body.is_empty()
    }
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(PathBuf),
        Many(Vec<PathBuf>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(path)) => vec![path],
        Some(OneOrMany::Many(paths)) => paths,
    })
}

/// Options accepted by the document format builders.
///
/// Defaults match the document formats: no table of contents, 5x4 inch
/// figures with captions, the built-in template and reference document, and
/// the default highlighting theme.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutputOptions {
    /// Include a table of contents
    pub toc: bool,

    /// Heading depth of the table of contents; must be positive when `toc`
    /// is set
    pub toc_depth: i64,

    /// Number section headings
    pub number_sections: bool,

    /// Default figure width in inches
    pub fig_width: f64,

    /// Default figure height in inches
    pub fig_height: f64,

    /// Render figures with captions (`implicit_figures`)
    pub fig_caption: bool,

    /// How data frames are printed by the knitr side
    pub df_print: String,

    /// Syntax highlighting theme; `None` disables highlighting
    pub highlight: Option<String>,

    /// Engine template
    pub template: Setting<PathBuf>,

    /// Reference (style) document
    pub reference_doc: Setting<PathBuf>,

    pub includes: Includes,

    /// Markdown extensions, e.g. `+hard_line_breaks-smart`
    pub md_extensions: Option<String>,

    /// Arguments appended verbatim after everything else
    pub pandoc_args: Vec<String>,

    /// Keep the intermediate markdown file
    pub keep_md: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            toc: false,
            toc_depth: 3,
            number_sections: false,
            fig_width: 5.0,
            fig_height: 4.0,
            fig_caption: true,
            df_print: DEFAULT_SENTINEL.to_string(),
            highlight: Some(DEFAULT_SENTINEL.to_string()),
            template: Setting::Default,
            reference_doc: Setting::Default,
            includes: Includes::default(),
            md_extensions: None,
            pandoc_args: Vec::new(),
            keep_md: false,
        }
    }
}

impl OutputOptions {
    /// Parse an options block written in YAML.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;

    #[test]
    fn test_defaults() {
        let opts = OutputOptions::default();
        assert!(!opts.toc);
        assert_eq!(opts.toc_depth, 3);
        assert_eq!(opts.fig_width, 5.0);
        assert_eq!(opts.fig_height, 4.0);
        assert!(opts.fig_caption);
        assert_eq!(opts.highlight.as_deref(), Some("default"));
        assert!(opts.template.is_default());
        assert!(opts.reference_doc.is_default());
        assert!(opts.includes.is_empty());
    }

    #[test]
    fn test_sentinel_is_not_a_path() {
        assert_eq!(Setting::from_raw("default"), Setting::Default);
        assert_eq!(
            Setting::from_raw("Default"),
            Setting::Explicit(PathBuf::from("Default"))
        );
        assert_eq!(
            Setting::from("style.odt").explicit(),
            Some(&PathBuf::from("style.odt"))
        );
    }

    #[test]
    fn test_from_yaml_kebab_case() {
        let opts = OutputOptions::from_yaml(
            "toc: true\ntoc-depth: 2\nhighlight: zenburn\nreference-doc: house.odt\nkeep-md: true\n",
        )
        .unwrap();
        assert!(opts.toc);
        assert_eq!(opts.toc_depth, 2);
        assert_eq!(opts.highlight.as_deref(), Some("zenburn"));
        assert_eq!(opts.reference_doc, Setting::Explicit(PathBuf::from("house.odt")));
        assert!(opts.keep_md);
        // Untouched fields keep their defaults
        assert_eq!(opts.fig_width, 5.0);
        assert!(opts.template.is_default());
    }

    #[test]
    fn test_from_yaml_sentinel_and_null() {
        let opts = OutputOptions::from_yaml("template: default\nreference-doc: ~\nhighlight: ~\n")
            .unwrap();
        assert!(opts.template.is_default());
        assert!(opts.reference_doc.is_default());
        assert_eq!(opts.highlight, None);
    }

    #[test]
    fn test_from_yaml_includes_one_or_many() {
        let opts = OutputOptions::from_yaml(
            "includes:\n  in-header: header.xml\n  after-body: [a.xml, b.xml]\n",
        )
        .unwrap();
        assert_eq!(opts.includes.in_header, vec![PathBuf::from("header.xml")]);
        assert!(opts.includes.before_body.is_empty());
        assert_eq!(
            opts.includes.after_body,
            vec![PathBuf::from("a.xml"), PathBuf::from("b.xml")]
        );
    }

    #[test]
    fn test_from_yaml_empty_is_default() {
        assert_eq!(OutputOptions::from_yaml("  \n").unwrap(), OutputOptions::default());
    }

    #[test]
    fn test_from_yaml_rejects_unknown_keys() {
        let err = OutputOptions::from_yaml("tocdepth: 2\n").unwrap_err();
        assert!(matches!(err, FormatError::Yaml(_)));
        assert!(err.to_string().contains("tocdepth"));
    }
}
