/*
 * format.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Output format identifiers and per-format engine profiles.
 */

//! Output format identifiers and their engine profiles.
//!
//! Each format builder shares the same descriptor protocol; what differs is
//! captured in a static [`FormatProfile`]: the Pandoc writer name, which
//! engine versions understand numbered sections and reference documents,
//! and which built-in filters are attached.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::capability::PandocVersion;

/// Format identifier enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatIdentifier {
    /// OpenDocument text
    Odt,
    /// Word document
    Docx,
    /// PowerPoint presentation
    Pptx,
}

impl FormatIdentifier {
    /// Every known format, in declaration order.
    pub const ALL: [FormatIdentifier; 3] = [
        FormatIdentifier::Odt,
        FormatIdentifier::Docx,
        FormatIdentifier::Pptx,
    ];

    /// Get the format name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatIdentifier::Odt => "odt",
            FormatIdentifier::Docx => "docx",
            FormatIdentifier::Pptx => "pptx",
        }
    }

    /// The engine profile for this format
    pub fn profile(&self) -> &'static FormatProfile {
        match self {
            FormatIdentifier::Odt => &ODT,
            FormatIdentifier::Docx => &DOCX,
            FormatIdentifier::Pptx => &PPTX,
        }
    }
}

impl std::fmt::Display for FormatIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for FormatIdentifier {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "odt" | "odt_document" => Ok(FormatIdentifier::Odt),
            "docx" | "word_document" => Ok(FormatIdentifier::Docx),
            "pptx" | "powerpoint_presentation" => Ok(FormatIdentifier::Pptx),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// How a format accepts a reference (style) document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceDocSupport {
    /// First engine version understanding `--reference-doc` for this format
    pub since: PandocVersion,
    /// Format-specific flag accepted by older engines, if any
    pub legacy_flag: Option<&'static str>,
}

/// A Lua filter shipped with this crate and attached to a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinFilter {
    /// File name inside the filter directory
    pub name: &'static str,
    /// Minimum engine version able to run it
    pub since: PandocVersion,
}

/// Static description of what a format needs from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatProfile {
    pub identifier: FormatIdentifier,

    /// Pandoc writer name (`--to`)
    pub pandoc_to: &'static str,

    /// Output file extension (without leading dot)
    pub output_extension: &'static str,

    /// First engine version that numbers sections natively, or `None` if
    /// the writer never does
    pub number_sections_since: Option<PandocVersion>,

    pub reference_doc: ReferenceDocSupport,

    pub builtin_filters: &'static [BuiltinFilter],
}

/// Converts `\newpage`/`\pagebreak` into native page breaks.
pub const PAGEBREAK_FILTER: BuiltinFilter = BuiltinFilter {
    name: "pagebreak.lua",
    since: PandocVersion::new(2, 0, 0),
};

const ODT: FormatProfile = FormatProfile {
    identifier: FormatIdentifier::Odt,
    pandoc_to: "odt",
    output_extension: "odt",
    number_sections_since: Some(PandocVersion::new(1, 0, 0)),
    reference_doc: ReferenceDocSupport {
        since: PandocVersion::new(2, 0, 0),
        legacy_flag: Some("--reference-odt"),
    },
    builtin_filters: &[PAGEBREAK_FILTER],
};

const DOCX: FormatProfile = FormatProfile {
    identifier: FormatIdentifier::Docx,
    pandoc_to: "docx",
    output_extension: "docx",
    number_sections_since: Some(PandocVersion::new(2, 10, 1)),
    reference_doc: ReferenceDocSupport {
        since: PandocVersion::new(2, 0, 0),
        legacy_flag: Some("--reference-docx"),
    },
    builtin_filters: &[PAGEBREAK_FILTER],
};

const PPTX: FormatProfile = FormatProfile {
    identifier: FormatIdentifier::Pptx,
    pandoc_to: "pptx",
    output_extension: "pptx",
    number_sections_since: None,
    reference_doc: ReferenceDocSupport {
        since: PandocVersion::new(2, 1, 0),
        legacy_flag: None,
    },
    builtin_filters: &[],
};

impl FormatProfile {
    /// Get the output file path for an input file
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let mut output = input.to_path_buf();
        output.set_extension(self.output_extension);
        output
    }
}
