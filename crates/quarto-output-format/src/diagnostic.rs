/*
 * diagnostic.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Non-fatal diagnostics produced while building a format.
 */

//! Capability warnings.
//!
//! When a requested feature needs a newer engine than the one detected, the
//! builder keeps going without the corresponding argument. The omission is
//! reported as a [`CapabilityWarning`], both returned to the caller and
//! logged through `tracing`.

use std::fmt;

use serde::Serialize;

use crate::capability::PandocVersion;
use crate::format::FormatIdentifier;

/// A feature whose argument depends on the engine version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GatedFeature {
    /// `number-sections`
    NumberSections,
    /// `reference-doc`
    ReferenceDoc,
}

impl fmt::Display for GatedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatedFeature::NumberSections => write!(f, "number-sections"),
            GatedFeature::ReferenceDoc => write!(f, "reference-doc"),
        }
    }
}

/// A requested feature was dropped because the engine cannot honor it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CapabilityWarning {
    pub feature: GatedFeature,
    pub format: FormatIdentifier,
    /// Minimum engine version, or `None` if no version supports it for
    /// this format.
    pub required: Option<PandocVersion>,
    /// Version that was detected, if any
    pub detected: Option<PandocVersion>,
}

impl CapabilityWarning {
    pub fn new(
        feature: GatedFeature,
        format: FormatIdentifier,
        required: Option<PandocVersion>,
        detected: Option<PandocVersion>,
    ) -> Self {
        Self {
            feature,
            format,
            required,
            detected,
        }
    }

    /// Log this warning.
    pub fn emit(&self) {
        tracing::warn!(
            feature = %self.feature,
            format = %self.format,
            "{}",
            self
        );
    }
}

impl fmt::Display for CapabilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.required {
            Some(required) => {
                write!(
                    f,
                    "{} requires pandoc >= {} for {} output",
                    self.feature, required, self.format
                )?;
                match self.detected {
                    Some(detected) => write!(f, " (found {})", detected)?,
                    None => write!(f, " (pandoc not found)")?,
                }
            }
            None => write!(f, "{} is not supported for {} output", self.feature, self.format)?,
        }
        write!(f, "; ignoring it")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_detected_version() {
        let w = CapabilityWarning::new(
            GatedFeature::NumberSections,
            FormatIdentifier::Docx,
            Some(PandocVersion::new(2, 10, 1)),
            Some(PandocVersion::new(2, 9, 0)),
        );
        assert_eq!(
            w.to_string(),
            "number-sections requires pandoc >= 2.10.1 for docx output (found 2.9.0); ignoring it"
        );
    }

    #[test]
    fn test_display_without_engine() {
        let w = CapabilityWarning::new(
            GatedFeature::ReferenceDoc,
            FormatIdentifier::Pptx,
            Some(PandocVersion::new(2, 1, 0)),
            None,
        );
        assert_eq!(
            w.to_string(),
            "reference-doc requires pandoc >= 2.1.0 for pptx output (pandoc not found); ignoring it"
        );
    }

    #[test]
    fn test_display_never_supported() {
        let w = CapabilityWarning::new(
            GatedFeature::NumberSections,
            FormatIdentifier::Pptx,
            None,
            Some(PandocVersion::new(3, 1, 0)),
        );
        assert_eq!(
            w.to_string(),
            "number-sections is not supported for pptx output; ignoring it"
        );
    }

    #[test]
    fn test_serializes_kebab_case() {
        let w = CapabilityWarning::new(
            GatedFeature::ReferenceDoc,
            FormatIdentifier::Pptx,
            Some(PandocVersion::new(2, 1, 0)),
            None,
        );
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["feature"], "reference-doc");
        assert_eq!(json["format"], "pptx");
        assert_eq!(json["required"]["minor"], 1);
        assert!(json["detected"].is_null());
    }
}
