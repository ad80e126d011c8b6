/*
 * knitr.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Chunk and knit defaults carried by an output format.
 */

//! knitr defaults carried by an output format.
//!
//! These are serialized to JSON for the R side. Chunk option names use
//! kebab-case (`fig-width`), matching what the R scripts expect.
//!
//! ```json
//! {
//!   "opts-knit": {},
//!   "opts-chunk": { "dev": "png", "dpi": 96, "fig-width": 5, "fig-height": 4 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Graphics device used for document formats.
pub const DEFAULT_DEV: &str = "png";

/// Resolution used for document formats.
pub const DEFAULT_DPI: u32 = 96;

/// Default chunk options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChunkDefaults {
    /// Graphics device (e.g. `png`)
    pub dev: String,

    pub dpi: u32,

    /// Figure width in inches
    pub fig_width: f64,

    /// Figure height in inches
    pub fig_height: f64,

    /// Additional chunk options not explicitly defined
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChunkDefaults {
    /// Defaults for document formats: PNG at 96 dpi.
    pub fn for_document(fig_width: f64, fig_height: f64) -> Self {
        Self {
            dev: DEFAULT_DEV.to_string(),
            dpi: DEFAULT_DPI,
            fig_width,
            fig_height,
            extra: Map::new(),
        }
    }
}

/// knitr configuration of an output format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KnitrOptions {
    /// Package-level options (`opts_knit`)
    #[serde(default)]
    pub opts_knit: Map<String, Value>,

    /// Chunk-level defaults (`opts_chunk`)
    pub opts_chunk: ChunkDefaults,
}

impl KnitrOptions {
    pub fn new(opts_chunk: ChunkDefaults) -> Self {
        Self {
            opts_knit: Map::new(),
            opts_chunk,
        }
    }

    /// Layer `overlay` on top of `self`.
    ///
    /// Named chunk fields come from the overlay; free-form options from both
    /// are kept, the overlay winning on conflicts.
    pub fn merged_with(&self, overlay: &KnitrOptions) -> KnitrOptions {
        let mut opts_knit = self.opts_knit.clone();
        opts_knit.extend(overlay.opts_knit.clone());

        let mut extra = self.opts_chunk.extra.clone();
        extra.extend(overlay.opts_chunk.extra.clone());

        KnitrOptions {
            opts_knit,
            opts_chunk: ChunkDefaults {
                extra,
                ..overlay.opts_chunk.clone()
            },
        }
    }

    /// Serialize for the R side.
    pub fn to_json(&self) -> Value {
        // Only maps, strings and numbers: serialization cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
