/*
 * filters.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Built-in Lua filters embedded in the binary.
 */

//! Built-in Lua filters.
//!
//! Filters attached by format profiles (see [`crate::format::BuiltinFilter`])
//! are compiled into the crate and written to disk before the engine needs
//! them. [`BUILTIN_FILTERS`] extracts them to a per-process temp directory on
//! first access:
//!
//! ```text
//! {temp_dir}/quarto-filters-{pid}/
//! └── pagebreak.lua
//! ```

use std::io;
use std::path::{Path, PathBuf};

use include_dir::{Dir, include_dir};
use once_cell::sync::OnceCell;

static FILTERS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/resources/filters");

/// Embedded filter files and their on-disk location.
pub struct FilterBundle {
    dir: &'static Dir<'static>,
    extracted: OnceCell<PathBuf>,
}

/// The filters shipped with this crate.
pub static BUILTIN_FILTERS: FilterBundle = FilterBundle::new(&FILTERS_DIR);

impl FilterBundle {
    pub const fn new(dir: &'static Dir<'static>) -> Self {
        Self {
            dir,
            extracted: OnceCell::new(),
        }
    }

    /// File names of the embedded filters.
    pub fn names(&self) -> Vec<&'static str> {
        self.dir
            .files()
            .filter_map(|f| f.path().file_name().and_then(|n| n.to_str()))
            .collect()
    }

    /// Source of one embedded filter.
    pub fn contents(&self, name: &str) -> Option<&'static str> {
        self.dir.get_file(name).and_then(|f| f.contents_utf8())
    }

    /// Write every filter into `dest`, creating it if needed.
    pub fn extract_to(&self, dest: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dest)?;
        self.dir.extract(dest)
    }

    /// Directory holding the extracted filters, extracting on first call.
    pub fn path(&self) -> io::Result<&Path> {
        self.extracted
            .get_or_try_init(|| {
                let dest =
                    std::env::temp_dir().join(format!("quarto-filters-{}", std::process::id()));
                self.extract_to(&dest)?;
                tracing::debug!(dir = %dest.display(), "Extracted built-in filters");
                Ok(dest)
            })
            .map(PathBuf::as_path)
    }
}
