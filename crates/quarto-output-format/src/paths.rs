/*
 * paths.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Path normalization for engine arguments.
 */

//! Turning user paths into engine arguments.

use std::path::{Path, PathBuf};

/// Converts a user-supplied path into the string passed to the engine.
pub trait PathNormalizer: Send + Sync {
    fn normalize(&self, path: &Path) -> String;
}

/// Default normalization for pandoc arguments.
///
/// - A leading `~` is expanded to the home directory.
/// - On Windows, separators are converted to forward slashes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PandocPathArg;

impl PathNormalizer for PandocPathArg {
    fn normalize(&self, path: &Path) -> String {
        let expanded = expand_tilde(path);
        let text = expanded.to_string_lossy();
        if cfg!(windows) {
            text.replace('\\', "/")
        } else {
            text.into_owned()
        }
    }
}

/// Expand a leading `~` to the home directory.
pub(crate) fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_relative_path_unchanged() {
        assert_eq!(PandocPathArg.normalize(Path::new("styles/house.odt")), "styles/house.odt");
    }

    #[test]
    fn test_tilde_only_expanded_as_prefix() {
        assert_eq!(PandocPathArg.normalize(Path::new("a/~/b")), "a/~/b");
        assert_eq!(PandocPathArg.normalize(Path::new("~user.odt")), "~user.odt");
    }

    #[test]
    fn test_tilde_expands_to_home() {
        let Some(home) = home_dir() else {
            return;
        };
        let normalized = PandocPathArg.normalize(Path::new("~/templates/t.odt"));
        let expected = PandocPathArg.normalize(&home.join("templates/t.odt"));
        assert_eq!(normalized, expected);
        assert!(!normalized.starts_with('~'));
    }
}
