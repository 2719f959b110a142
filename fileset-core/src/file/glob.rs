//! Expansion of glob patterns into ordered path lists.
//!
//! Patterns use the usual syntax: `*` and `?` stay inside one path
//! component, `**` crosses directories and `[abc]` is a character class.
//! Matches come back in the order the walk produces them, which is sorted
//! per directory, and that order is what entry sets keep.

use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use glob::{MatchOptions, Pattern};

use crate::config::Options;
use crate::error::{FileSetError, Result};
use crate::file::resolver::{expand_home, split_home};

/// How a pattern becomes a list of paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// Regular expansion. A pattern without matches gives an empty list.
    #[default]
    ExistingOnly,
    /// Always empty, whatever exists on disk. Used to target new paths.
    ForceEmpty,
    /// The pattern is a plain path and is returned as-is, existing or not.
    Literal,
}

/// True when `pattern` contains characters the glob syntax interprets.
pub fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', ']'])
}

/// Escape glob metacharacters so `path` only matches itself.
pub fn escape_glob(path: &str) -> String {
    Pattern::escape(path)
}

/// Expand `pattern` according to `mode`. A leading `~` is the home directory,
/// relative patterns are anchored on `options.cwd` when set.
pub fn resolve(pattern: &str, mode: ResolveMode, options: &Options) -> Result<Vec<PathBuf>> {
    if pattern.is_empty() {
        return Err(FileSetError::MissingPath);
    }

    match mode {
        ResolveMode::ForceEmpty => Ok(Vec::new()),
        ResolveMode::Literal => Ok(vec![literal_path(pattern, options)?]),
        ResolveMode::ExistingOnly => expand(pattern, options),
    }
}

/// The path a pattern names when taken literally: home expanded and anchored
/// on `options.cwd`.
fn literal_path(pattern: &str, options: &Options) -> Result<PathBuf> {
    if pattern.is_empty() {
        return Err(FileSetError::MissingPath);
    }
    Ok(options.anchor(&expand_home(pattern)))
}

fn expand(pattern: &str, options: &Options) -> Result<Vec<PathBuf>> {
    let full_pattern = anchored_pattern(pattern, options);
    let match_options = MatchOptions {
        case_sensitive: options.case_sensitive,
        require_literal_separator: true,
        require_literal_leading_dot: !options.include_dotfiles,
    };

    let entries =
        glob::glob_with(&full_pattern, match_options).map_err(|source| FileSetError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => paths.push(path),
            Err(e) => {
                let path = e.path().to_path_buf();
                return Err(FileSetError::io(path, io::Error::from(e)));
            }
        }
    }
    Ok(paths)
}

/// Build the pattern handed to the matcher: home and cwd prefixes are
/// escaped so their characters match literally, and trailing separators are
/// dropped.
fn anchored_pattern(pattern: &str, options: &Options) -> String {
    let pattern = match split_home(pattern) {
        Some((home, rest)) => join_pattern(&escape_glob(&home.to_string_lossy()), rest),
        None => pattern.to_string(),
    };

    let pattern = match &options.cwd {
        Some(cwd) if Path::new(&pattern).is_relative() => {
            join_pattern(&escape_glob(&cwd.to_string_lossy()), &pattern)
        }
        _ => pattern,
    };

    let trimmed = pattern.trim_end_matches(['/', MAIN_SEPARATOR]);
    if trimmed.is_empty() {
        pattern
    } else {
        trimmed.to_string()
    }
}

fn join_pattern(prefix: &str, rest: &str) -> String {
    if rest.is_empty() {
        return prefix.to_string();
    }
    let prefix = prefix.trim_end_matches(['/', MAIN_SEPARATOR]);
    format!("{prefix}{MAIN_SEPARATOR}{rest}")
}
