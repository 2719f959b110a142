use std::{
    ffi::OsStr,
    path::{Path, PathBuf, MAIN_SEPARATOR},
};

/// Replace a leading `~` with the current user's home directory.
///
/// Only `~` on its own or followed by a separator is expanded, `~user` forms
/// are left untouched. When no home directory can be determined the input is
/// returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    match split_home(path) {
        Some((home, "")) => home,
        Some((home, relative)) => home.join(relative),
        None => PathBuf::from(path),
    }
}

/// Split `~/rest` into the home directory and `rest`.
pub(crate) fn split_home(path: &str) -> Option<(PathBuf, &str)> {
    let rest = path.strip_prefix('~')?;
    if !(rest.is_empty() || rest.starts_with(is_separator)) {
        return None;
    }
    let home = dirs::home_dir()?;
    Some((home, rest.trim_start_matches(is_separator)))
}

/// Same as [`expand_home`] but keeps a trailing separator, which carries
/// directory intent for destinations.
pub fn expand_home_str(path: &str) -> String {
    let expanded = expand_home(path).to_string_lossy().into_owned();
    if has_trailing_separator(path) && !has_trailing_separator(&expanded) {
        format!("{expanded}{MAIN_SEPARATOR}")
    } else {
        expanded
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == MAIN_SEPARATOR
}

pub fn has_trailing_separator(path: &str) -> bool {
    path.ends_with(is_separator)
}

/// Expand `~` in `destination` and join it onto `base` when relative. A
/// trailing separator survives both steps.
pub fn anchor_destination(destination: &str, base: Option<&Path>) -> String {
    let destination = expand_home_str(destination);
    match base {
        Some(base) if !base.as_os_str().is_empty() && Path::new(&destination).is_relative() => {
            let joined = base.join(&destination).to_string_lossy().into_owned();
            if has_trailing_separator(&destination) && !has_trailing_separator(&joined) {
                format!("{joined}{MAIN_SEPARATOR}")
            } else {
                joined
            }
        }
        _ => destination,
    }
}

/// Compute where `source` lands when moved or copied to `destination`.
///
/// A destination ending with a separator names a directory and receives the
/// source's base name. Anything else is the exact new path. Several sources
/// sent to the same non-directory destination all resolve to that one path.
pub fn resolve_destination(destination: &str, source: &Path) -> PathBuf {
    let destination = expand_home_str(destination);
    if !has_trailing_separator(&destination) {
        return PathBuf::from(destination);
    }

    let name = source.file_name().unwrap_or_else(|| source.as_os_str());
    PathBuf::from(destination).join(name)
}

/// Decomposed file name of a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParts {
    /// Parent directory.
    pub base: PathBuf,
    /// File name up to its first dot.
    pub name: String,
    /// File name with every extension.
    pub full_name: String,
    /// Lowercase extensions, innermost first (`a.tar.gz` gives `gz`, `tar`).
    pub extensions: Vec<String>,
}

impl PathParts {
    pub fn new(path: &Path) -> Self {
        let full_name = path
            .file_name()
            .map(OsStr::to_string_lossy)
            .unwrap_or_default()
            .into_owned();
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let (name, extensions) = match full_name.find('.') {
            Some(dot) => {
                let extensions = full_name[dot + 1..]
                    .to_lowercase()
                    .split('.')
                    .rev()
                    .map(str::to_string)
                    .collect();
                (full_name[..dot].to_string(), extensions)
            }
            None => (full_name.clone(), Vec::new()),
        };

        Self {
            base,
            name,
            full_name,
            extensions,
        }
    }

    /// The last extension of the file name, if any.
    pub fn extension(&self) -> Option<&str> {
        self.extensions.first().map(String::as_str)
    }
}
