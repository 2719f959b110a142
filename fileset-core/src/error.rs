use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::Encoding;

pub type Result<T, E = FileSetError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum FileSetError {
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid glob pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Unable to decode {format} content: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },

    #[error("Unable to encode {format} content: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    #[error("A path or pattern is required")]
    MissingPath,

    #[error("{pattern:?} targets {count} entries, expected a single target")]
    NotSingleTarget { pattern: String, count: usize },

    #[error("Character {character:?} cannot be written as {encoding}")]
    Unencodable {
        encoding: Encoding,
        character: char,
    },

    #[error("Path is not a file: {}", path.display())]
    NotAFile { path: PathBuf },

    #[error("Path is not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Cannot copy or move {} into itself at {}", from.display(), to.display())]
    NestedDestination { from: PathBuf, to: PathBuf },

    #[error("Configuration error: {0:#}")]
    Config(anyhow::Error),
}

impl FileSetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(format: &'static str, source: impl std::fmt::Display) -> Self {
        Self::Decode {
            format,
            message: source.to_string(),
        }
    }

    pub(crate) fn encode(format: &'static str, source: impl std::fmt::Display) -> Self {
        Self::Encode {
            format,
            message: source.to_string(),
        }
    }

    /// True when the failure is an I/O error caused by a missing path.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

impl From<anyhow::Error> for FileSetError {
    fn from(source: anyhow::Error) -> Self {
        Self::Config(source)
    }
}
