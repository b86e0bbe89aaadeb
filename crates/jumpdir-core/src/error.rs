//! Error types for jumpdir.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level result type for jumpdir operations.
pub type Result<T> = std::result::Result<T, JumpError>;

/// Top-level error type for jumpdir.
#[derive(Debug, Error)]
pub enum JumpError {
    #[error("history error: {0}")]
    History(#[from] HistoryError),

    #[error("filesystem error: {0}")]
    Fs(#[from] FsError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("usage error: {0}")]
    Usage(String),

    #[error("config error: {0}")]
    Config(String),
}

impl JumpError {
    /// Process exit status for this error.
    ///
    /// Usage errors exit with 2; every other failure exits with 1.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => 2,
            _ => 1,
        }
    }
}

/// Errors raised while loading, storing, or locking the history file.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history file {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("history file {} uses format version {found}, which this build cannot read", path.display())]
    UnsupportedVersion { path: PathBuf, found: u16 },

    #[error("failed to write history file {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {waited:?} waiting for lock {}", path.display())]
    LockTimeout { path: PathBuf, waited: Duration },
}

/// Errors reported by a filesystem collaborator.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such directory: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Terminal outcomes of a resolution request that did not reach a directory.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no directory matches '{destination}'")]
    NotFound { destination: String },

    #[error("'{destination}' is ambiguous ({} equally ranked candidates)", candidates.len())]
    Ambiguous {
        destination: String,
        candidates: Vec<String>,
    },

    #[error("filesystem error: {0}")]
    Fs(#[from] FsError),
}
