//! Error taxonomy shared by the store, passes, and persistence layer.
//!
//! Most faults are recovered where they happen (a document that cannot be
//! read is skipped, a history file that cannot be written is logged). The
//! variants below are what can still travel up to a caller.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DocvetError {
    #[error("failed to read or write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Raised by the interactive prompt when the user aborts the run.
    #[error("interrupted by user")]
    Interrupted,
}

impl DocvetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DocvetError>;
