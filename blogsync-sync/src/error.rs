//! Error types for blogsync-sync.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the fallible manifest and filesystem primitives.
///
/// The orchestrator never surfaces these: it logs them and degrades.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest JSON could not be encoded or decoded.
    #[error("manifest JSON error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Manifest decoded but its `totalCount` disagrees with `postSlugs`.
    #[error("inconsistent manifest at {path}: totalCount {total_count} but {slugs} slugs")]
    Inconsistent {
        path: PathBuf,
        total_count: usize,
        slugs: usize,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn json_err(path: impl Into<PathBuf>, source: serde_json::Error) -> SyncError {
    SyncError::Json {
        path: path.into(),
        source,
    }
}
