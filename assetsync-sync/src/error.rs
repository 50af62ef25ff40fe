//! Error types for assetsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use assetsync_core::ConfigError;
use assetsync_scan::ScanError;

/// Errors raised by an [`ObjectStore`](crate::store::ObjectStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("object not found: {0}")]
    NotFound(String),

    /// Attribute sidecar could not be read or written.
    #[error("object attributes JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed listing bucket: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid object key '{0}'")]
    InvalidKey(String),

    #[error("unsupported bucket locator '{0}'; expected a directory path, file:// or mem://")]
    UnsupportedScheme(String),

    /// Failure injected by a test double.
    #[error("injected failure for {0}")]
    Injected(String),
}

/// All errors that can abort a deploy run before execution starts.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
