//! Error types for the index store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while opening, managing, or querying the index store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A SQL statement or connection-level operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The connection pool could not be built or a checkout timed out.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A file-system operation on the state directory failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// The path being operated on.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A JSON column could not be encoded or decoded.
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The existing database has an incompatible schema and the recovery
    /// policy forbids discarding it.
    #[error("incompatible index schema (found version {found}, expected {expected})")]
    IncompatibleSchema {
        /// Version stamped in the existing file, if any could be read.
        found: i64,
        /// Version this build expects.
        expected: i64,
    },

    /// The store has been disposed and no longer owns a pool.
    #[error("index store has been disposed")]
    Disposed,

    /// Every open attempt failed.
    #[error("failed to open index store after {attempts} attempt(s): {source}")]
    OpenExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The error from the last attempt.
        source: Box<StoreError>,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether discarding the database files and trying again could fix
    /// this error.
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Pool(_))
    }
}

/// Result type alias for the index store.
pub type Result<T> = std::result::Result<T, StoreError>;
