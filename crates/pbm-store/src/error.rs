//! Error types for the persistence boundary
//!
//! Storage failures are always surfaced; schema mismatches never are (the
//! merge engine heals them locally).

use pbm_document::DocumentError;
use std::path::PathBuf;

/// Errors from a [`crate::KeyValueStore`]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backing store could not serve the request
    #[error("storage unavailable for '{key}': {reason}")]
    Unavailable { key: String, reason: String },

    /// IO error on a file-backed store
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backing data could not be encoded or decoded
    #[error("encoding failed for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Create unavailable error for key
    pub fn unavailable(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether a later attempt may succeed
    ///
    /// Retrying is left to the caller.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Io { .. })
    }
}

/// Errors from an [`crate::Options`] implementation
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    /// Store read/write failed
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Submitted value is not mapping-shaped
    #[error("options for '{key}' must be a mapping")]
    NotAMapping { key: String },

    /// Document could not be encoded
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
}

impl OptionsError {
    /// Whether the failure came from the storage layer
    #[inline]
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
