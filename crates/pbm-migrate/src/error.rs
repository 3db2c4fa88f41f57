//! Error types for migrations

use pbm_document::SchemaVersion;
use pbm_store::StoreError;

/// Failure reported by a single step
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct StepError(String);

impl StepError {
    /// Create step error with message
    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Error message
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Errors from [`crate::Migrator::run`]
///
/// Either way the Version Marker is left untouched, so the next run
/// re-detects the same outdated version.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Reading or writing document or marker failed
    #[error("storage error during migration of '{key}': {source}")]
    Storage {
        key: String,
        #[source]
        source: StoreError,
    },

    /// A step could not complete
    #[error("migration step '{step}' ({threshold}) failed for '{key}': {source}")]
    StepFailed {
        key: String,
        step: String,
        threshold: SchemaVersion,
        #[source]
        source: StepError,
    },

    /// Migrated document could not be encoded
    #[error("failed to encode migrated '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl MigrationError {
    /// Create storage error for key
    pub fn storage(key: impl Into<String>, source: StoreError) -> Self {
        Self::Storage {
            key: key.into(),
            source,
        }
    }

    /// Storage key of the domain that failed
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Storage { key, .. } | Self::StepFailed { key, .. } | Self::Encode { key, .. } => key,
        }
    }

    /// Whether rerunning may succeed without code changes
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Storage { source, .. } => source.is_retryable(),
            Self::StepFailed { .. } | Self::Encode { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_failed_display() {
        let err = MigrationError::StepFailed {
            key: "pbm_plugin_list".to_string(),
            step: "split-enabled-plugins".to_string(),
            threshold: SchemaVersion::new(3, 5),
            source: StepError::new("unexpected shape"),
        };
        assert_eq!(
            err.to_string(),
            "migration step 'split-enabled-plugins' (3.5) failed for 'pbm_plugin_list': unexpected shape"
        );
        assert_eq!(err.key(), "pbm_plugin_list");
        assert!(!err.is_retryable());
    }

    #[test]
    fn storage_error_is_retryable() {
        let err = MigrationError::storage("k", StoreError::unavailable("k", "down"));
        assert!(err.is_retryable());
    }
}
