//! Notice queue errors

use pbm_store::StoreError;

/// Errors from flushing or draining notices
#[derive(Debug, thiserror::Error)]
pub enum NoticeError {
    /// Pending notices could not be read or written
    #[error("notice storage error: {0}")]
    Storage(#[from] StoreError),

    /// Queued notices could not be encoded
    #[error("failed to encode notices for '{key}': {source}")]
    Encode {
        /// Storage key of the pending list
        key: String,
        /// Underlying serializer error
        #[source]
        source: serde_json::Error,
    },
}

impl NoticeError {
    /// Whether the operation may succeed when retried
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_retryable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_outage_is_retryable() {
        let err = NoticeError::from(StoreError::unavailable("pbm_notices_1", "down"));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("pbm_notices_1"));
    }
}
