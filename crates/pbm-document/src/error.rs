//! Error types for configuration documents

use crate::kind::ValueKind;

/// Errors building or converting a [`crate::Document`]
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Value is valid JSON but not an object
    #[error("expected a mapping, got {0}")]
    NotAMapping(ValueKind),

    /// JSON encode/decode failure
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Errors parsing a [`crate::SchemaVersion`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// Not a `major[.minor[.patch]]` string or number
    #[error("invalid schema version: '{0}'")]
    Invalid(String),

    /// Component does not fit in `u32`
    #[error("schema version component out of range: '{0}'")]
    OutOfRange(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_mapping_display() {
        let err = DocumentError::NotAMapping(ValueKind::Sequence);
        assert_eq!(err.to_string(), "expected a mapping, got sequence");
    }

    #[test]
    fn version_error_display() {
        let err = VersionError::Invalid("four".to_string());
        assert_eq!(err.to_string(), "invalid schema version: 'four'");
    }
}
