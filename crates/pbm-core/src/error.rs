//! Error types for PBM Core
//!
//! [`ManagerError`] wraps the per-crate errors so callers of the manager
//! deal with a single type.

use std::path::PathBuf;

use pbm_migrate::MigrationError;
use pbm_notice::NoticeError;
use pbm_store::{OptionsError, StoreError};

/// Main manager error type
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    /// Options read or write failed
    #[error("options error: {0}")]
    Options(#[from] OptionsError),

    /// Upgrade migration failed
    #[error("migration failed: {0}")]
    Migration(#[from] MigrationError),

    /// Notice flush or drain failed
    #[error("notice error: {0}")]
    Notice(#[from] NoticeError),

    /// Configuration invalid or unreadable
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Store could not be opened
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// No domain registered under this key
    #[error("unknown options domain '{0}'")]
    UnknownDomain(String),

    /// A domain with this key is already registered
    #[error("options domain '{0}' registered twice")]
    DuplicateDomain(String),
}

impl ManagerError {
    /// Check if the failure came from the storage layer and may clear up
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Options(OptionsError::Storage(e)) | Self::Storage(e) => e.is_retryable(),
            Self::Migration(e) => e.is_retryable(),
            Self::Notice(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Manager configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for [`crate::ManagerConfig`]
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but a value is out of range
    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    /// Create invalid-value error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Result alias for manager operations
pub type ManagerResult<T> = Result<T, ManagerError>;
