//! Manager configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! cache_capacity = 0
//! notice_ttl_secs = 60
//! log_filter = "info,pbm_store=debug"
//! log_format = "json"
//!
//! [store]
//! kind = "file"
//! path = "/var/lib/pbm/options.json"
//! ```
//!
//! Every field is optional.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pbm_store::{CachedStore, FileStore, KeyValueStore, MemoryStore};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

/// Longest accepted notice lifetime (one week)
pub const MAX_NOTICE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Backing store selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process-local map, lost on exit
    #[default]
    Memory,
    /// Single JSON file
    File {
        /// Path of the options file
        path: PathBuf,
    },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    /// Backing store
    pub store: StoreConfig,
    /// Read-through cache size in keys; 0 (the default) disables the cache
    ///
    /// The cache only sees writes made through this manager. Enable it only
    /// when no other manager or process shares the store.
    pub cache_capacity: u64,
    /// Lifetime of pending notices in seconds
    pub notice_ttl_secs: u64,
    /// `tracing` filter directive; `RUST_LOG` takes precedence
    pub log_filter: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::Memory,
            cache_capacity: 0,
            notice_ttl_secs: 60,
            log_filter: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl ManagerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With file-backed store at `path`
    #[inline]
    #[must_use]
    pub fn with_file_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.store = StoreConfig::File { path: path.into() };
        self
    }

    /// With cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// With notice lifetime
    #[inline]
    #[must_use]
    pub fn with_notice_ttl_secs(mut self, secs: u64) -> Self {
        self.notice_ttl_secs = secs;
        self
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for bad syntax or unknown fields and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`ManagerConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded manager config");
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notice_ttl_secs == 0 {
            return Err(ConfigError::invalid("notice_ttl_secs", "must be positive"));
        }
        if self.notice_ttl_secs > MAX_NOTICE_TTL_SECS {
            return Err(ConfigError::invalid(
                "notice_ttl_secs",
                format!("must not exceed {MAX_NOTICE_TTL_SECS}"),
            ));
        }
        if let StoreConfig::File { path } = &self.store {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::invalid("store.path", "must not be empty"));
            }
        }
        EnvFilter::try_new(&self.log_filter)
            .map_err(|e| ConfigError::invalid("log_filter", e.to_string()))?;
        Ok(())
    }

    /// Notice lifetime as a duration
    #[must_use]
    pub fn notice_ttl(&self) -> chrono::Duration {
        let secs = i64::try_from(self.notice_ttl_secs.min(MAX_NOTICE_TTL_SECS)).unwrap_or(i64::MAX);
        chrono::Duration::seconds(secs)
    }

    /// Open the configured store, cached if `cache_capacity > 0`
    #[must_use]
    pub fn build_store(&self) -> Arc<dyn KeyValueStore> {
        let capacity = self.cache_capacity;
        match &self.store {
            StoreConfig::Memory => wrap(MemoryStore::new(), capacity),
            StoreConfig::File { path } => wrap(FileStore::new(path), capacity),
        }
    }
}

fn wrap<S: KeyValueStore + 'static>(store: S, capacity: u64) -> Arc<dyn KeyValueStore> {
    if capacity == 0 {
        Arc::new(store)
    } else {
        Arc::new(CachedStore::new(store, capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_text_gives_defaults() {
        assert_eq!(ManagerConfig::from_toml_str("").unwrap(), ManagerConfig::default());
    }

    #[test]
    fn parses_file_store() {
        let config = ManagerConfig::from_toml_str(
            r#"
            cache_capacity = 64
            notice_ttl_secs = 120
            log_format = "json"

            [store]
            kind = "file"
            path = "/tmp/pbm/options.json"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.store,
            StoreConfig::File {
                path: PathBuf::from("/tmp/pbm/options.json")
            }
        );
        assert_eq!(config.cache_capacity, 64);
        assert_eq!(config.notice_ttl(), chrono::Duration::seconds(120));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn unknown_field_rejected() {
        assert!(matches!(
            ManagerConfig::from_toml_str("cache_size = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_ttl_rejected() {
        let err = ManagerConfig::from_toml_str("notice_ttl_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "notice_ttl_secs", .. }));
    }

    #[test]
    fn bad_filter_rejected() {
        let config = ManagerConfig {
            log_filter: "pbm=notalevel".to_string(),
            ..ManagerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "log_filter", .. })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ManagerConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn cache_is_off_by_default() {
        assert_eq!(ManagerConfig::default().cache_capacity, 0);
        assert_eq!(ManagerConfig::from_toml_str("").unwrap().cache_capacity, 0);
    }

    #[test]
    fn build_store_honours_cache_setting() {
        assert_eq!(ManagerConfig::new().build_store().backend_name(), "memory");

        let dir = tempfile::tempdir().unwrap();
        let store = ManagerConfig::new()
            .with_cache_capacity(0)
            .with_file_store(dir.path().join("options.json"))
            .build_store();
        assert_eq!(store.backend_name(), "file");
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
