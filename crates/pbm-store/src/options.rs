//! Persistence adapter
//!
//! One generic implementation ([`DomainOptions`]) serves every options
//! domain. A domain contributes only its storage key, its defaults and its
//! merge policy.
//!
//! ```text
//! get:    store.get(key) → decode → merge(stored, defaults) → Document
//! save:   Document → encode → store.set(key)
//! update: get() → overlay(current, patch, defaults) → save()
//! ```

use std::sync::Arc;

use pbm_document::{merge_with, overlay_with, Document, MergePolicy};
use serde_json::Value;

use crate::backend::KeyValueStore;
use crate::error::OptionsError;

/// Defaults Provider plus the storage identity of one configuration domain
pub trait OptionsDomain: Send + Sync {
    /// Fixed storage key of this domain's document
    fn key(&self) -> &str;

    /// Canonical defaults
    ///
    /// Must build a fresh document on every call and have no side effects.
    fn defaults(&self) -> Document;

    /// Treatment of keys the defaults no longer name
    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::strict()
    }
}

impl<T: OptionsDomain + ?Sized> OptionsDomain for Arc<T> {
    fn key(&self) -> &str {
        (**self).key()
    }

    fn defaults(&self) -> Document {
        (**self).defaults()
    }

    fn merge_policy(&self) -> MergePolicy {
        (**self).merge_policy()
    }
}

/// The "Options" capability consumed by admin collaborators
pub trait Options: Send + Sync {
    /// Storage key served by this instance
    fn key(&self) -> &str;

    /// Complete, type-validated configuration
    ///
    /// # Errors
    /// Only storage failures; malformed stored data heals to defaults.
    fn get(&self) -> Result<Document, OptionsError>;

    /// Persist `doc` verbatim
    ///
    /// # Errors
    /// Returns [`OptionsError::Storage`] if the write fails.
    fn save(&self, doc: &Document) -> Result<(), OptionsError>;

    /// Fresh copy of the defaults
    fn get_defaults(&self) -> Document;

    /// Apply a partial update and persist the result
    ///
    /// Wrong-typed fields in `patch` are ignored. Returns the saved document.
    ///
    /// # Errors
    /// Returns [`OptionsError::NotAMapping`] if `patch` is not an object, or
    /// a storage error.
    fn update(&self, patch: &Value) -> Result<Document, OptionsError>;

    /// Remove the stored document so reads return defaults
    ///
    /// # Errors
    /// Returns [`OptionsError::Storage`] if the delete fails.
    fn reset(&self) -> Result<bool, OptionsError>;
}

/// [`Options`] for a domain over a shared store
#[derive(Clone)]
pub struct DomainOptions<D> {
    domain: D,
    store: Arc<dyn KeyValueStore>,
}

impl<D: OptionsDomain> DomainOptions<D> {
    /// Create adapter for `domain` backed by `store`
    #[inline]
    #[must_use]
    pub fn new(domain: D, store: Arc<dyn KeyValueStore>) -> Self {
        Self { domain, store }
    }

    /// Borrow the domain
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &D {
        &self.domain
    }

    /// Borrow the backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Validate a raw value is mapping-shaped, then persist it
    ///
    /// # Errors
    /// Returns [`OptionsError::NotAMapping`] for non-object values.
    pub fn save_value(&self, value: Value) -> Result<(), OptionsError> {
        let doc = Document::from_value(value).map_err(|_| OptionsError::NotAMapping {
            key: self.domain.key().to_string(),
        })?;
        self.save(&doc)
    }

    /// Fetch and decode the stored value without merging
    ///
    /// Undecodable data is reported as absent.
    ///
    /// # Errors
    /// Returns [`OptionsError::Storage`] if the read fails.
    pub fn load_raw(&self) -> Result<Option<Value>, OptionsError> {
        let key = self.domain.key();
        let raw = self.store.get(key).map_err(|e| {
            tracing::error!(key, error = %e, "options read failed");
            e
        })?;

        Ok(raw.and_then(|raw| match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "stored options are not valid JSON, using defaults");
                None
            }
        }))
    }
}

impl<D> std::fmt::Debug for DomainOptions<D>
where
    D: OptionsDomain,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainOptions")
            .field("key", &self.domain.key())
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

impl<D: OptionsDomain> Options for DomainOptions<D> {
    fn key(&self) -> &str {
        self.domain.key()
    }

    fn get(&self) -> Result<Document, OptionsError> {
        let stored = self.load_raw()?;
        let defaults = self.domain.defaults();
        Ok(merge_with(stored.as_ref(), &defaults, &self.domain.merge_policy()))
    }

    fn save(&self, doc: &Document) -> Result<(), OptionsError> {
        let key = self.domain.key();
        let encoded = doc.to_json()?;
        self.store.set(key, &encoded).map_err(|e| {
            tracing::error!(key, error = %e, "options write failed");
            OptionsError::from(e)
        })?;
        tracing::debug!(key, entries = doc.len(), "options saved");
        Ok(())
    }

    fn get_defaults(&self) -> Document {
        self.domain.defaults()
    }

    fn update(&self, patch: &Value) -> Result<Document, OptionsError> {
        if !patch.is_object() {
            return Err(OptionsError::NotAMapping {
                key: self.domain.key().to_string(),
            });
        }
        let current = self.get()?;
        let defaults = self.domain.defaults();
        let updated = overlay_with(&current, patch, &defaults, &self.domain.merge_policy());
        self.save(&updated)?;
        Ok(updated)
    }

    fn reset(&self) -> Result<bool, OptionsError> {
        let key = self.domain.key();
        let existed = self.store.delete(key)?;
        tracing::info!(key, existed, "options reset to defaults");
        Ok(existed)
    }
}
