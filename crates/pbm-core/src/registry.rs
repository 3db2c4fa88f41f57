//! Registry of options domains over one shared store
//!
//! The registry owns the store handle, one [`Options`] adapter per domain
//! and the [`Migrator`] built from the domain's steps.

use std::collections::BTreeMap;
use std::sync::Arc;

use pbm_migrate::{MigrationReport, Migrator};
use pbm_store::{DomainOptions, KeyValueStore, Options};

use crate::domains::{ChildThemeCssDomain, ManagedDomain, PluginListDomain};
use crate::error::{ManagerError, ManagerResult};

struct RegisteredDomain {
    options: Arc<dyn Options>,
    migrator: Migrator,
}

/// Registered domains keyed by storage key
pub struct OptionsRegistry {
    store: Arc<dyn KeyValueStore>,
    domains: BTreeMap<String, RegisteredDomain>,
}

impl OptionsRegistry {
    /// Create empty registry
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            domains: BTreeMap::new(),
        }
    }

    /// Create registry with the plugin list and child-theme CSS domains
    #[must_use]
    pub fn with_builtin_domains(store: Arc<dyn KeyValueStore>) -> Self {
        let mut registry = Self::new(store);
        registry.insert(PluginListDomain);
        registry.insert(ChildThemeCssDomain);
        registry
    }

    /// Register a domain
    ///
    /// # Errors
    /// Returns [`ManagerError::DuplicateDomain`] if the key is taken.
    pub fn register<D>(&mut self, domain: D) -> ManagerResult<()>
    where
        D: ManagedDomain + 'static,
    {
        if self.domains.contains_key(domain.key()) {
            return Err(ManagerError::DuplicateDomain(domain.key().to_string()));
        }
        self.insert(domain);
        Ok(())
    }

    fn insert<D>(&mut self, domain: D)
    where
        D: ManagedDomain + 'static,
    {
        let key = domain.key().to_string();
        let mut migrator = Migrator::new(key.clone(), domain.current_version());
        for step in domain.migration_steps() {
            migrator.push_step(step);
        }
        tracing::debug!(key = %key, version = %domain.current_version(), "registered options domain");

        let options: Arc<dyn Options> = Arc::new(DomainOptions::new(domain, Arc::clone(&self.store)));
        self.domains.insert(key, RegisteredDomain { options, migrator });
    }

    /// Run every domain's upgrade hook in key order
    ///
    /// Stops at the first failure; domains already upgraded keep their new
    /// marker and the failed one is retried on the next call.
    ///
    /// # Errors
    /// Returns [`ManagerError::Migration`] for the first failing domain.
    pub fn upgrade_all(&self) -> ManagerResult<Vec<MigrationReport>> {
        self.domains
            .values()
            .map(|entry| entry.migrator.run(self.store.as_ref()).map_err(ManagerError::from))
            .collect()
    }

    /// Options capability for `key`
    ///
    /// # Errors
    /// Returns [`ManagerError::UnknownDomain`] if nothing is registered under `key`.
    pub fn options(&self, key: &str) -> ManagerResult<Arc<dyn Options>> {
        self.domains
            .get(key)
            .map(|entry| Arc::clone(&entry.options))
            .ok_or_else(|| ManagerError::UnknownDomain(key.to_string()))
    }

    /// Migrator of the domain under `key`
    #[must_use]
    pub fn migrator(&self, key: &str) -> Option<&Migrator> {
        self.domains.get(key).map(|entry| &entry.migrator)
    }

    /// Registered keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    /// Number of registered domains
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Check if no domain is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Shared store handle
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }
}

impl std::fmt::Debug for OptionsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsRegistry")
            .field("backend", &self.store.backend_name())
            .field("domains", &self.domains.keys().collect::<Vec<_>>())
            .finish()
    }
}
