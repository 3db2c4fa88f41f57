//! Request lifecycle
//!
//! ```text
//! begin_request(user) → upgrade check → drain user's pending notices
//!     handler: ctx.notices().success(..), manager.options(key)?.update(..)
//! finish_request(&mut ctx) → flush queued notices under the user's key
//! ```

use std::sync::Arc;

use chrono::Utc;
use pbm_migrate::MigrationReport;
use pbm_notice::{Notice, NoticeQueue};
use pbm_store::{KeyValueStore, Options};

use crate::config::ManagerConfig;
use crate::error::ManagerResult;
use crate::registry::OptionsRegistry;

/// State carried through one admin request
#[derive(Debug)]
pub struct RequestContext {
    user_id: u64,
    inbox: Vec<Notice>,
    notices: NoticeQueue,
}

impl RequestContext {
    /// Acting user
    #[inline]
    #[must_use]
    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    /// Notices queued by earlier requests, to show on this page
    #[inline]
    #[must_use]
    pub fn inbox(&self) -> &[Notice] {
        &self.inbox
    }

    /// Take the inbox, leaving it empty
    pub fn take_inbox(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.inbox)
    }

    /// Queue for notices raised during this request
    #[inline]
    pub fn notices(&mut self) -> &mut NoticeQueue {
        &mut self.notices
    }
}

/// Options manager: registry plus request lifecycle
#[derive(Debug)]
pub struct Manager {
    config: ManagerConfig,
    registry: OptionsRegistry,
}

impl Manager {
    /// Build manager from configuration with the built-in domains
    ///
    /// Runs the upgrade hooks once before returning.
    ///
    /// # Errors
    /// Returns an error if the config is invalid or a migration fails.
    pub fn from_config(config: ManagerConfig) -> ManagerResult<Self> {
        config.validate()?;
        let store = config.build_store();
        tracing::info!(backend = store.backend_name(), cache = config.cache_capacity, "options manager starting");
        let registry = OptionsRegistry::with_builtin_domains(store);
        Self::with_registry(config, registry)
    }

    /// Build manager over an existing registry
    ///
    /// # Errors
    /// Returns an error if the config is invalid or a migration fails.
    pub fn with_registry(config: ManagerConfig, registry: OptionsRegistry) -> ManagerResult<Self> {
        config.validate()?;
        let manager = Self { config, registry };
        manager.upgrade()?;
        Ok(manager)
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Domain registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &OptionsRegistry {
        &self.registry
    }

    /// Shared store handle
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        self.registry.store()
    }

    /// Options capability for `key`
    ///
    /// # Errors
    /// Returns [`crate::ManagerError::UnknownDomain`] for unregistered keys.
    #[inline]
    pub fn options(&self, key: &str) -> ManagerResult<Arc<dyn Options>> {
        self.registry.options(key)
    }

    /// Run every domain's upgrade hook
    ///
    /// # Errors
    /// Returns [`crate::ManagerError::Migration`] for the first failing domain.
    pub fn upgrade(&self) -> ManagerResult<Vec<MigrationReport>> {
        self.registry.upgrade_all()
    }

    /// Start a request for `user_id`
    ///
    /// Re-checks the version markers and drains the user's pending notices.
    ///
    /// # Errors
    /// Returns an error if a migration fails or the notice store is down.
    pub fn begin_request(&self, user_id: u64) -> ManagerResult<RequestContext> {
        self.upgrade()?;
        let notices = NoticeQueue::with_ttl(self.config.notice_ttl());
        let inbox = notices.drain(self.store().as_ref(), user_id, Utc::now())?;
        tracing::debug!(user_id, pending = inbox.len(), "request started");
        Ok(RequestContext {
            user_id,
            inbox,
            notices,
        })
    }

    /// Finish a request, persisting notices for the user's next page
    ///
    /// Returns the number of notices flushed. On error the context keeps its
    /// queued notices, so the call can be repeated once the store recovers.
    ///
    /// # Errors
    /// Returns [`crate::ManagerError::Notice`] if the flush fails.
    pub fn finish_request(&self, ctx: &mut RequestContext) -> ManagerResult<usize> {
        let flushed = ctx.notices.flush(self.store().as_ref(), ctx.user_id)?;
        Ok(flushed)
    }
}
