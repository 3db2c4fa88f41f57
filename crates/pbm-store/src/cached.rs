//! Read-through cache in front of any store using moka
//!
//! Absence is cached too, so repeated reads of an unset option don't hit
//! the backend. Every write or delete updates or invalidates the cached
//! entry before returning.
//!
//! The cache only sees writes made through this handle. Put it in front of
//! a store that nothing else writes to, or stale values will be served.
//!
//! Writes through this handle are serialized. A read-through fill that raced
//! a write is discarded: fills are tagged with the write generation seen
//! before the backend read, and only land if no write completed in between.

use moka::sync::Cache;
use parking_lot::Mutex;

use crate::backend::KeyValueStore;
use crate::error::StoreResult;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Caching decorator over a [`KeyValueStore`]
pub struct CachedStore<S> {
    inner: S,
    cache: Cache<String, Option<String>>,
    // Bumped by every write, held across fill checks and write updates
    generation: Mutex<u64>,
}

impl<S: KeyValueStore> CachedStore<S> {
    /// Wrap `inner` with a cache holding at most `max_capacity` keys
    #[must_use]
    pub fn new(inner: S, max_capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::new(max_capacity),
            generation: Mutex::new(0),
        }
    }

    /// Borrow the wrapped store
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop every cached entry
    #[inline]
    pub fn invalidate_all(&self) {
        let mut generation = self.generation.lock();
        *generation += 1;
        self.cache.invalidate_all();
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks();
        CacheStats {
            entry_count: self.cache.entry_count(),
        }
    }
}

impl<S> std::fmt::Debug for CachedStore<S>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedStore")
            .field("inner", &self.inner)
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl<S: KeyValueStore> KeyValueStore for CachedStore<S> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if let Some(hit) = self.cache.get(key) {
            tracing::trace!(key, "options cache hit");
            return Ok(hit);
        }
        let seen = *self.generation.lock();
        let value = self.inner.get(key)?;

        let generation = self.generation.lock();
        if *generation == seen {
            self.cache.insert(key.to_string(), value.clone());
        } else {
            tracing::trace!(key, "options cache fill skipped after concurrent write");
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        // Held across the backend write so concurrent writes land in order
        let mut generation = self.generation.lock();
        let result = self.inner.set(key, value);
        *generation += 1;
        match result {
            Ok(()) => {
                self.cache.insert(key.to_string(), Some(value.to_string()));
                Ok(())
            }
            Err(e) => {
                // Backend state is unknown after a failed write
                self.cache.invalidate(key);
                Err(e)
            }
        }
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut generation = self.generation.lock();
        let result = self.inner.delete(key);
        *generation += 1;
        self.cache.invalidate(key);
        result
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}
