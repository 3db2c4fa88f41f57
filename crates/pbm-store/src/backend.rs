//! Key-value store boundary
//!
//! Stands in for the host platform's options table. Values are raw strings
//! holding serialized JSON; decoding is the adapter's job.

use std::sync::Arc;

use crate::error::StoreResult;

/// External key-value storage
///
/// Implementations are shared between concurrent requests, hence `&self`
/// everywhere. No transactional guarantees: concurrent read-merge-write
/// cycles resolve last-write-wins.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the raw value stored under `key`
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if the backing store cannot be read.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if the write did not succeed.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`, returning whether it existed
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if the backing store cannot be modified.
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str {
        "custom"
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    #[inline]
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    #[inline]
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    #[inline]
    fn delete(&self, key: &str) -> StoreResult<bool> {
        (**self).delete(key)
    }

    #[inline]
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    #[inline]
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    #[inline]
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    #[inline]
    fn delete(&self, key: &str) -> StoreResult<bool> {
        (**self).delete(key)
    }

    #[inline]
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
