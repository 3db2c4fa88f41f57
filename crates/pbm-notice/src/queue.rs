//! Request-scoped notice queue
//!
//! Handlers push notices onto a [`NoticeQueue`] owned by the request. At the
//! end of the request the queue is flushed to the store under
//! `pbm_notices_<user_id>`; the next request for that user drains it.
//!
//! ```text
//! request N:   push → push → flush(store, user)   (append to pending list)
//! request N+1: drain(store, user, now)            (read, delete, drop expired)
//! ```

use chrono::{DateTime, Duration, Utc};
use pbm_store::KeyValueStore;

use crate::error::NoticeError;
use crate::notice::{Notice, NoticeLevel};

/// Prefix of the per-user pending list key
pub const NOTICE_KEY_PREFIX: &str = "pbm_notices_";

/// Default lifetime of a pending notice
pub const DEFAULT_TTL_SECS: i64 = 60;

/// Storage key holding the pending notices of `user_id`
#[inline]
#[must_use]
pub fn notice_key(user_id: u64) -> String {
    format!("{NOTICE_KEY_PREFIX}{user_id}")
}

/// Notices collected during one request
#[derive(Debug, Clone)]
pub struct NoticeQueue {
    pending: Vec<Notice>,
    ttl: Duration,
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeQueue {
    /// Create empty queue with the default TTL
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(DEFAULT_TTL_SECS))
    }

    /// Create empty queue whose drained notices expire after `ttl`
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            pending: Vec::new(),
            ttl,
        }
    }

    /// Lifetime applied on drain
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Queue a notice
    pub fn push(&mut self, notice: Notice) {
        self.pending.push(notice);
    }

    /// Queue a success notice
    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Notice::new(NoticeLevel::Success, message));
    }

    /// Queue an info notice
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Notice::new(NoticeLevel::Info, message));
    }

    /// Queue a warning notice
    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Notice::new(NoticeLevel::Warning, message));
    }

    /// Queue an error notice
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Notice::new(NoticeLevel::Error, message));
    }

    /// Number of queued notices
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is queued
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Iterate queued notices in push order
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.pending.iter()
    }

    /// Append queued notices to the user's pending list and empty the queue
    ///
    /// An empty queue writes nothing. On error the queue is kept so the
    /// caller may retry. Returns the number of notices flushed.
    ///
    /// # Errors
    /// Returns [`NoticeError`] if the pending list cannot be read or written.
    pub fn flush(&mut self, store: &dyn KeyValueStore, user_id: u64) -> Result<usize, NoticeError> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let key = notice_key(user_id);
        let mut stored = load_pending(store, &key)?;
        stored.extend(self.pending.iter().cloned());

        let encoded = serde_json::to_string(&stored).map_err(|source| NoticeError::Encode {
            key: key.clone(),
            source,
        })?;
        store.set(&key, &encoded).map_err(|e| {
            tracing::error!(key = %key, error = %e, "notice flush failed");
            NoticeError::from(e)
        })?;

        let flushed = self.pending.len();
        self.pending.clear();
        tracing::debug!(key = %key, flushed, total = stored.len(), "notices flushed");
        Ok(flushed)
    }

    /// Take the user's pending notices, dropping expired ones
    ///
    /// The pending list is deleted whether or not anything survived.
    ///
    /// # Errors
    /// Returns [`NoticeError::Storage`] if the store fails.
    pub fn drain(
        &self,
        store: &dyn KeyValueStore,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Notice>, NoticeError> {
        let key = notice_key(user_id);
        let stored = load_pending(store, &key)?;
        store.delete(&key)?;

        let total = stored.len();
        let live: Vec<Notice> = stored
            .into_iter()
            .filter(|notice| !notice.is_expired(now, self.ttl))
            .collect();
        if live.len() < total {
            tracing::debug!(key = %key, expired = total - live.len(), "dropped expired notices");
        }
        Ok(live)
    }
}

impl Extend<Notice> for NoticeQueue {
    fn extend<T: IntoIterator<Item = Notice>>(&mut self, iter: T) {
        self.pending.extend(iter);
    }
}

fn load_pending(store: &dyn KeyValueStore, key: &str) -> Result<Vec<Notice>, NoticeError> {
    let Some(raw) = store.get(key)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str(&raw) {
        Ok(notices) => Ok(notices),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding undecodable pending notices");
            Ok(Vec::new())
        }
    }
}
