//! PBM Admin Notices
//!
//! A [`NoticeQueue`] is created per request, filled by handlers, flushed to
//! the store under the acting user's key and drained on that user's next
//! request. There is no process-wide queue.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod notice;
pub mod queue;

pub use error::NoticeError;
pub use notice::{Notice, NoticeLevel};
pub use queue::{notice_key, NoticeQueue, DEFAULT_TTL_SECS, NOTICE_KEY_PREFIX};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
