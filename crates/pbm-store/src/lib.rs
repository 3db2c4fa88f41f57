//! PBM Options Store
//!
//! The boundary between options consumers and the host's key-value storage.
//!
//! # Core Pieces
//!
//! - [`KeyValueStore`]: raw `get`/`set`/`delete` against external storage
//! - [`MemoryStore`], [`FileStore`], [`CachedStore`]: bundled backends
//! - [`OptionsDomain`]: defaults + key for one configuration domain
//! - [`Options`] / [`DomainOptions`]: the persistence adapter, written once
//!   and parameterized by domain
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use pbm_document::Document;
//! use pbm_store::{DomainOptions, MemoryStore, Options, OptionsDomain};
//! use serde_json::json;
//!
//! struct Toggles;
//!
//! impl OptionsDomain for Toggles {
//!     fn key(&self) -> &str { "toggles" }
//!     fn defaults(&self) -> Document {
//!         Document::from_value(json!({"beta": false})).unwrap_or_default()
//!     }
//! }
//!
//! let options = DomainOptions::new(Toggles, Arc::new(MemoryStore::new()));
//! options.update(&json!({"beta": true})).unwrap();
//! assert_eq!(options.get().unwrap().get("beta"), Some(&json!(true)));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod backend;
pub mod cached;
pub mod error;
pub mod file;
pub mod memory;
pub mod options;

pub use backend::KeyValueStore;
pub use cached::{CacheStats, CachedStore};
pub use error::{OptionsError, StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use options::{DomainOptions, Options, OptionsDomain};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
