//! PBM Configuration Documents
//!
//! Value types shared by every options domain:
//!
//! - [`Document`]: schema-complete settings mapping handed to callers
//! - [`ValueKind`]: shape classification driving type validation
//! - [`merge`] / [`overlay`]: the type-validating merge engine
//! - [`SchemaVersion`]: `major.minor` revision used by version markers
//!
//! # Example
//!
//! ```rust
//! use pbm_document::{merge, Document};
//! use serde_json::json;
//!
//! let defaults = Document::from_value(json!({"enabled_plugins": [], "auto_activate": false})).unwrap();
//! let merged = merge(Some(&json!({"auto_activate": true, "stale": 1})), &defaults);
//!
//! assert_eq!(merged.get("auto_activate"), Some(&json!(true)));
//! assert!(!merged.contains_key("stale"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod document;
pub mod error;
pub mod kind;
pub mod merge;
pub mod version;

pub use document::Document;
pub use error::{DocumentError, VersionError};
pub use kind::ValueKind;
pub use merge::{merge, merge_with, overlay, overlay_with, MergePolicy};
pub use version::SchemaVersion;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
