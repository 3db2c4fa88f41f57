//! PBM Migrations
//!
//! Compares the persisted Version Marker of a domain with the version the
//! code expects and, when it is behind, applies every step whose threshold
//! lies in `(stored, current]` in ascending order. The marker is advanced
//! only after all of them succeeded.
//!
//! ```rust
//! use pbm_document::SchemaVersion;
//! use pbm_migrate::{ops, FnStep, MigrationOutcome, Migrator};
//! use pbm_store::{KeyValueStore, MemoryStore};
//! use serde_json::Value;
//!
//! let store = MemoryStore::with_entries([
//!     ("pbm_plugin_list", r#"{"enabled_plugins": "akismet,jetpack"}"#),
//!     ("pbm_plugin_list_version", r#""3.0""#),
//! ]);
//!
//! let migrator = Migrator::new("pbm_plugin_list", SchemaVersion::new(4, 2)).step(FnStep::new(
//!     "split enabled plugins",
//!     SchemaVersion::new(3, 5),
//!     |doc: &mut Value| {
//!         ops::split_string_list(doc, "enabled_plugins", ',');
//!         Ok(())
//!     },
//! ));
//!
//! let report = migrator.run(&store).unwrap();
//! assert_eq!(report.outcome, MigrationOutcome::Migrated);
//! assert_eq!(
//!     store.get("pbm_plugin_list_version").unwrap().as_deref(),
//!     Some(r#""4.2""#)
//! );
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod migrator;
pub mod step;

pub use error::{MigrationError, StepError};
pub use migrator::{AppliedStep, MigrationOutcome, MigrationReport, Migrator};
pub use step::{ops, FnStep, MigrationStep};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
