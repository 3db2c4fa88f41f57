//! PBM Core - options manager for the Enhanced Plugin Bundle Manager
//!
//! Wires the layered options store together:
//! - Built-in configuration domains (plugin list, child-theme CSS)
//! - A registry owning one options adapter and one migrator per domain
//! - TOML configuration for the store, cache and notice lifetime
//! - A request lifecycle that drains and flushes per-user admin notices
//!
//! # Example
//!
//! ```rust
//! use pbm_core::{Manager, ManagerConfig, PLUGIN_LIST_KEY};
//! use serde_json::json;
//!
//! let manager = Manager::from_config(ManagerConfig::new()).unwrap();
//! let mut ctx = manager.begin_request(1).unwrap();
//!
//! let plugins = manager.options(PLUGIN_LIST_KEY).unwrap();
//! plugins.update(&json!({"enabled_plugins": ["akismet"]})).unwrap();
//! ctx.notices().success("Plugin list saved");
//!
//! assert_eq!(manager.finish_request(&mut ctx).unwrap(), 1);
//! assert_eq!(manager.begin_request(1).unwrap().inbox().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod domains;
pub mod error;
pub mod manager;
pub mod registry;
pub mod telemetry;

pub use config::{LogFormat, ManagerConfig, StoreConfig};
pub use domains::child_theme_css::CHILD_THEME_CSS_KEY;
pub use domains::plugin_list::PLUGIN_LIST_KEY;
pub use domains::{ChildThemeCssDomain, ManagedDomain, PluginListDomain};
pub use error::{ConfigError, ManagerError, ManagerResult};
pub use manager::{Manager, RequestContext};
pub use registry::OptionsRegistry;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with PBM Core
    pub use crate::{Manager, ManagerConfig, ManagerError, OptionsRegistry, RequestContext};
    pub use pbm_document::{Document, SchemaVersion};
    pub use pbm_store::{KeyValueStore, Options, OptionsDomain};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
