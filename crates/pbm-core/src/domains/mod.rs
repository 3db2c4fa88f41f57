//! Built-in configuration domains
//!
//! Each domain is an [`OptionsDomain`] plus the schema version the code
//! expects and the steps that upgrade older stored documents.

use pbm_document::SchemaVersion;
use pbm_migrate::MigrationStep;
use pbm_store::OptionsDomain;

pub mod child_theme_css;
pub mod plugin_list;

pub use child_theme_css::ChildThemeCssDomain;
pub use plugin_list::PluginListDomain;

/// Options domain that can be registered with the manager
pub trait ManagedDomain: OptionsDomain {
    /// Schema version written by this code
    fn current_version(&self) -> SchemaVersion;

    /// Upgrade steps, in any order
    fn migration_steps(&self) -> Vec<Box<dyn MigrationStep>> {
        Vec::new()
    }
}
