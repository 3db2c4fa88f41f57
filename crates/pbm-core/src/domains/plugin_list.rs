//! Dynamic plugin list domain
//!
//! Schema history:
//! - `3.5`: `enabled_plugins` became a list (was a comma-separated string)
//! - `4.0`: install settings moved under `install`

use pbm_document::{Document, SchemaVersion};
use pbm_migrate::{ops, FnStep, MigrationStep};
use pbm_store::OptionsDomain;
use serde_json::{json, Value};

use super::ManagedDomain;

/// Storage key of the plugin list document
pub const PLUGIN_LIST_KEY: &str = "pbm_plugin_list";

/// Plugin list domain
#[derive(Debug, Clone, Copy, Default)]
pub struct PluginListDomain;

impl OptionsDomain for PluginListDomain {
    fn key(&self) -> &str {
        PLUGIN_LIST_KEY
    }

    fn defaults(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("enabled_plugins", json!([]));
        // Bundle slug → plugin slugs
        doc.insert("bundles", json!({}));
        doc.insert("auto_activate", json!(false));
        doc.insert(
            "install",
            json!({
                "source": "repository",
                "overwrite_existing": false
            }),
        );
        doc.insert("delete_data_on_uninstall", json!(false));
        doc
    }
}

impl ManagedDomain for PluginListDomain {
    fn current_version(&self) -> SchemaVersion {
        SchemaVersion::new(4, 2)
    }

    fn migration_steps(&self) -> Vec<Box<dyn MigrationStep>> {
        vec![
            Box::new(FnStep::new(
                "split enabled_plugins",
                SchemaVersion::new(3, 5),
                |doc: &mut Value| {
                    ops::split_string_list(doc, "enabled_plugins", ',');
                    Ok(())
                },
            )),
            Box::new(FnStep::new(
                "nest install settings",
                SchemaVersion::new(4, 0),
                |doc: &mut Value| {
                    ops::move_into(doc, "install_source", "install", "source");
                    ops::move_into(doc, "overwrite_existing", "install", "overwrite_existing");
                    if let Some(flag) = doc.pointer_mut("/install/overwrite_existing") {
                        legacy_flag_to_bool(flag);
                    }
                    Ok(())
                },
            )),
        ]
    }
}

/// Legacy forms stored flags as `"1"`/`"0"` or `1`/`0`
fn legacy_flag_to_bool(flag: &mut Value) {
    let converted = match flag {
        Value::String(text) => match text.as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    };
    if let Some(value) = converted {
        *flag = Value::Bool(value);
    }
}
