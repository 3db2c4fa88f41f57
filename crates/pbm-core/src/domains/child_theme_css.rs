//! Child-theme CSS domain

use pbm_document::{Document, SchemaVersion};
use pbm_migrate::{ops, FnStep, MigrationStep};
use pbm_store::OptionsDomain;
use serde_json::{json, Value};

use super::ManagedDomain;

/// Storage key of the child-theme CSS document
pub const CHILD_THEME_CSS_KEY: &str = "pbm_child_theme_css";

/// How the child stylesheet is loaded
pub const ENQUEUE_MODES: [&str; 3] = ["import", "enqueue", "none"];

/// Child-theme CSS domain
#[derive(Debug, Clone, Copy, Default)]
pub struct ChildThemeCssDomain;

impl OptionsDomain for ChildThemeCssDomain {
    fn key(&self) -> &str {
        CHILD_THEME_CSS_KEY
    }

    fn defaults(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("enabled", json!(false));
        doc.insert("enqueue", json!("import"));
        doc.insert("stylesheet_handle", json!("child-style"));
        doc.insert("custom_css", json!(""));
        // Preprocessor variable name → expression
        doc.insert("variables", json!({}));
        doc
    }
}

impl ManagedDomain for ChildThemeCssDomain {
    fn current_version(&self) -> SchemaVersion {
        SchemaVersion::new(4, 2)
    }

    fn migration_steps(&self) -> Vec<Box<dyn MigrationStep>> {
        vec![Box::new(FnStep::new(
            "rename enqueue_method",
            SchemaVersion::new(4, 0),
            |doc: &mut Value| {
                ops::rename_key(doc, "enqueue_method", "enqueue");
                ops::remap_value(
                    doc,
                    "enqueue",
                    &[
                        (json!("1"), json!("import")),
                        (json!(1), json!("import")),
                        (json!("0"), json!("none")),
                        (json!(0), json!("none")),
                    ],
                );
                Ok(())
            },
        ))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrate(mut doc: Value) -> Value {
        for step in ChildThemeCssDomain.migration_steps() {
            step.apply(&mut doc).unwrap();
        }
        doc
    }

    #[test]
    fn legacy_enqueue_method_is_renamed() {
        assert_eq!(
            migrate(json!({"enqueue_method": "1", "enabled": true})),
            json!({"enqueue": "import", "enabled": true})
        );
        assert_eq!(migrate(json!({"enqueue_method": 0})), json!({"enqueue": "none"}));
    }

    #[test]
    fn modern_value_kept() {
        assert_eq!(migrate(json!({"enqueue": "enqueue"})), json!({"enqueue": "enqueue"}));
    }

    #[test]
    fn default_mode_is_known() {
        let defaults = ChildThemeCssDomain.defaults();
        let mode = defaults.get("enqueue").and_then(Value::as_str).unwrap();
        assert!(ENQUEUE_MODES.contains(&mode));
    }
}
