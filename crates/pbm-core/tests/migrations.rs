use std::sync::Arc;

use pbm_core::{ManagerError, OptionsRegistry, CHILD_THEME_CSS_KEY, PLUGIN_LIST_KEY};
use pbm_migrate::MigrationOutcome;
use pbm_store::KeyValueStore;
use pbm_test_utils::{decoded, FlakyStore};
use pretty_assertions::assert_eq;
use serde_json::json;

fn legacy_store() -> Arc<FlakyStore> {
    Arc::new(FlakyStore::with_entries([
        (
            PLUGIN_LIST_KEY,
            r#"{"enabled_plugins": "akismet, jetpack", "install_source": "upload"}"#,
        ),
        (CHILD_THEME_CSS_KEY, r#"{"enqueue_method": "0"}"#),
    ]))
}

#[test]
fn test_unversioned_documents_run_every_step() {
    let store = legacy_store();
    let registry = OptionsRegistry::with_builtin_domains(store.clone());

    let reports = registry.upgrade_all().unwrap();

    assert!(reports.iter().all(|r| r.outcome == MigrationOutcome::Migrated));
    assert!(reports.iter().all(|r| r.from.is_none()));
    assert_eq!(
        decoded(&store.get(CHILD_THEME_CSS_KEY).unwrap().unwrap()),
        json!({"enqueue": "none"})
    );
    assert_eq!(
        decoded(&store.get(PLUGIN_LIST_KEY).unwrap().unwrap()),
        json!({"enabled_plugins": ["akismet", "jetpack"], "install": {"source": "upload"}})
    );
}

#[test]
fn test_failed_marker_write_is_retried_safely() {
    let store = legacy_store();
    let registry = OptionsRegistry::with_builtin_domains(store.clone());

    // No document or marker write can land
    store.fail_writes(true);
    let err = registry.upgrade_all().unwrap_err();
    assert!(matches!(err, ManagerError::Migration(_)));
    assert!(err.is_retryable());
    assert!(store.get("pbm_child_theme_css_version").unwrap().is_none());

    store.fail_writes(false);
    let reports = registry.upgrade_all().unwrap();
    assert!(reports.iter().all(|r| r.outcome == MigrationOutcome::Migrated));

    let settled = store.snapshot();
    let again = registry.upgrade_all().unwrap();
    assert!(again.iter().all(|r| r.outcome == MigrationOutcome::UpToDate));
    assert_eq!(store.snapshot(), settled);
    assert_eq!(
        decoded(&settled["pbm_plugin_list_version"]),
        json!("4.2")
    );
}

#[test]
fn test_upgrade_then_read_is_complete() {
    let store = legacy_store();
    let registry = OptionsRegistry::with_builtin_domains(store.clone());
    registry.upgrade_all().unwrap();

    let doc = registry.options(PLUGIN_LIST_KEY).unwrap().get().unwrap();
    assert_eq!(doc.pointer("/install/source"), Some(&json!("upload")));
    assert_eq!(doc.pointer("/install/overwrite_existing"), Some(&json!(false)));
    assert_eq!(doc.get("bundles"), Some(&json!({})));
}

#[test]
fn test_newer_marker_is_left_alone() {
    let store = Arc::new(FlakyStore::with_entries([
        (PLUGIN_LIST_KEY, r#"{"enabled_plugins": "a,b"}"#),
        ("pbm_plugin_list_version", r#""5.0""#),
        ("pbm_child_theme_css_version", r#""4.2""#),
    ]));
    let registry = OptionsRegistry::with_builtin_domains(store.clone());

    registry.upgrade_all().unwrap();

    assert_eq!(store.write_count(), 0);
    // Not migrated, so the merge heals the string to the default list
    let doc = registry.options(PLUGIN_LIST_KEY).unwrap().get().unwrap();
    assert_eq!(doc.get("enabled_plugins"), Some(&json!([])));
}
