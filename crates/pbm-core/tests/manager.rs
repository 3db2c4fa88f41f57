//! Manager configuration and request lifecycle

use std::sync::Arc;

use pbm_core::prelude::*;
use pbm_core::{StoreConfig, CHILD_THEME_CSS_KEY, PLUGIN_LIST_KEY};
use pbm_migrate::MigrationOutcome;
use pbm_notice::NoticeLevel;
use pbm_store::MemoryStore;
use pbm_test_utils::FlakyStore;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_notices_survive_to_next_request() {
    let manager = Manager::from_config(ManagerConfig::new()).unwrap();

    let mut ctx = manager.begin_request(7).unwrap();
    assert!(ctx.inbox().is_empty());
    ctx.notices().success("Bundle installed");
    ctx.notices().warning("Theme update available");
    assert_eq!(manager.finish_request(&mut ctx).unwrap(), 2);

    // Other users see nothing
    assert!(manager.begin_request(8).unwrap().inbox().is_empty());

    let mut next = manager.begin_request(7).unwrap();
    let inbox = next.take_inbox();
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0].level, NoticeLevel::Success);
    assert_eq!(inbox[1].message, "Theme update available");
    manager.finish_request(&mut next).unwrap();

    assert!(manager.begin_request(7).unwrap().inbox().is_empty());
}

#[test]
fn test_options_round_trip_through_manager() {
    let manager = Manager::from_config(ManagerConfig::new()).unwrap();
    let css = manager.options(CHILD_THEME_CSS_KEY).unwrap();

    css.update(&json!({"enabled": true, "enqueue": "enqueue", "variables": {"@brand": "#333"}}))
        .unwrap();

    let doc = css.get().unwrap();
    assert_eq!(doc.get("enabled"), Some(&json!(true)));
    assert_eq!(doc.pointer("/variables/@brand"), Some(&json!("#333")));
    assert!(matches!(
        manager.options("pbm_missing"),
        Err(ManagerError::UnknownDomain(_))
    ));
}

#[test]
fn test_file_store_persists_across_managers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("options.json");
    let config = ManagerConfig::new().with_file_store(&path);

    {
        let manager = Manager::from_config(config.clone()).unwrap();
        manager
            .options(PLUGIN_LIST_KEY)
            .unwrap()
            .update(&json!({"enabled_plugins": ["akismet"]}))
            .unwrap();
    }

    let manager = Manager::from_config(config).unwrap();
    let reports = manager.upgrade().unwrap();
    assert!(reports.iter().all(|r| r.outcome == MigrationOutcome::UpToDate));
    assert_eq!(
        manager.options(PLUGIN_LIST_KEY).unwrap().get().unwrap().get("enabled_plugins"),
        Some(&json!(["akismet"]))
    );
}

#[test]
fn test_managers_sharing_a_file_see_each_others_writes() {
    let dir = tempfile::tempdir().unwrap();
    let config = ManagerConfig::new().with_file_store(dir.path().join("options.json"));
    let first = Manager::from_config(config.clone()).unwrap();
    let second = Manager::from_config(config.clone()).unwrap();

    let plugins = first.options(PLUGIN_LIST_KEY).unwrap();
    assert_eq!(plugins.get().unwrap().get("enabled_plugins"), Some(&json!([])));

    second
        .options(PLUGIN_LIST_KEY)
        .unwrap()
        .update(&json!({"enabled_plugins": ["akismet"]}))
        .unwrap();
    assert_eq!(
        plugins.get().unwrap().get("enabled_plugins"),
        Some(&json!(["akismet"]))
    );

    // Read-merge-write from the first manager keeps the second's change
    plugins.update(&json!({"auto_activate": true})).unwrap();

    let doc = Manager::from_config(config)
        .unwrap()
        .options(PLUGIN_LIST_KEY)
        .unwrap()
        .get()
        .unwrap();
    assert_eq!(doc.get("enabled_plugins"), Some(&json!(["akismet"])));
    assert_eq!(doc.get("auto_activate"), Some(&json!(true)));
}

#[test]
fn test_config_loaded_from_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data").join("options.json");
    let config_path = dir.path().join("pbm.toml");
    std::fs::write(
        &config_path,
        format!(
            "cache_capacity = 0\nnotice_ttl_secs = 300\n\n[store]\nkind = \"file\"\npath = {:?}\n",
            data.display().to_string()
        ),
    )
    .unwrap();

    let config = ManagerConfig::load(&config_path).unwrap();
    assert_eq!(config.store, StoreConfig::File { path: data.clone() });
    assert_eq!(config.notice_ttl_secs, 300);

    let manager = Manager::from_config(config).unwrap();
    assert_eq!(manager.store().backend_name(), "file");
    assert!(data.exists());
}

#[test]
fn test_invalid_config_rejected_before_store_is_opened() {
    let config = ManagerConfig::new().with_notice_ttl_secs(0);
    let err = Manager::from_config(config).unwrap_err();
    assert!(matches!(err, ManagerError::Config(_)));
}

#[test]
fn test_legacy_data_upgraded_at_startup() {
    let store = Arc::new(MemoryStore::with_entries([
        (CHILD_THEME_CSS_KEY, r#"{"enqueue_method": "1", "enabled": true}"#),
        ("pbm_child_theme_css_version", r#""3.9""#),
    ]));
    let registry = OptionsRegistry::with_builtin_domains(store.clone());
    let manager = Manager::with_registry(ManagerConfig::new(), registry).unwrap();

    let doc = manager.options(CHILD_THEME_CSS_KEY).unwrap().get().unwrap();
    assert_eq!(doc.get("enqueue"), Some(&json!("import")));
    assert_eq!(doc.get("enabled"), Some(&json!(true)));
    assert_eq!(
        store.get("pbm_child_theme_css_version").unwrap().as_deref(),
        Some(r#""4.2""#)
    );
}

#[test]
fn test_storage_outage_fails_request_start() {
    let store = Arc::new(FlakyStore::new());
    let registry = OptionsRegistry::with_builtin_domains(store.clone());
    let manager = Manager::with_registry(ManagerConfig::new(), registry).unwrap();

    store.fail_reads(true);
    let err = manager.begin_request(1).unwrap_err();
    assert!(err.is_retryable());

    store.fail_reads(false);
    assert!(manager.begin_request(1).is_ok());
}

#[test]
fn test_failed_flush_is_reported() {
    let store = Arc::new(FlakyStore::new());
    let registry = OptionsRegistry::with_builtin_domains(store.clone());
    let manager = Manager::with_registry(ManagerConfig::new(), registry).unwrap();

    let mut ctx = manager.begin_request(3).unwrap();
    ctx.notices().error("Activation failed");
    store.fail_writes(true);

    assert!(matches!(
        manager.finish_request(&mut ctx),
        Err(ManagerError::Notice(_))
    ));

    store.fail_writes(false);
    assert_eq!(manager.finish_request(&mut ctx).unwrap(), 1);

    let inbox = manager.begin_request(3).unwrap().take_inbox();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].level, NoticeLevel::Error);
    assert_eq!(inbox[0].message, "Activation failed");
}
