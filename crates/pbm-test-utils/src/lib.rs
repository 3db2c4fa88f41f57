//! Testing utilities for PBM workspace
//!
//! Shared store doubles, fixtures, and proptest strategies.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use pbm_document::Document;
use pbm_store::{KeyValueStore, MemoryStore, OptionsDomain, StoreError, StoreResult};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

/// In-memory store whose reads and writes can be switched off
///
/// Every attempted `set` is recorded, failed or not.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
    write_log: Mutex<Vec<String>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            inner: MemoryStore::with_entries(entries),
            ..Self::default()
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `set` and `delete` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Keys passed to `set`/`delete`, in call order
    pub fn written_keys(&self) -> Vec<String> {
        self.write_log.lock().clone()
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner.snapshot()
    }

    fn record_write(&self, key: &str) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.write_log.lock().push(key.to_string());
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable(key, "injected write failure"));
        }
        Ok(())
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable(key, "injected read failure"));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.record_write(key)?;
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        self.record_write(key)?;
        self.inner.delete(key)
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

/// Defaults exercising every value kind, including an open map
pub fn sample_defaults() -> Document {
    Document::from_value(json!({
        "enabled_plugins": [],
        "auto_activate": false,
        "retries": 3,
        "label": "bundle",
        "install": {
            "source": "repository",
            "overwrite": false
        },
        "bundles": {}
    }))
    .unwrap()
}

/// Options domain over [`sample_defaults`]
#[derive(Debug, Clone)]
pub struct SampleDomain {
    pub key: String,
}

impl SampleDomain {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Default for SampleDomain {
    fn default() -> Self {
        Self::new("pbm_sample")
    }
}

impl OptionsDomain for SampleDomain {
    fn key(&self) -> &str {
        &self.key
    }

    fn defaults(&self) -> Document {
        sample_defaults()
    }
}

/// Encode a JSON value the way the persistence adapter stores it
pub fn stored(value: &Value) -> String {
    serde_json::to_string(value).unwrap()
}

/// Decode a stored payload
pub fn decoded(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap()
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
        "[a-z0-9 ,]{0,12}".prop_map(Value::String),
    ]
}

/// Arbitrary JSON value up to a few levels deep
pub fn arb_json_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,10}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

/// Arbitrary stored payload: mostly mappings reusing default key names,
/// sometimes not a mapping at all
pub fn arb_stored(defaults: &Document) -> impl Strategy<Value = Value> {
    let known: Vec<String> = defaults.keys().cloned().collect();
    let key = prop_oneof![
        3 => proptest::sample::select(known),
        1 => "[a-z_]{1,10}".prop_map(|s| s),
    ];
    prop_oneof![
        1 => arb_json_value(),
        4 => prop::collection::btree_map(key, arb_json_value(), 0..8)
            .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
    ]
}

/// Arbitrary mapping-shaped document
pub fn arb_document() -> impl Strategy<Value = Document> {
    prop::collection::btree_map("[a-z_]{1,10}", arb_json_value(), 0..6)
        .prop_map(|m| m.into_iter().collect::<Document>())
}
