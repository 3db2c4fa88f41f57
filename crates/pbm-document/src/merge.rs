//! Type-validating merge of persisted values over defaults
//!
//! The merge is total: malformed input never produces an error, it falls
//! back to the defaults branch by branch. The result always carries exactly
//! the key set of the defaults (plus any keys a [`MergePolicy`] preserves).
//!
//! # Rules
//!
//! - A stored value replaces a default only when both have the same
//!   [`ValueKind`].
//! - Non-empty default mappings are merged recursively and are strict:
//!   unknown nested keys are dropped.
//! - An empty default mapping is an open map; a stored mapping is kept
//!   verbatim.
//! - Sequences and scalars of the right kind are taken as-is.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::document::Document;
use crate::kind::ValueKind;

/// Policy for keys present in stored data but absent from the defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePolicy {
    preserved: BTreeSet<String>,
}

impl MergePolicy {
    /// Drop every key the defaults don't name
    #[inline]
    #[must_use]
    pub fn strict() -> Self {
        Self::default()
    }

    /// Keep the listed top-level legacy keys when stored data carries them
    #[must_use]
    pub fn preserve<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            preserved: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether a key is preserved
    #[inline]
    #[must_use]
    pub fn preserves(&self, key: &str) -> bool {
        self.preserved.contains(key)
    }

    /// Check if this policy preserves nothing
    #[inline]
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.preserved.is_empty()
    }

    /// Iterate over preserved key names
    pub fn preserved_keys(&self) -> impl Iterator<Item = &str> {
        self.preserved.iter().map(String::as_str)
    }
}

/// Merge stored data over defaults with the strict policy
///
/// # Examples
/// ```
/// # use pbm_document::{merge, Document};
/// # use serde_json::json;
/// let defaults = Document::from_value(json!({"enabled_plugins": [], "network_wide": false})).unwrap();
/// let stored = json!({"enabled_plugins": "not-a-list", "network_wide": true});
///
/// let merged = merge(Some(&stored), &defaults);
/// assert_eq!(merged.get("enabled_plugins"), Some(&json!([])));
/// assert_eq!(merged.get("network_wide"), Some(&json!(true)));
/// ```
#[must_use]
pub fn merge(stored: Option<&Value>, defaults: &Document) -> Document {
    merge_with(stored, defaults, &MergePolicy::strict())
}

/// Merge stored data over defaults, keeping keys the policy preserves
#[must_use]
pub fn merge_with(stored: Option<&Value>, defaults: &Document, policy: &MergePolicy) -> Document {
    let stored_map = as_candidate_map(stored, "");
    let mut merged = reconcile_map(defaults.as_map(), defaults.as_map(), stored_map, "");

    if let Some(stored_map) = stored_map {
        carry_preserved(&mut merged, stored_map, None, defaults, policy);
    }

    Document::from_map(merged)
}

/// Apply a partial update on top of an already-merged document
///
/// `defaults` supplies the schema and `base` the fallback for every key the
/// patch omits or carries with the wrong kind.
#[must_use]
pub fn overlay(base: &Document, patch: &Value, defaults: &Document) -> Document {
    overlay_with(base, patch, defaults, &MergePolicy::strict())
}

/// [`overlay`] honoring a [`MergePolicy`]
#[must_use]
pub fn overlay_with(
    base: &Document,
    patch: &Value,
    defaults: &Document,
    policy: &MergePolicy,
) -> Document {
    let patch_map = as_candidate_map(Some(patch), "");
    let mut merged = reconcile_map(defaults.as_map(), base.as_map(), patch_map, "");

    let empty = Map::new();
    carry_preserved(
        &mut merged,
        patch_map.unwrap_or(&empty),
        Some(base.as_map()),
        defaults,
        policy,
    );

    Document::from_map(merged)
}

fn carry_preserved(
    merged: &mut Map<String, Value>,
    primary: &Map<String, Value>,
    secondary: Option<&Map<String, Value>>,
    defaults: &Document,
    policy: &MergePolicy,
) {
    for key in policy.preserved_keys() {
        if defaults.contains_key(key) {
            continue;
        }
        let value = primary
            .get(key)
            .or_else(|| secondary.and_then(|map| map.get(key)));
        if let Some(value) = value {
            merged.insert(key.to_string(), value.clone());
        }
    }
}

fn as_candidate_map<'a>(candidate: Option<&'a Value>, path: &str) -> Option<&'a Map<String, Value>> {
    match candidate {
        Some(Value::Object(map)) => Some(map),
        Some(other) => {
            schema_mismatch(path, ValueKind::Mapping, ValueKind::of(other));
            None
        }
        None => None,
    }
}

fn reconcile_map(
    schema: &Map<String, Value>,
    fallback: &Map<String, Value>,
    candidate: Option<&Map<String, Value>>,
    path: &str,
) -> Map<String, Value> {
    let mut out = Map::with_capacity(schema.len());
    for (key, schema_value) in schema {
        let child_path = format!("{path}/{}", escape_token(key));
        let fallback_value = fallback
            .get(key)
            .filter(|value| ValueKind::of(schema_value).accepts(ValueKind::of(value)))
            .unwrap_or(schema_value);
        let candidate_value = candidate.and_then(|map| map.get(key));
        out.insert(
            key.clone(),
            reconcile(schema_value, fallback_value, candidate_value, &child_path),
        );
    }
    out
}

fn reconcile(schema: &Value, fallback: &Value, candidate: Option<&Value>, path: &str) -> Value {
    if let Value::Object(schema_map) = schema {
        if !schema_map.is_empty() {
            let fallback_map = fallback.as_object().unwrap_or(schema_map);
            let candidate_map = as_candidate_map(candidate, path);
            return Value::Object(reconcile_map(schema_map, fallback_map, candidate_map, path));
        }
    }

    let expected = ValueKind::of(schema);
    match candidate {
        Some(value) if expected.accepts(ValueKind::of(value)) => value.clone(),
        Some(value) => {
            schema_mismatch(path, expected, ValueKind::of(value));
            fallback.clone()
        }
        None => fallback.clone(),
    }
}

fn schema_mismatch(path: &str, expected: ValueKind, found: ValueKind) {
    let pointer = if path.is_empty() { "/" } else { path };
    tracing::debug!(
        pointer,
        %expected,
        %found,
        "schema mismatch, falling back to default"
    );
}

fn escape_token(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn defaults() -> Document {
        Document::from_value(json!({
            "enabled_plugins": [],
            "auto_activate": false,
            "limit": 10,
            "label": "Bundle",
            "install": {"source": "repository", "overwrite": false},
            "bundles": {}
        }))
        .unwrap()
    }

    #[test]
    fn absent_stored_yields_defaults() {
        assert_eq!(merge(None, &defaults()), defaults());
    }

    #[test]
    fn non_mapping_stored_yields_defaults() {
        assert_eq!(merge(Some(&json!("garbage")), &defaults()), defaults());
        assert_eq!(merge(Some(&json!([1, 2])), &defaults()), defaults());
        assert_eq!(merge(Some(&Value::Null), &defaults()), defaults());
    }

    #[test]
    fn wrong_typed_value_replaced_by_default() {
        let stored = json!({"enabled_plugins": "not-a-list", "limit": "ten"});
        let merged = merge(Some(&stored), &defaults());
        assert_eq!(merged.get("enabled_plugins"), Some(&json!([])));
        assert_eq!(merged.get("limit"), Some(&json!(10)));
        assert_eq!(merged.get("label"), Some(&json!("Bundle")));
    }

    #[test]
    fn matching_values_survive() {
        let stored = json!({"enabled_plugins": ["akismet", "jetpack"], "auto_activate": true});
        let merged = merge(Some(&stored), &defaults());
        assert_eq!(merged.get("enabled_plugins"), Some(&json!(["akismet", "jetpack"])));
        assert_eq!(merged.get("auto_activate"), Some(&json!(true)));
    }

    #[test]
    fn nested_mappings_merge_recursively() {
        let stored = json!({"install": {"source": "upload", "overwrite": "yes", "extra": 1}});
        let merged = merge(Some(&stored), &defaults());
        assert_eq!(
            merged.get("install"),
            Some(&json!({"source": "upload", "overwrite": false}))
        );
    }

    #[test]
    fn nested_mapping_with_wrong_kind_falls_back() {
        let stored = json!({"install": ["upload"]});
        let merged = merge(Some(&stored), &defaults());
        assert_eq!(
            merged.get("install"),
            Some(&json!({"source": "repository", "overwrite": false}))
        );
    }

    #[test]
    fn empty_default_mapping_is_open() {
        let stored = json!({"bundles": {"starter": ["akismet"], "shop": ["woocommerce"]}});
        let merged = merge(Some(&stored), &defaults());
        assert_eq!(
            merged.get("bundles"),
            Some(&json!({"starter": ["akismet"], "shop": ["woocommerce"]}))
        );
    }

    #[test]
    fn unknown_keys_dropped_by_default() {
        let stored = json!({"legacy_flag": true, "limit": 3});
        let merged = merge(Some(&stored), &defaults());
        assert!(!merged.contains_key("legacy_flag"));
        assert_eq!(merged.len(), defaults().len());
    }

    #[test]
    fn preserved_keys_are_carried() {
        let policy = MergePolicy::preserve(["legacy_flag"]);
        let stored = json!({"legacy_flag": true, "other_legacy": 1});
        let merged = merge_with(Some(&stored), &defaults(), &policy);
        assert_eq!(merged.get("legacy_flag"), Some(&json!(true)));
        assert!(!merged.contains_key("other_legacy"));
    }

    #[test]
    fn preserved_key_shadowed_by_defaults_is_validated() {
        let policy = MergePolicy::preserve(["limit"]);
        let stored = json!({"limit": "ten"});
        let merged = merge_with(Some(&stored), &defaults(), &policy);
        assert_eq!(merged.get("limit"), Some(&json!(10)));
    }

    #[test]
    fn overlay_applies_partial_patch() {
        let base = merge(Some(&json!({"limit": 3, "label": "Mine"})), &defaults());
        let patched = overlay(&base, &json!({"label": "Shop", "limit": "oops"}), &defaults());
        assert_eq!(patched.get("label"), Some(&json!("Shop")));
        assert_eq!(patched.get("limit"), Some(&json!(3)));
    }

    #[test]
    fn overlay_merges_nested_patch() {
        let base = defaults();
        let patched = overlay(&base, &json!({"install": {"overwrite": true}}), &defaults());
        assert_eq!(
            patched.get("install"),
            Some(&json!({"source": "repository", "overwrite": true}))
        );
    }

    #[test]
    fn overlay_keeps_preserved_keys_from_base() {
        let policy = MergePolicy::preserve(["legacy_flag"]);
        let base = merge_with(Some(&json!({"legacy_flag": "on"})), &defaults(), &policy);
        let patched = overlay_with(&base, &json!({"limit": 1}), &defaults(), &policy);
        assert_eq!(patched.get("legacy_flag"), Some(&json!("on")));
        assert_eq!(patched.get("limit"), Some(&json!(1)));
    }

    #[test]
    fn overlay_with_non_mapping_patch_is_identity() {
        let base = merge(Some(&json!({"limit": 4})), &defaults());
        assert_eq!(overlay(&base, &json!(42), &defaults()), base);
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z]{0,6}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map(
                    prop_oneof![
                        Just("enabled_plugins".to_string()),
                        Just("install".to_string()),
                        Just("source".to_string()),
                        Just("limit".to_string()),
                        "[a-z]{1,4}",
                    ],
                    inner,
                    0..5
                )
                .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_key_set_equals_defaults(stored in arb_value()) {
            let merged = merge(Some(&stored), &defaults());
            let merged_keys: Vec<_> = merged.keys().collect();
            let default_keys: Vec<_> = defaults().as_map().keys().cloned().collect();
            prop_assert_eq!(merged_keys, default_keys.iter().collect::<Vec<_>>());
        }

        #[test]
        fn prop_wrong_kinds_take_default(stored in arb_value()) {
            let defaults = defaults();
            let merged = merge(Some(&stored), &defaults);
            if let Value::Object(map) = &stored {
                for (key, default_value) in defaults.iter() {
                    if let Some(value) = map.get(key) {
                        if ValueKind::of(value) != ValueKind::of(default_value) {
                            prop_assert_eq!(merged.get(key), Some(default_value));
                        }
                    }
                }
            }
        }

        #[test]
        fn prop_merge_is_idempotent(stored in arb_value()) {
            let once = merge(Some(&stored), &defaults());
            let twice = merge(Some(&once.to_value()), &defaults());
            prop_assert_eq!(once, twice);
        }
    }
}
