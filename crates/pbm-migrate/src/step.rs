//! Migration steps
//!
//! A step owns no state and must be idempotent: it inspects the document
//! and normalizes it, never assuming an earlier step ran or that it has not
//! run before. The [`ops`] helpers are written that way.

use std::fmt;

use pbm_document::SchemaVersion;
use serde_json::Value;

use crate::error::StepError;

/// One ordered transformation of a stored document
pub trait MigrationStep: Send + Sync {
    /// Steps apply when `stored < threshold <= current`
    fn threshold(&self) -> SchemaVersion;

    /// Stable name for logs and reports
    fn name(&self) -> &str;

    /// Normalize the raw stored document in place
    ///
    /// # Errors
    /// Returns [`StepError`] if the document cannot be migrated.
    fn apply(&self, document: &mut Value) -> Result<(), StepError>;
}

/// Closure-backed step
pub struct FnStep<F> {
    name: String,
    threshold: SchemaVersion,
    apply: F,
}

impl<F> FnStep<F>
where
    F: Fn(&mut Value) -> Result<(), StepError> + Send + Sync,
{
    /// Create step from closure
    #[inline]
    pub fn new(name: impl Into<String>, threshold: SchemaVersion, apply: F) -> Self {
        Self {
            name: name.into(),
            threshold,
            apply,
        }
    }
}

impl<F> MigrationStep for FnStep<F>
where
    F: Fn(&mut Value) -> Result<(), StepError> + Send + Sync,
{
    fn threshold(&self) -> SchemaVersion {
        self.threshold
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, document: &mut Value) -> Result<(), StepError> {
        (self.apply)(document)
    }
}

impl<F> fmt::Debug for FnStep<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep")
            .field("name", &self.name)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

/// Idempotent building blocks for steps
///
/// Every helper is a no-op on non-object documents and on documents that
/// are already in the target shape.
pub mod ops {
    use serde_json::{Map, Value};

    /// Rename `from` to `to` unless `to` is already present
    ///
    /// A leftover `from` next to an existing `to` is removed. Returns
    /// whether the document changed.
    pub fn rename_key(document: &mut Value, from: &str, to: &str) -> bool {
        let Some(map) = document.as_object_mut() else {
            return false;
        };
        let Some(value) = map.remove(from) else {
            return false;
        };
        if !map.contains_key(to) {
            map.insert(to.to_string(), value);
        }
        true
    }

    /// Move top-level `key` into the `parent` mapping as `child`
    ///
    /// Creates `parent` if missing. An existing `parent.child` wins over the
    /// legacy value. A `parent` that is not a mapping is left alone.
    pub fn move_into(document: &mut Value, key: &str, parent: &str, child: &str) -> bool {
        let Some(map) = document.as_object_mut() else {
            return false;
        };
        if !map.contains_key(key) {
            return false;
        }
        if map.get(parent).is_some_and(|p| !p.is_object()) {
            return false;
        }
        let Some(value) = map.remove(key) else {
            return false;
        };
        let target = map
            .entry(parent.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(target) = target.as_object_mut() {
            target.entry(child.to_string()).or_insert(value);
        }
        true
    }

    /// Turn a delimited string under `key` into a sequence of trimmed,
    /// non-empty items
    ///
    /// Sequences are left as they are.
    pub fn split_string_list(document: &mut Value, key: &str, separator: char) -> bool {
        let Some(slot) = document.as_object_mut().and_then(|map| map.get_mut(key)) else {
            return false;
        };
        let Some(text) = slot.as_str() else {
            return false;
        };
        let items = text
            .split(separator)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_string()))
            .collect();
        *slot = Value::Array(items);
        true
    }

    /// Replace a scalar under `key` according to `mapping`
    ///
    /// Values not listed are kept.
    pub fn remap_value(document: &mut Value, key: &str, mapping: &[(Value, Value)]) -> bool {
        let Some(slot) = document.as_object_mut().and_then(|map| map.get_mut(key)) else {
            return false;
        };
        match mapping.iter().find(|(from, _)| *from == *slot) {
            Some((_, to)) if *to != *slot => {
                *slot = to.clone();
                true
            }
            _ => false,
        }
    }
}
