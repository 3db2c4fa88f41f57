//! Configuration Document
//!
//! The schema-complete settings mapping handed to callers. Always
//! mapping-shaped; every instance is an independent value.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DocumentError;

/// A mapping from stable string keys to JSON values
///
/// Cloning yields an independent copy: callers can never reach the state
/// held by a store or its cache through a `Document`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    entries: Map<String, Value>,
}

impl Document {
    /// Create an empty document
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing JSON map
    #[inline]
    #[must_use]
    pub fn from_map(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    /// Build a document from a JSON value
    ///
    /// # Errors
    /// Returns [`DocumentError::NotAMapping`] if `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            other => Err(DocumentError::NotAMapping(crate::ValueKind::of(&other))),
        }
    }

    /// Parse from a JSON string
    ///
    /// # Errors
    /// Returns error if the JSON is invalid or not an object
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Serialize to a compact JSON string
    ///
    /// # Errors
    /// Returns error if serialization fails (rare for JSON)
    #[inline]
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Convert to a typed struct
    ///
    /// # Errors
    /// Returns error if the document doesn't match the type
    #[inline]
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, DocumentError> {
        Ok(serde_json::from_value(Value::Object(self.entries.clone()))?)
    }

    /// Create from a typed struct
    ///
    /// # Errors
    /// Returns error if the type does not serialize to an object
    pub fn from_typed<T: Serialize>(value: &T) -> Result<Self, DocumentError> {
        Self::from_value(serde_json::to_value(value)?)
    }

    /// Get a top-level value
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Get a value by JSON pointer
    ///
    /// # Examples
    /// ```
    /// # use pbm_document::Document;
    /// # use serde_json::json;
    /// let doc = Document::from_value(json!({"install": {"source": "repository"}})).unwrap();
    /// assert_eq!(doc.pointer("/install/source"), Some(&json!("repository")));
    /// ```
    #[must_use]
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        if pointer.is_empty() {
            return None;
        }
        let (head, rest) = split_pointer(pointer)?;
        let top = self.entries.get(&head)?;
        if rest.is_empty() {
            Some(top)
        } else {
            top.pointer(rest)
        }
    }

    /// Insert or replace a top-level value
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Remove a top-level value
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Set a value by JSON pointer
    ///
    /// Only existing paths are replaced. Returns whether a value was set.
    pub fn set(&mut self, pointer: &str, new_value: Value) -> bool {
        let Some((head, rest)) = split_pointer(pointer) else {
            return false;
        };
        let Some(top) = self.entries.get_mut(&head) else {
            return false;
        };
        let target = if rest.is_empty() {
            Some(top)
        } else {
            top.pointer_mut(rest)
        };
        match target {
            Some(slot) => {
                *slot = new_value;
                true
            }
            None => false,
        }
    }

    /// Check whether a top-level key is present
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate over top-level keys
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Iterate over top-level entries
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Number of top-level entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the document has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrow the underlying map
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Consume into a JSON value
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.entries)
    }

    /// Copy into a JSON value
    #[inline]
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.entries.clone())
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}

impl TryFrom<Value> for Document {
    type Error = DocumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Split `/head/rest...` into the unescaped head token and the remaining pointer
fn split_pointer(pointer: &str) -> Option<(String, &str)> {
    let body = pointer.strip_prefix('/')?;
    let (head, rest) = match body.find('/') {
        Some(idx) => (&body[..idx], &body[idx..]),
        None => (body, ""),
    };
    Some((head.replace("~1", "/").replace("~0", "~"), rest))
}
