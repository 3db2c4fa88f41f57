//! Value kinds and the compatibility rule used by the merge engine

use serde_json::Value;
use std::fmt;

/// Shape of a JSON value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool,
    /// Integer or float
    Number,
    /// UTF-8 string
    String,
    /// Ordered sequence
    Sequence,
    /// Key/value mapping
    Mapping,
}

impl ValueKind {
    /// Classify a value
    #[inline]
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Sequence,
            Value::Object(_) => Self::Mapping,
        }
    }

    /// Scalars are everything except sequences and mappings
    #[inline]
    #[must_use]
    pub fn is_scalar(self) -> bool {
        !matches!(self, Self::Sequence | Self::Mapping)
    }

    /// Whether a stored value of kind `stored` may replace a default of this kind
    ///
    /// Kinds must match exactly. Integers and floats are both `Number`.
    #[inline]
    #[must_use]
    pub fn accepts(self, stored: Self) -> bool {
        self == stored
    }

    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
