//! Schema versions with `major.minor` ordering
//!
//! Patch components are accepted on input and ignored: migrations are keyed
//! at minor granularity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::VersionError;

/// Schema revision recorded by the Version Marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SchemaVersion {
    /// Major revision
    pub major: u32,
    /// Minor revision
    pub minor: u32,
}

impl SchemaVersion {
    /// Version assigned to data that carries no marker
    pub const UNVERSIONED: Self = Self::new(0, 0);

    /// Create a version
    #[inline]
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Interpret a persisted marker value
    ///
    /// Accepts `"4.2"`, `"4.2.1"`, `"4"`, `4` and `4.2`.
    ///
    /// # Errors
    /// Returns [`VersionError`] for any other shape.
    pub fn from_marker(value: &Value) -> Result<Self, VersionError> {
        match value {
            Value::String(text) => text.parse(),
            Value::Number(number) => {
                if let Some(major) = number.as_u64() {
                    let major = u32::try_from(major)
                        .map_err(|_| VersionError::OutOfRange(number.to_string()))?;
                    Ok(Self::new(major, 0))
                } else {
                    number.to_string().parse()
                }
            }
            other => Err(VersionError::Invalid(other.to_string())),
        }
    }

    /// Encode as a persisted marker value
    #[inline]
    #[must_use]
    pub fn to_marker(self) -> Value {
        Value::String(self.to_string())
    }

    /// Check if this is the unversioned sentinel
    #[inline]
    #[must_use]
    pub fn is_unversioned(self) -> bool {
        self == Self::UNVERSIONED
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for SchemaVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches(['v', 'V']);
        if trimmed.is_empty() {
            return Err(VersionError::Invalid(s.to_string()));
        }

        let mut parts = trimmed.split('.');
        let major = parse_component(parts.next(), s)?;
        let minor = match parts.next() {
            Some(part) => parse_component(Some(part), s)?,
            None => 0,
        };
        // Patch is validated but not kept
        if let Some(patch) = parts.next() {
            parse_component(Some(patch), s)?;
        }
        if parts.next().is_some() {
            return Err(VersionError::Invalid(s.to_string()));
        }

        Ok(Self::new(major, minor))
    }
}

fn parse_component(part: Option<&str>, original: &str) -> Result<u32, VersionError> {
    let part = part.ok_or_else(|| VersionError::Invalid(original.to_string()))?;
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::Invalid(original.to_string()));
    }
    part.parse()
        .map_err(|_| VersionError::OutOfRange(original.to_string()))
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_marker(&value).map_err(serde::de::Error::custom)
    }
}
