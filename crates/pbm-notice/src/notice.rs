//! Admin notice values

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Action completed
    Success,
    /// Informational
    Info,
    /// Needs attention
    Warning,
    /// Action failed
    Error,
}

impl NoticeLevel {
    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message shown on the next admin page load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Message text
    pub message: String,
    /// Whether the user may dismiss it
    #[serde(default = "dismissible_default")]
    pub dismissible: bool,
    /// When the notice was queued
    pub queued_at: DateTime<Utc>,
}

fn dismissible_default() -> bool {
    true
}

impl Notice {
    /// Create dismissible notice queued now
    #[must_use]
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self::at(level, message, Utc::now())
    }

    /// Create dismissible notice with an explicit timestamp
    #[must_use]
    pub fn at(level: NoticeLevel, message: impl Into<String>, queued_at: DateTime<Utc>) -> Self {
        Self {
            level,
            message: message.into(),
            dismissible: true,
            queued_at,
        }
    }

    /// Make the notice stay until the condition is resolved
    #[inline]
    #[must_use]
    pub fn sticky(mut self) -> Self {
        self.dismissible = false;
        self
    }

    /// Check if the notice is older than `ttl` at `now`
    #[inline]
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now.signed_duration_since(self.queued_at) > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn level_serializes_lowercase() {
        let json = serde_json::to_string(&NoticeLevel::Warning).unwrap();
        assert_eq!(json, r#""warning""#);
        assert_eq!(NoticeLevel::Success.to_string(), "success");
    }

    #[test]
    fn missing_dismissible_defaults_to_true() {
        let notice: Notice = serde_json::from_str(
            r#"{"level":"info","message":"saved","queued_at":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(notice.dismissible);
    }

    #[test]
    fn expiry_uses_ttl() {
        let queued = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let notice = Notice::at(NoticeLevel::Info, "hello", queued);
        let ttl = Duration::seconds(60);

        assert!(!notice.is_expired(queued + Duration::seconds(60), ttl));
        assert!(notice.is_expired(queued + Duration::seconds(61), ttl));
    }

    #[test]
    fn sticky_is_not_dismissible() {
        assert!(!Notice::new(NoticeLevel::Error, "broken").sticky().dismissible);
    }
}
