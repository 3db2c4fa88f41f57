//! Upgrade hook driven by the persisted Version Marker
//!
//! # State machine
//!
//! ```text
//! marker >= current           → UpToDate   (no steps, no writes)
//! no document                 → Installed  (marker written)
//! document, marker < current  → Migrated   (steps in ascending order,
//!                                           document written if changed,
//!                                           marker written last)
//! ```
//!
//! A document without a marker is treated as [`SchemaVersion::UNVERSIONED`]
//! so every step up to `current` runs. A failed step or write leaves the
//! marker untouched; steps are idempotent, so the rerun is safe.

use pbm_document::SchemaVersion;
use pbm_store::KeyValueStore;
use serde_json::Value;

use crate::error::MigrationError;
use crate::step::MigrationStep;

/// What [`Migrator::run`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Stored version already at or beyond current
    UpToDate,
    /// No stored document; marker recorded for the fresh install
    Installed,
    /// Pending steps applied and marker advanced
    Migrated,
}

/// Record of one applied step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedStep {
    /// Step name
    pub name: String,
    /// Step threshold
    pub threshold: SchemaVersion,
}

/// Result of a migration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Domain storage key
    pub key: String,
    /// Marker found before the run (`None` when absent)
    pub from: Option<SchemaVersion>,
    /// Version the marker holds after the run
    pub to: SchemaVersion,
    /// Steps applied, in order
    pub applied: Vec<AppliedStep>,
    /// Whether the document itself was rewritten
    pub document_written: bool,
    /// Overall outcome
    pub outcome: MigrationOutcome,
}

impl MigrationReport {
    /// Check if the run changed persisted state
    #[inline]
    #[must_use]
    pub fn wrote_anything(&self) -> bool {
        self.outcome != MigrationOutcome::UpToDate
    }
}

/// Ordered migration steps for one domain
pub struct Migrator {
    key: String,
    marker_key: String,
    current: SchemaVersion,
    steps: Vec<Box<dyn MigrationStep>>,
}

impl Migrator {
    /// Create migrator for the document stored under `key`
    ///
    /// The marker lives under `<key>_version`.
    #[must_use]
    pub fn new(key: impl Into<String>, current: SchemaVersion) -> Self {
        let key = key.into();
        let marker_key = format!("{key}_version");
        Self {
            key,
            marker_key,
            current,
            steps: Vec::new(),
        }
    }

    /// Store the marker under a custom key
    #[inline]
    #[must_use]
    pub fn with_marker_key(mut self, marker_key: impl Into<String>) -> Self {
        self.marker_key = marker_key.into();
        self
    }

    /// Register a step
    ///
    /// Steps are kept in ascending threshold order; equal thresholds keep
    /// registration order.
    #[must_use]
    pub fn step(mut self, step: impl MigrationStep + 'static) -> Self {
        self.push_step(Box::new(step));
        self
    }

    /// Register a boxed step
    pub fn push_step(&mut self, step: Box<dyn MigrationStep>) {
        let threshold = step.threshold();
        let position = self
            .steps
            .partition_point(|existing| existing.threshold() <= threshold);
        self.steps.insert(position, step);
    }

    /// Document storage key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Marker storage key
    #[inline]
    #[must_use]
    pub fn marker_key(&self) -> &str {
        &self.marker_key
    }

    /// Version the code expects
    #[inline]
    #[must_use]
    pub fn current(&self) -> SchemaVersion {
        self.current
    }

    /// Names of registered steps in application order
    #[must_use]
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Steps that apply when upgrading from `stored`
    pub fn pending(&self, stored: SchemaVersion) -> impl Iterator<Item = &dyn MigrationStep> {
        let current = self.current;
        self.steps
            .iter()
            .map(|step| &**step)
            .filter(move |step| step.threshold() > stored && step.threshold() <= current)
    }

    /// Read the persisted marker
    ///
    /// An unreadable marker is reported as [`SchemaVersion::UNVERSIONED`].
    ///
    /// # Errors
    /// Returns [`MigrationError::Storage`] if the read fails.
    pub fn stored_version(
        &self,
        store: &dyn KeyValueStore,
    ) -> Result<Option<SchemaVersion>, MigrationError> {
        let raw = store
            .get(&self.marker_key)
            .map_err(|e| MigrationError::storage(&self.marker_key, e))?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let parsed = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|value| SchemaVersion::from_marker(&value).ok())
            .or_else(|| raw.parse().ok());

        match parsed {
            Some(version) => Ok(Some(version)),
            None => {
                tracing::warn!(
                    key = %self.marker_key,
                    raw = %raw,
                    "unreadable version marker, treating as unversioned"
                );
                Ok(Some(SchemaVersion::UNVERSIONED))
            }
        }
    }

    /// Bring the stored document up to the current schema
    ///
    /// # Errors
    /// - [`MigrationError::Storage`] if reading or writing fails
    /// - [`MigrationError::StepFailed`] if a step fails; nothing is written
    pub fn run(&self, store: &dyn KeyValueStore) -> Result<MigrationReport, MigrationError> {
        let marker = self.stored_version(store)?;

        if let Some(stored) = marker.filter(|stored| *stored >= self.current) {
            tracing::debug!(key = %self.key, %stored, current = %self.current, "options schema up to date");
            return Ok(self.report(marker, stored, Vec::new(), false, MigrationOutcome::UpToDate));
        }

        let Some(original) = self.load_document(store)? else {
            self.write_marker(store)?;
            tracing::info!(key = %self.key, version = %self.current, "recorded schema version for fresh install");
            return Ok(self.report(marker, self.current, Vec::new(), false, MigrationOutcome::Installed));
        };

        let from = marker.unwrap_or(SchemaVersion::UNVERSIONED);
        let mut document = original.clone();
        let mut applied = Vec::new();

        for step in self.pending(from) {
            step.apply(&mut document).map_err(|source| {
                tracing::error!(
                    key = %self.key,
                    step = step.name(),
                    threshold = %step.threshold(),
                    error = %source,
                    "migration step failed"
                );
                MigrationError::StepFailed {
                    key: self.key.clone(),
                    step: step.name().to_string(),
                    threshold: step.threshold(),
                    source,
                }
            })?;
            tracing::info!(key = %self.key, step = step.name(), threshold = %step.threshold(), "applied migration step");
            applied.push(AppliedStep {
                name: step.name().to_string(),
                threshold: step.threshold(),
            });
        }

        let document_written = document != original;
        if document_written {
            let encoded = serde_json::to_string(&document).map_err(|source| MigrationError::Encode {
                key: self.key.clone(),
                source,
            })?;
            store
                .set(&self.key, &encoded)
                .map_err(|e| MigrationError::storage(&self.key, e))?;
        }

        self.write_marker(store)?;
        tracing::info!(
            key = %self.key,
            %from,
            to = %self.current,
            steps = applied.len(),
            "options schema migrated"
        );

        Ok(self.report(marker, self.current, applied, document_written, MigrationOutcome::Migrated))
    }

    fn load_document(&self, store: &dyn KeyValueStore) -> Result<Option<Value>, MigrationError> {
        let raw = store
            .get(&self.key)
            .map_err(|e| MigrationError::storage(&self.key, e))?;
        Ok(raw.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                // Reads heal an undecodable document to defaults; nothing to migrate
                tracing::warn!(key = %self.key, error = %e, "stored document is not valid JSON, skipping steps");
                None
            }
        }))
    }

    fn write_marker(&self, store: &dyn KeyValueStore) -> Result<(), MigrationError> {
        let encoded = self.current.to_marker().to_string();
        store
            .set(&self.marker_key, &encoded)
            .map_err(|e| MigrationError::storage(&self.marker_key, e))
    }

    fn report(
        &self,
        from: Option<SchemaVersion>,
        to: SchemaVersion,
        applied: Vec<AppliedStep>,
        document_written: bool,
        outcome: MigrationOutcome,
    ) -> MigrationReport {
        MigrationReport {
            key: self.key.clone(),
            from,
            to,
            applied,
            document_written,
            outcome,
        }
    }
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("key", &self.key)
            .field("marker_key", &self.marker_key)
            .field("current", &self.current)
            .field("steps", &self.step_names())
            .finish()
    }
}
