//! Session context and the session cache boundary.
//!
//! Two concerns live here:
//! - [`SessionContext`], the caller-side metadata attached to each
//!   normalization call (project id, execution id, timestamp, comparison
//!   mode, triggering actor). Explicit context always wins over same-named
//!   fields embedded in a payload — the context reflects the caller's most
//!   current knowledge.
//! - [`SessionRepository`], the single designated read/write boundary around
//!   the session cache. The cache holds at most one report at a time plus a
//!   separately-keyed last-used project id that outlives individual reports.
//!   The pure normalization core never touches storage; everything goes
//!   through this repository.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::Report;
use crate::raw;

/// Cache key for the single report slot.
const REPORT_KEY: &str = "dataqa.lastReport";
/// Cache key for the last-used project id.
const PROJECT_KEY: &str = "dataqa.lastProjectId";

// ============================================================================
// Session context
// ============================================================================

/// Caller-supplied metadata for one normalization call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    #[serde(skip_serializing_if = "Option::is_none", alias = "project_id")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "execution_id")]
    pub execution_id: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        alias = "execution_timestamp"
    )]
    pub execution_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "comparison_mode")]
    pub comparison_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "executed_by")]
    pub executed_by: Option<String>,
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    #[must_use]
    pub fn with_execution_id(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = Some(execution_id.into());
        self
    }

    #[must_use]
    pub fn with_execution_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.execution_timestamp = Some(timestamp.into());
        self
    }

    #[must_use]
    pub fn with_comparison_mode(mut self, mode: impl Into<String>) -> Self {
        self.comparison_mode = Some(mode.into());
        self
    }

    #[must_use]
    pub fn with_executed_by(mut self, actor: impl Into<String>) -> Self {
        self.executed_by = Some(actor.into());
        self
    }

    /// Extract the same-named metadata fields embedded in a payload.
    ///
    /// Only object payloads carry metadata; arrays and scalars yield an
    /// empty context.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            project_id: raw::nonempty_string_field(payload, &["projectId", "project_id"]),
            execution_id: raw::nonempty_string_field(payload, &["executionId", "execution_id"]),
            execution_timestamp: raw::nonempty_string_field(
                payload,
                &["executionTimestamp", "execution_timestamp", "timestamp"],
            ),
            comparison_mode: raw::nonempty_string_field(
                payload,
                &["comparisonMode", "comparison_mode"],
            ),
            executed_by: raw::nonempty_string_field(payload, &["executedBy", "executed_by"]),
        }
    }

    /// Field-wise precedence merge: `self` wins, `fallback` fills the gaps.
    #[must_use]
    pub fn merged_over(&self, fallback: &Self) -> Self {
        Self {
            project_id: self
                .project_id
                .clone()
                .or_else(|| fallback.project_id.clone()),
            execution_id: self
                .execution_id
                .clone()
                .or_else(|| fallback.execution_id.clone()),
            execution_timestamp: self
                .execution_timestamp
                .clone()
                .or_else(|| fallback.execution_timestamp.clone()),
            comparison_mode: self
                .comparison_mode
                .clone()
                .or_else(|| fallback.comparison_mode.clone()),
            executed_by: self
                .executed_by
                .clone()
                .or_else(|| fallback.executed_by.clone()),
        }
    }

    /// Whether the comparison mode implies a multi-mapping report.
    ///
    /// Modes containing `"scd"` or `"config"` (case-insensitive) describe
    /// runs that are grouped per mapping even when the payload shape alone
    /// cannot show it.
    #[must_use]
    pub fn hints_multi_mapping(&self) -> bool {
        self.comparison_mode.as_deref().is_some_and(|mode| {
            let mode = mode.to_ascii_lowercase();
            mode.contains("scd") || mode.contains("config")
        })
    }

    /// Short execution id: the first 8 hex characters of a v4 UUID, matching
    /// the backend's id convention.
    #[must_use]
    pub fn generate_execution_id() -> String {
        let id = Uuid::new_v4().simple().to_string();
        id[..8].to_string()
    }
}

// ============================================================================
// Session cache
// ============================================================================

/// Opaque key/value store behind the session cache.
///
/// Single-writer, single-reader; the caller serializes access. The dashboard
/// shell backs this with browser-local storage; tests and tools use
/// [`MemoryStore`].
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory [`SessionStore`] for tests and tools.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// The single read/write boundary around the session cache.
///
/// Holds at most one cached report (each new run or history view overwrites
/// it) and the last-used project id under its own key.
#[derive(Debug)]
pub struct SessionRepository<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> SessionRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Consume the repository and hand the store back.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Overwrite the single report slot.
    pub fn save_report(&mut self, report: &Report) -> Result<()> {
        let encoded = serde_json::to_string(report)?;
        self.store.set(REPORT_KEY, &encoded);
        debug!(bytes = encoded.len(), "cached report");
        Ok(())
    }

    /// Load the cached report, if any.
    ///
    /// A cache entry that fails to decode is reported as
    /// [`Error::Session`]; the caller typically clears the slot and moves
    /// on rather than crashing the dashboard.
    pub fn load_report(&self) -> Result<Option<Report>> {
        match self.store.get(REPORT_KEY) {
            None => Ok(None),
            Some(encoded) => {
                let report = serde_json::from_str(&encoded)
                    .map_err(|e| Error::session(format!("cached report failed to decode: {e}")))?;
                Ok(Some(report))
            }
        }
    }

    pub fn clear_report(&mut self) {
        self.store.remove(REPORT_KEY);
    }

    /// Last-used project id; survives report overwrites and clears.
    pub fn last_project_id(&self) -> Option<String> {
        self.store.get(PROJECT_KEY).filter(|id| !id.is_empty())
    }

    pub fn set_last_project_id(&mut self, project_id: &str) {
        self.store.set(PROJECT_KEY, project_id);
    }
}

// ============================================================================
// Tests
// ============================================================================
