//! History record adaptation.
//!
//! Stored execution-history records differ from live responses in three
//! ways: the payload may be a JSON-encoded string instead of a structure,
//! field names follow an older scheme (`target_dataset` + `target_table`
//! split instead of a combined `target`, `timestamp` vs
//! `executionTimestamp`), and per-run metadata (mapping id, target, actor,
//! summary counts) lives at the record level instead of inside the payload.
//! This module unwraps a record into the exact input the normalizer
//! accepts, without ever letting one corrupt record abort the rest of the
//! list.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{Report, TestOutcome, UNKNOWN_MAPPING_ID};
use crate::normalize::{self, NormalizeOptions};
use crate::raw;
use crate::session::SessionContext;
use crate::summary::EmbeddedSummary;

/// Keys a record may store its payload under, tried in order.
const PAYLOAD_KEYS: &[&str] = &["testResults", "test_results", "details"];

/// A history record unwrapped into normalizer input.
#[derive(Debug, Clone)]
pub struct AdaptedRecord {
    /// Parsed payload with legacy field names normalized.
    pub payload: Value,
    /// Session context recovered from record-level fields.
    pub context: SessionContext,
    /// Record-level summary hints, for the reconciler to distrust.
    pub summary: Option<EmbeddedSummary>,
}

impl AdaptedRecord {
    /// Normalize this record's payload with default options.
    pub fn normalize(&self) -> Result<Report> {
        self.normalize_with(&NormalizeOptions::default())
    }

    /// Normalize this record's payload.
    pub fn normalize_with(&self, opts: &NormalizeOptions) -> Result<Report> {
        normalize::normalize_inner(&self.payload, &self.context, self.summary.as_ref(), opts)
    }
}

/// Adapt one stored history record.
///
/// Fails with [`Error::CorruptHistoryRecord`] when the record is not an
/// object or its serialized payload does not parse; the caller skips that
/// record and keeps going.
pub fn adapt(record: &Value) -> Result<AdaptedRecord> {
    if !record.is_object() {
        return Err(Error::corrupt_history(format!(
            "history record is {} rather than an object",
            raw::json_type_name(record)
        )));
    }

    let mut payload = extract_payload(record)?;
    push_down_record_fields(&mut payload, record);

    let context = SessionContext::from_payload(record);
    let summary = record_summary_hints(record);

    debug!(
        execution_id = context.execution_id.as_deref().unwrap_or(""),
        payload_type = raw::json_type_name(&payload),
        has_summary = summary.is_some(),
        "adapted history record"
    );
    Ok(AdaptedRecord {
        payload,
        context,
        summary,
    })
}

/// Adapt a whole history list, skipping corrupt records.
///
/// Returns the successfully adapted records together with the index and
/// error of every record that failed.
pub fn adapt_all(records: &[Value]) -> (Vec<AdaptedRecord>, Vec<(usize, Error)>) {
    let mut adapted = Vec::with_capacity(records.len());
    let mut failures = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match adapt(record) {
            Ok(rec) => adapted.push(rec),
            Err(err) => {
                warn!(index, error = %err, "skipping corrupt history record");
                failures.push((index, err));
            }
        }
    }
    (adapted, failures)
}

fn extract_payload(record: &Value) -> Result<Value> {
    for key in PAYLOAD_KEYS {
        if let Some(value) = raw::field(record, &[key]) {
            return match value {
                Value::String(encoded) => serde_json::from_str(encoded).map_err(|e| {
                    Error::corrupt_history(format!("payload under '{key}' failed to parse: {e}"))
                }),
                structured => Ok(structured.clone()),
            };
        }
    }
    // A record without a payload is a list entry, not corruption; it
    // normalizes to an empty report.
    Ok(Value::Null)
}

/// Push record-level fields down onto flat payload rows that lack them, and
/// normalize the legacy split target spelling on each row.
fn push_down_record_fields(payload: &mut Value, record: &Value) {
    let record_target = raw::combined_target(record);
    let record_mapping_id = raw::nonempty_string_field(record, &["mappingId", "mapping_id"]);
    let record_source = raw::nonempty_string_field(record, &["source"]);

    let Some(rows) = payload.as_array_mut() else {
        return;
    };
    for row in rows {
        // Row-level fields win; the record only fills gaps.
        let target = raw::combined_target(row).or_else(|| record_target.clone());
        let needs_mapping_id =
            raw::nonempty_string_field(row, &["mappingId", "mapping_id"]).is_none();
        let needs_source = raw::nonempty_string_field(row, &["source"]).is_none();

        let Some(obj) = row.as_object_mut() else {
            continue;
        };
        if let Some(target) = target {
            obj.insert("target".to_string(), Value::String(target));
        }
        if needs_mapping_id {
            if let Some(id) = record_mapping_id.clone() {
                obj.insert("mappingId".to_string(), Value::String(id));
            }
        }
        if needs_source {
            if let Some(source) = record_source.clone() {
                obj.insert("source".to_string(), Value::String(source));
            }
        }
    }
}

/// Record-level summary hints: top-level counters, the `metadata.summary`
/// block, and the triggering actor.
fn record_summary_hints(record: &Value) -> Option<EmbeddedSummary> {
    let mut hints = EmbeddedSummary {
        total_tests: raw::int_field(record, &["totalTests", "total_tests"]),
        passed: raw::int_field(record, &["passedTests", "passed_tests"]),
        failed: raw::int_field(record, &["failedTests", "failed_tests"]),
        errors: raw::int_field(record, &["errorTests", "error_tests"]),
        executed_by: raw::nonempty_string_field(record, &["executedBy", "executed_by"]),
        ..Default::default()
    };
    if let Some(meta) = metadata_summary(record) {
        hints = hints.merged_over(&meta);
    }
    (!hints.is_vacant()).then_some(hints)
}

/// The `metadata.summary` block; `metadata` itself is stored as an object
/// or as a JSON string. A metadata block that fails to parse is dropped
/// with a warning — it is auxiliary, not the payload.
fn metadata_summary(record: &Value) -> Option<EmbeddedSummary> {
    let meta = raw::field(record, &["metadata"])?;
    match meta {
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(parsed) => raw::decode_embedded_summary(&parsed),
            Err(e) => {
                warn!(error = %e, "metadata block failed to parse; ignoring");
                None
            }
        },
        structured => raw::decode_embedded_summary(structured),
    }
}

// ============================================================================
// History list view
// ============================================================================

/// One row of the history list screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub execution_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comparison_mode: String,
    /// Rollup badge for the run.
    pub status: TestOutcome,
    pub total_tests: i64,
    pub passed_tests: i64,
    pub failed_tests: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Reshape one raw record into a history list row.
///
/// Pure and lenient: every legacy spelling is accepted, and a missing or
/// unrecognized record status is derived from the stored counts with the
/// usual error-beats-failure precedence.
#[must_use]
pub fn list_entry(record: &Value) -> HistoryEntry {
    let total_tests = raw::int_field(record, &["totalTests", "total_tests"]).unwrap_or(0);
    let passed_tests = raw::int_field(record, &["passedTests", "passed_tests"]).unwrap_or(0);
    let failed_tests = raw::int_field(record, &["failedTests", "failed_tests"]).unwrap_or(0);

    let status = raw::string_field(record, &["status"])
        .and_then(|s| TestOutcome::parse(&s))
        .unwrap_or_else(|| {
            if total_tests > passed_tests + failed_tests {
                TestOutcome::Error
            } else if failed_tests > 0 {
                TestOutcome::Fail
            } else {
                TestOutcome::Pass
            }
        });

    HistoryEntry {
        execution_id: raw::nonempty_string_field(record, &["executionId", "execution_id"])
            .unwrap_or_else(|| UNKNOWN_MAPPING_ID.to_string()),
        execution_timestamp: raw::nonempty_string_field(
            record,
            &["executionTimestamp", "execution_timestamp", "timestamp"],
        )
        .map(|ts| normalize::canonical_timestamp(&ts)),
        comparison_mode: raw::string_field(record, &["comparisonMode", "comparison_mode"])
            .unwrap_or_default(),
        status,
        total_tests,
        passed_tests,
        failed_tests,
        executed_by: raw::nonempty_string_field(record, &["executedBy", "executed_by"]),
        target: raw::combined_target(record),
    }
}

/// Reshape a whole history list.
#[must_use]
pub fn list_entries(records: &[Value]) -> Vec<HistoryEntry> {
    records.iter().map(list_entry).collect()
}

// ============================================================================
// Tests
// ============================================================================
