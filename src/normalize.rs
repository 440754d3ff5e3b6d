//! Report normalization: raw payload of unknown shape to canonical report.
//!
//! This is the orchestrator: classify the payload, rebuild per-mapping
//! structure where needed, reconcile the summary, and attach session
//! metadata. The transformation is pure and synchronous — no I/O, no shared
//! state; two concurrent calls cannot interfere.
//!
//! Policy highlights:
//! - an empty payload (`null`, `{}`, `[]`, blank string) is a legitimate
//!   "no results yet" state and normalizes to an empty Single report;
//! - only a non-empty payload with no recognizable shape is an error;
//! - a flat array with no mapping ids is still grouped per mapping when the
//!   session's comparison mode says the run was an SCD/config one;
//! - explicit session context beats same-named fields embedded in the
//!   payload.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::group;
use crate::model::{Report, ReportMode};
use crate::raw;
use crate::session::SessionContext;
use crate::shape::{self, ShapeTag};
use crate::summary::{self, EmbeddedSummary};

/// Default cap on sample rows kept per test result.
pub const DEFAULT_SAMPLE_PREVIEW_CAP: usize = 5;

/// Normalization knobs.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Maximum number of sample rows kept per test result; the rest of the
    /// preview is dropped.
    pub sample_preview_cap: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            sample_preview_cap: DEFAULT_SAMPLE_PREVIEW_CAP,
        }
    }
}

/// Normalize a raw payload with default options.
pub fn normalize(payload: &Value, ctx: &SessionContext) -> Result<Report> {
    normalize_with(payload, ctx, &NormalizeOptions::default())
}

/// Normalize a raw payload.
pub fn normalize_with(
    payload: &Value,
    ctx: &SessionContext,
    opts: &NormalizeOptions,
) -> Result<Report> {
    normalize_inner(payload, ctx, None, opts)
}

/// Shared implementation; history records route their record-level summary
/// block through `record_summary`.
pub(crate) fn normalize_inner(
    payload: &Value,
    ctx: &SessionContext,
    record_summary: Option<&EmbeddedSummary>,
    opts: &NormalizeOptions,
) -> Result<Report> {
    let tag = if shape::is_empty_payload(payload) {
        None
    } else {
        let tag = shape::classify(payload);
        if tag == ShapeTag::Unknown {
            return Err(Error::unrecognized_shape(format!(
                "non-empty {} payload matched no known shape",
                raw::json_type_name(payload)
            )));
        }
        Some(tag)
    };

    let mut warnings = Vec::new();
    let mut report = Report::default();

    match tag {
        // Empty payload: "no results yet", not an error.
        None | Some(ShapeTag::Unknown) => {}

        Some(ShapeTag::MultiMappingWrapped) => {
            report.mode = ReportMode::MultiMapping;
            let wrapped = raw::field(payload, shape::WRAPPED_KEYS);
            if let Some(Value::Array(elements)) = wrapped {
                report.mapping_results = elements
                    .iter()
                    .enumerate()
                    .map(|(i, element)| raw::decode_mapping_result(element, i, &mut warnings))
                    .collect();
            } else if let Some(other) = wrapped {
                warn!(
                    found = raw::json_type_name(other),
                    "resultsByMapping is not an array; treating as empty"
                );
                warnings.push(format!(
                    "resultsByMapping is {} rather than an array; no mappings decoded",
                    raw::json_type_name(other)
                ));
            }
        }

        Some(ShapeTag::FlatGroupable) => {
            report.mode = ReportMode::MultiMapping;
            if let Some(rows) = payload.as_array() {
                let (groups, group_warnings) = group::group(rows);
                report.mapping_results = groups;
                warnings.extend(group_warnings);
            }
        }

        Some(ShapeTag::FlatSingle) => {
            if let Some(rows) = payload.as_array() {
                if ctx.hints_multi_mapping() {
                    // The comparison mode says this run was grouped per
                    // mapping even though the rows carry no ids.
                    report.mode = ReportMode::MultiMapping;
                    let (groups, group_warnings) = group::group(rows);
                    report.mapping_results = groups;
                    warnings.extend(group_warnings);
                } else {
                    report.mode = ReportMode::Single;
                    report.results = decode_rows(rows, &mut warnings);
                }
            }
        }

        Some(ShapeTag::SingleWrapped) => {
            report.mode = ReportMode::Single;
            report.results = decode_rows(single_wrapped_rows(payload), &mut warnings);
        }
    }

    cap_samples(&mut report, opts.sample_preview_cap);

    // Counts always come from the rows; the embedded block only contributes
    // display hints. A payload-embedded block wins field-wise over the
    // record-level one.
    let embedded = match (raw::decode_embedded_summary(payload), record_summary) {
        (Some(from_payload), Some(from_record)) => Some(from_payload.merged_over(from_record)),
        (Some(from_payload), None) => Some(from_payload),
        (None, Some(from_record)) => Some(from_record.clone()),
        (None, None) => None,
    };
    report.summary = summary::reconcile(embedded.as_ref(), &report);

    // Session metadata: explicit context wins, embedded fields fill gaps.
    let merged = ctx.merged_over(&SessionContext::from_payload(payload));
    report.project_id = merged.project_id.unwrap_or_default();
    report.execution_id = merged.execution_id;
    report.execution_timestamp = merged
        .execution_timestamp
        .as_deref()
        .map(canonical_timestamp);
    report.comparison_mode = merged.comparison_mode.unwrap_or_default();
    if report.summary.executed_by.is_none() {
        report.summary.executed_by = merged.executed_by;
    }

    report.warnings = warnings;

    debug!(
        shape = tag.map_or("empty", ShapeTag::label),
        mode = ?report.mode,
        mappings = report.mapping_results.len(),
        tests = report.summary.total_tests,
        warnings = report.warnings.len(),
        "normalized payload"
    );
    Ok(report)
}

/// Rows of a single-wrapped object, trying the wrapper keys in
/// classification order.
fn single_wrapped_rows(payload: &Value) -> &[Value] {
    raw::array_field(payload, &["results"])
        .or_else(|| raw::array_field(payload, &["predefinedResults", "predefined_results"]))
        .or_else(|| raw::array_field(payload, &["details"]))
        .map_or(&[], Vec::as_slice)
}

fn decode_rows(rows: &[Value], warnings: &mut Vec<String>) -> Vec<crate::model::TestResult> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| raw::decode_test_row(row, &format!("row {i}"), warnings))
        .collect()
}

/// Truncate sample previews to the configured cap.
fn cap_samples(report: &mut Report, cap: usize) {
    let results = report.results.iter_mut().chain(
        report
            .mapping_results
            .iter_mut()
            .flat_map(|m| m.predefined_results.iter_mut()),
    );
    for result in results {
        if let Some(rows) = result.sample_data.as_mut() {
            if rows.len() > cap {
                rows.truncate(cap);
            }
        }
    }
}

/// Canonicalize a timestamp string.
///
/// Offset-carrying timestamps are reformatted as RFC 3339. Naive warehouse
/// DATETIME renderings keep their wall-clock value (no offset is invented);
/// the space-separated form gets the ISO `T` separator. Unparseable strings
/// pass through untouched.
pub(crate) fn canonical_timestamp(value: &str) -> String {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return parsed.to_rfc3339();
    }
    if NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").is_ok() {
        return trimmed.to_string();
    }
    if NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f").is_ok() {
        return trimmed.replacen(' ', "T", 1);
    }
    trimmed.to_string()
}

// ============================================================================
// Tests
// ============================================================================
