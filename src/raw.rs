//! Lenient field access and row decoding for raw payload values.
//!
//! Historical producers disagree on field casing (`testName` vs `test_name`),
//! stringify numbers, and occasionally drop required fields. This module is
//! the one place that tolerance lives:
//! - field lookup accepts every observed spelling of a key,
//! - numeric fields accept numbers or numeric strings,
//! - malformed test rows are coerced, never dropped: a row missing its
//!   `testName` gets a placeholder, a row with a missing or unrecognized
//!   `status` becomes `ERROR`, and each coercion is recorded as a warning so
//!   garbled data stays visible in the report.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Error;
use crate::model::{
    AiSuggestion, MappingInfo, MappingResult, SampleRow, TestOutcome, TestResult,
    PLACEHOLDER_TEST_NAME, UNKNOWN_MAPPING_ID,
};
use crate::summary::EmbeddedSummary;

// ============================================================================
// Field access
// ============================================================================

/// Look up the first non-null value among `keys` on a JSON object.
///
/// Returns `None` for non-objects. JSON null counts as absent (producers
/// emit explicit nulls for absent fields), and an explicit null under one
/// spelling must not shadow a populated sibling spelling.
pub(crate) fn field<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let obj = raw.as_object()?;
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

/// String field: JSON strings only. Anything else falls through to the
/// caller's default — no stringify-whatever coercion.
pub(crate) fn string_field(raw: &Value, keys: &[&str]) -> Option<String> {
    field(raw, keys).and_then(Value::as_str).map(str::to_string)
}

/// Non-blank string field.
pub(crate) fn nonempty_string_field(raw: &Value, keys: &[&str]) -> Option<String> {
    string_field(raw, keys).filter(|s| !s.trim().is_empty())
}

/// Integer field: accepts a JSON integer or a numeric string (producers
/// stringify counts). Floats and garbage are rejected.
pub(crate) fn int_field(raw: &Value, keys: &[&str]) -> Option<i64> {
    match field(raw, keys)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Array field, by any of the given keys.
pub(crate) fn array_field<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    field(raw, keys).and_then(Value::as_array)
}

/// A combined `target` string, from either the combined field or the legacy
/// `target_dataset` + `target_table` split.
pub(crate) fn combined_target(raw: &Value) -> Option<String> {
    if let Some(target) = nonempty_string_field(raw, &["target"]) {
        return Some(target);
    }
    let dataset = nonempty_string_field(raw, &["targetDataset", "target_dataset"])?;
    let table = nonempty_string_field(raw, &["targetTable", "target_table"])?;
    Some(format!("{dataset}.{table}"))
}

/// JSON type name for diagnostics.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Test rows
// ============================================================================

/// Decode one raw test row with the malformed-row coercion policy.
///
/// `at` names the row's position for warning messages ("row 3",
/// "mapping m1 row 2").
pub(crate) fn decode_test_row(raw: &Value, at: &str, warnings: &mut Vec<String>) -> TestResult {
    if !raw.is_object() {
        let message = Error::malformed_result(format!("{at}: not an object")).to_string();
        warn!(at, "test row is not an object; coercing to ERROR placeholder");
        warnings.push(message);
        return TestResult {
            test_name: PLACEHOLDER_TEST_NAME.to_string(),
            status: TestOutcome::Error,
            error_message: Some("Unparseable test row".to_string()),
            ..Default::default()
        };
    }

    let test_name = match nonempty_string_field(raw, &["testName", "test_name"]) {
        Some(name) => name,
        None => {
            let message =
                Error::malformed_result(format!("{at}: missing testName")).to_string();
            warn!(at, "test row missing testName; using placeholder");
            warnings.push(message);
            PLACEHOLDER_TEST_NAME.to_string()
        }
    };

    let status = match string_field(raw, &["status"]) {
        Some(value) => match TestOutcome::parse(&value) {
            Some(outcome) => outcome,
            None => {
                let message = Error::malformed_result(format!(
                    "{at}: unrecognized status '{value}'"
                ))
                .to_string();
                warn!(at, status = %value, "unrecognized status; coercing to ERROR");
                warnings.push(message);
                TestOutcome::Error
            }
        },
        None => {
            let message = Error::malformed_result(format!("{at}: missing status")).to_string();
            warn!(at, "test row missing status; coercing to ERROR");
            warnings.push(message);
            TestOutcome::Error
        }
    };

    let rows_affected = match field(raw, &["rowsAffected", "rows_affected"]) {
        None => 0,
        Some(_) => int_field(raw, &["rowsAffected", "rows_affected"]).unwrap_or_else(|| {
            debug!(at, "non-numeric rowsAffected; defaulting to 0");
            0
        }),
    };

    TestResult {
        test_id: nonempty_string_field(raw, &["testId", "test_id"]),
        test_name,
        category: nonempty_string_field(raw, &["category"]),
        description: string_field(raw, &["description"]).unwrap_or_default(),
        sql_query: string_field(raw, &["sqlQuery", "sql_query"]).unwrap_or_default(),
        severity: string_field(raw, &["severity"]).unwrap_or_default(),
        status,
        rows_affected,
        sample_data: decode_sample_data(raw),
        error_message: nonempty_string_field(raw, &["errorMessage", "error_message"]),
    }
}

fn decode_sample_data(raw: &Value) -> Option<Vec<SampleRow>> {
    let rows = array_field(raw, &["sampleData", "sample_data"])?;
    let decoded: Vec<SampleRow> = rows
        .iter()
        .filter_map(|row| row.as_object().cloned())
        .collect();
    if decoded.is_empty() && !rows.is_empty() {
        debug!("sampleData contained no object rows; dropping preview");
        return None;
    }
    Some(decoded)
}

// ============================================================================
// Mapping wrappers
// ============================================================================

/// Decode one element of a `resultsByMapping` array.
///
/// Elements already conform to `MappingResult` modulo field-name drift; rows
/// inside still pass through the coercion policy.
pub(crate) fn decode_mapping_result(
    raw: &Value,
    index: usize,
    warnings: &mut Vec<String>,
) -> MappingResult {
    let mapping_id = nonempty_string_field(raw, &["mappingId", "mapping_id"]).unwrap_or_else(|| {
        warn!(index, "mapping element missing mappingId; using 'unknown'");
        UNKNOWN_MAPPING_ID.to_string()
    });

    let predefined_results = array_field(raw, &["predefinedResults", "predefined_results"])
        .map(|rows| {
            rows.iter()
                .enumerate()
                .map(|(i, row)| {
                    decode_test_row(row, &format!("mapping {mapping_id} row {i}"), warnings)
                })
                .collect()
        })
        .unwrap_or_default();

    MappingResult {
        mapping_id,
        mapping_info: decode_mapping_info(raw),
        predefined_results,
        ai_suggestions: decode_suggestions(raw),
        error: nonempty_string_field(raw, &["error"]),
    }
}

/// Decode a `mappingInfo` block, best-effort.
pub(crate) fn decode_mapping_info(raw: &Value) -> Option<MappingInfo> {
    let info = field(raw, &["mappingInfo", "mapping_info"])?;
    if !info.is_object() {
        return None;
    }
    Some(MappingInfo {
        source: nonempty_string_field(info, &["source"])
            .unwrap_or_else(|| UNKNOWN_MAPPING_ID.to_string()),
        target: nonempty_string_field(info, &["target"])
            .unwrap_or_else(|| UNKNOWN_MAPPING_ID.to_string()),
        file_row_count: int_field(info, &["fileRowCount", "file_row_count"]).unwrap_or(0),
        table_row_count: int_field(info, &["tableRowCount", "table_row_count"]).unwrap_or(0),
    })
}

/// Decode the AI-suggestion list under any of its observed keys.
pub(crate) fn decode_suggestions(raw: &Value) -> Vec<AiSuggestion> {
    let Some(items) = array_field(raw, &["aiSuggestions", "ai_suggestions", "AISuggestions"])
    else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| AiSuggestion {
            test_name: string_field(item, &["testName", "test_name"]).unwrap_or_default(),
            test_category: nonempty_string_field(item, &["testCategory", "test_category"])
                .unwrap_or_else(|| "custom".to_string()),
            severity: string_field(item, &["severity"]).unwrap_or_default(),
            sql_query: string_field(item, &["sqlQuery", "sql_query"]).unwrap_or_default(),
            reasoning: string_field(item, &["reasoning"]).unwrap_or_default(),
        })
        .collect()
}

/// Decode an embedded summary block under `summary`, tolerating every
/// observed spelling (camelCase, snake_case, and the `total` key the
/// metadata blocks of SCD history rows use).
pub(crate) fn decode_embedded_summary(raw: &Value) -> Option<EmbeddedSummary> {
    let block = field(raw, &["summary"])?;
    decode_summary_block(block)
}

/// Decode a summary-shaped object directly (history adapters hold these
/// outside a `summary` key).
pub(crate) fn decode_summary_block(block: &Value) -> Option<EmbeddedSummary> {
    if !block.is_object() {
        return None;
    }
    Some(EmbeddedSummary {
        total_mappings: int_field(block, &["totalMappings", "total_mappings"]),
        total_tests: int_field(block, &["totalTests", "total_tests", "total"]),
        passed: int_field(block, &["passed", "passedTests", "passed_tests"]),
        failed: int_field(block, &["failed", "failedTests", "failed_tests"]),
        errors: int_field(block, &["errors", "errorTests", "error_tests"]),
        total_suggestions: int_field(block, &["totalSuggestions", "total_suggestions"]),
        executed_by: nonempty_string_field(block, &["executedBy", "executed_by"]),
    })
}
