//! Common test infrastructure for `dataqa-report`.
//!
//! Shared across the integration suites:
//! - Buffered logging with auto-dump on test failure
//! - Payload fixture builders for the recurring wire shapes

pub mod logging;

#[allow(unused_imports)]
pub use logging::TestLogger;

use serde_json::{Value, json};

/// A minimal test row with just a name and a status.
#[allow(dead_code)]
pub fn test_row(name: &str, status: &str) -> Value {
    json!({ "testName": name, "status": status })
}

/// A test row carrying its own mapping id, as flat groupable payloads do.
#[allow(dead_code)]
pub fn grouped_row(name: &str, status: &str, mapping_id: &str) -> Value {
    json!({ "testName": name, "status": status, "mappingId": mapping_id })
}

/// A single-mapping payload: `{"results": [...]}`.
#[allow(dead_code)]
pub fn single_wrapped(rows: Vec<Value>) -> Value {
    json!({ "results": rows })
}

/// One element of a multi-mapping wrapper. Rows live under
/// `predefinedResults`, the only key the backend ever used inside mapping
/// elements (`results` belongs to single-wrapped payloads).
#[allow(dead_code)]
pub fn mapping_element(mapping_id: &str, rows: Vec<Value>) -> Value {
    json!({ "mappingId": mapping_id, "predefinedResults": rows })
}

/// A multi-mapping payload: `{"resultsByMapping": [...]}`.
#[allow(dead_code)]
pub fn multi_wrapped(elements: Vec<Value>) -> Value {
    json!({ "resultsByMapping": elements })
}

/// A stored SCD history record the way the backend writes them:
/// serialized `test_results`, serialized `metadata`, and record-level
/// mapping fields that normalization pushes down onto each row.
#[allow(dead_code)]
pub fn scd_history_record(execution_id: &str, rows: &Value, metadata: &Value) -> Value {
    json!({
        "execution_id": execution_id,
        "execution_timestamp": "2026-08-20T09:15:00",
        "mapping_id": "mapping-scd",
        "target_dataset": "warehouse",
        "target_table": "dim_customer",
        "source": "Manual Run",
        "executed_by": "scheduler",
        "test_results": rows.to_string(),
        "metadata": metadata.to_string(),
    })
}
