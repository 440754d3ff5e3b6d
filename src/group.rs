//! Grouping of flat test rows into per-mapping buckets.
//!
//! Granular log exports flatten a multi-mapping run into one array of rows,
//! each tagged with a `mappingId`. This module rebuilds the per-mapping
//! structure deterministically:
//! - buckets are emitted in first-seen order,
//! - rows keep their original relative order within a bucket,
//! - mapping metadata is frozen from the bucket-creating row (later rows
//!   never overwrite it, even when they disagree),
//! - rows without a `mappingId` land in the literal `"unknown"` bucket.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::model::{MappingInfo, MappingResult, UNKNOWN_MAPPING_ID};
use crate::raw;

/// Group a flat array of raw test rows by mapping id.
///
/// Every row passes through the malformed-row coercion policy; coercions are
/// reported in the returned warnings alongside the grouped buckets.
#[must_use]
pub fn group(rows: &[Value]) -> (Vec<MappingResult>, Vec<String>) {
    let mut warnings = Vec::new();
    let mut buckets: Vec<MappingResult> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for (position, row) in rows.iter().enumerate() {
        let mapping_id = raw::nonempty_string_field(row, &["mappingId", "mapping_id"])
            .unwrap_or_else(|| UNKNOWN_MAPPING_ID.to_string());

        let bucket = *index_by_id.entry(mapping_id.clone()).or_insert_with(|| {
            buckets.push(MappingResult {
                mapping_id: mapping_id.clone(),
                mapping_info: Some(synthesize_info(row)),
                predefined_results: Vec::new(),
                ai_suggestions: Vec::new(),
                error: None,
            });
            buckets.len() - 1
        });

        let result = raw::decode_test_row(row, &format!("row {position}"), &mut warnings);
        buckets[bucket].predefined_results.push(result);
    }

    debug!(
        rows = rows.len(),
        groups = buckets.len(),
        warnings = warnings.len(),
        "grouped flat rows by mapping"
    );
    (buckets, warnings)
}

/// Build mapping metadata from the first row seen for a mapping id.
///
/// Accepts the legacy `target_dataset` + `target_table` split in place of a
/// combined `target`. Row counts are unrecoverable from flattened data and
/// stay 0.
fn synthesize_info(row: &Value) -> MappingInfo {
    MappingInfo {
        source: raw::nonempty_string_field(row, &["source"])
            .unwrap_or_else(|| UNKNOWN_MAPPING_ID.to_string()),
        target: raw::combined_target(row).unwrap_or_else(|| UNKNOWN_MAPPING_ID.to_string()),
        ..MappingInfo::default()
    }
}

// ============================================================================
// Tests
// ============================================================================
