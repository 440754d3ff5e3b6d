//! Payload shape classification.
//!
//! The backend has shipped at least five materially different JSON shapes for
//! "the results of a run". Every ingestion path used to sniff them with its
//! own ad-hoc `if`-chain; this module is the one canonical decision tree.
//! The precedence order is load-bearing: `resultsByMapping` outranks a
//! sibling `results` key, and a bare array is inspected through its first
//! element only.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::raw;

/// Observed spellings of the grouped-by-mapping wrapper key.
pub(crate) const WRAPPED_KEYS: &[&str] =
    &["resultsByMapping", "results_by_mapping", "mappingResults"];

/// The recognized input shapes, in classification precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeTag {
    /// Object carrying `resultsByMapping`: already grouped per mapping.
    MultiMappingWrapped,
    /// Bare array whose rows carry a `mappingId`: flat but groupable.
    FlatGroupable,
    /// Bare array without mapping discriminators: a single result list.
    FlatSingle,
    /// Object wrapping a single result list under `results`,
    /// `predefinedResults`, or the history alias `details`.
    SingleWrapped,
    /// None of the above.
    Unknown,
}

impl ShapeTag {
    /// All recognized shapes.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::MultiMappingWrapped,
            Self::FlatGroupable,
            Self::FlatSingle,
            Self::SingleWrapped,
            Self::Unknown,
        ]
    }

    /// Human-readable label for diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MultiMappingWrapped => "multi-mapping wrapped",
            Self::FlatGroupable => "flat groupable array",
            Self::FlatSingle => "flat single array",
            Self::SingleWrapped => "single wrapped",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ShapeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a raw parsed payload.
///
/// Pure and total: anything unrecognized maps to [`ShapeTag::Unknown`],
/// nothing panics. First match in the documented order wins.
#[must_use]
pub fn classify(payload: &Value) -> ShapeTag {
    // 1. Grouped-by-mapping wrapper. Existence is enough: producers have
    //    shipped this key with empty arrays, which still means "grouped".
    if raw::field(payload, WRAPPED_KEYS).is_some() {
        return ShapeTag::MultiMappingWrapped;
    }

    // 2. Bare array: the first element decides whether it can be grouped.
    if let Some(rows) = payload.as_array() {
        let groupable = rows
            .first()
            .is_some_and(|row| raw::field(row, &["mappingId", "mapping_id"]).is_some());
        return if groupable {
            ShapeTag::FlatGroupable
        } else {
            ShapeTag::FlatSingle
        };
    }

    // 3-5. Single result list under one of three wrapper keys.
    if raw::array_field(payload, &["results"]).is_some() {
        return ShapeTag::SingleWrapped;
    }
    if raw::array_field(payload, &["predefinedResults", "predefined_results"]).is_some() {
        return ShapeTag::SingleWrapped;
    }
    if raw::array_field(payload, &["details"]).is_some() {
        return ShapeTag::SingleWrapped;
    }

    ShapeTag::Unknown
}

/// Whether a payload carries no data at all: JSON null, empty object, empty
/// array, or a blank string. "No results yet" is a legitimate state, not a
/// malformed one.
#[must_use]
pub fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(rows) => rows.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

// ============================================================================
// Tests
// ============================================================================
