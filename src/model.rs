//! Canonical report model: test outcomes, mapping results, and summaries.
//!
//! These types are the shared "wire format" used across the project:
//! - [`crate::normalize`] builds a [`Report`] from whatever raw payload shape
//!   the backend emitted (see [`crate::shape`]).
//! - The session cache persists [`Report`] values as JSON (see
//!   [`crate::session`]).
//! - Presentation code reads only this model, never the raw payloads.
//!
//! Canonical field names are camelCase on the wire. Every spelling a
//! historical producer used (the backend emits snake_case, older cached
//! reports used it too) is accepted via serde aliases, so a report written
//! by any dashboard version round-trips.

use serde::{Deserialize, Serialize};

/// One sample row: ordered column name → scalar (or null) map.
///
/// `serde_json`'s `preserve_order` feature keeps the column order the
/// producer emitted, which is the order the preview table renders.
pub type SampleRow = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Test Outcomes
// ============================================================================

/// Outcome of a single executed check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestOutcome {
    /// The check ran and found nothing wrong.
    Pass,
    /// The check ran and found offending rows.
    Fail,
    /// The check could not run (or its status could not be understood).
    ///
    /// Unrecognized status strings are coerced here by the lenient decoding
    /// path: a result that cannot be verified as a PASS is treated as an
    /// execution error, never dropped.
    #[default]
    Error,
}

impl TestOutcome {
    /// Parse a status string, case-insensitively.
    ///
    /// Returns `None` for anything that is not one of the three known
    /// outcomes; the caller decides whether to reject or coerce.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PASS" => Some(Self::Pass),
            "FAIL" => Some(Self::Fail),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    /// Canonical uppercase label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Test Results
// ============================================================================

/// One executed check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Stable identifier, when the source provided one.
    #[serde(skip_serializing_if = "Option::is_none", alias = "test_id")]
    pub test_id: Option<String>,
    /// Human label. Required non-empty; the lenient decoder substitutes a
    /// placeholder rather than dropping the row.
    #[serde(alias = "test_name")]
    pub test_name: String,
    /// Display-filter category (e.g. `"smoke"`, `"custom"`); does not affect
    /// normalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub description: String,
    /// The check's query text, opaque to normalization.
    #[serde(default, alias = "sql_query")]
    pub sql_query: String,
    /// Free-form (`HIGH`/`MEDIUM`/`LOW` by convention, not enforced).
    #[serde(default)]
    pub severity: String,
    pub status: TestOutcome,
    /// Count of offending rows. Meaningful when status ≠ PASS, but sources
    /// may populate it for PASS too and normalization keeps what they sent.
    #[serde(default, alias = "rows_affected")]
    pub rows_affected: i64,
    /// Bounded preview of offending rows (capped during normalization).
    #[serde(skip_serializing_if = "Option::is_none", alias = "sample_data")]
    pub sample_data: Option<Vec<SampleRow>>,
    /// Populated when status = ERROR; [`TestResult::message`] falls back to
    /// `description` when absent.
    #[serde(skip_serializing_if = "Option::is_none", alias = "error_message")]
    pub error_message: Option<String>,
}

impl TestResult {
    /// Explanatory text for display: the error message when present,
    /// otherwise the description.
    #[must_use]
    pub fn message(&self) -> &str {
        self.error_message.as_deref().unwrap_or(&self.description)
    }
}

// ============================================================================
// Mappings
// ============================================================================

/// Bucket key for rows and wrapper elements that carry no mapping id.
pub const UNKNOWN_MAPPING_ID: &str = "unknown";

/// Display label for test rows that arrived without a usable `testName`.
pub const PLACEHOLDER_TEST_NAME: &str = "Unnamed Test";

/// Information about one source→target pairing under test.
///
/// All fields are best-effort; any may be `"unknown"`/0 when the source
/// shape could not supply them (flattened log rows carry no row counts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingInfo {
    /// Input data identifier, e.g. a `gs://bucket/path` file or a source
    /// table name.
    pub source: String,
    /// Dotted `dataset.table` or `project.dataset.table`.
    pub target: String,
    #[serde(default, alias = "file_row_count")]
    pub file_row_count: i64,
    #[serde(default, alias = "table_row_count")]
    pub table_row_count: i64,
}

impl Default for MappingInfo {
    fn default() -> Self {
        Self {
            source: UNKNOWN_MAPPING_ID.to_string(),
            target: UNKNOWN_MAPPING_ID.to_string(),
            file_row_count: 0,
            table_row_count: 0,
        }
    }
}

/// An AI-proposed, unexecuted check. Not a [`TestResult`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSuggestion {
    #[serde(alias = "test_name")]
    pub test_name: String,
    /// Defaults to `"custom"` when the producer omitted it.
    #[serde(default = "default_test_category", alias = "test_category")]
    pub test_category: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default, alias = "sql_query")]
    pub sql_query: String,
    #[serde(default)]
    pub reasoning: String,
}

fn default_test_category() -> String {
    "custom".to_string()
}

/// Results for a single mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingResult {
    /// Required, unique within a [`Report`].
    #[serde(alias = "mapping_id")]
    pub mapping_id: String,
    #[serde(skip_serializing_if = "Option::is_none", alias = "mapping_info")]
    pub mapping_info: Option<MappingInfo>,
    /// Insertion order = execution/display order; not semantically sortable.
    #[serde(default, alias = "predefined_results")]
    pub predefined_results: Vec<TestResult>,
    // Producers drifted on this key's casing; accept every observed spelling.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        alias = "ai_suggestions",
        alias = "AISuggestions"
    )]
    pub ai_suggestions: Vec<AiSuggestion>,
    /// Set when the whole mapping failed before any test ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Summary
// ============================================================================

/// Authoritative summary counts for one report.
///
/// Always produced by [`crate::summary::reconcile`]; embedded summary blocks
/// from upstream are display hints only (they have been observed stale,
/// zeroed, or absent).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(default, alias = "total_mappings")]
    pub total_mappings: i64,
    #[serde(default, alias = "total_tests")]
    pub total_tests: i64,
    #[serde(default, alias = "passed_tests", alias = "passedTests")]
    pub passed: i64,
    #[serde(default, alias = "failed_tests", alias = "failedTests")]
    pub failed: i64,
    #[serde(default, alias = "error_tests", alias = "errorTests")]
    pub errors: i64,
    #[serde(
        skip_serializing_if = "Option::is_none",
        alias = "total_suggestions"
    )]
    pub total_suggestions: Option<i64>,
    /// Triggering actor/principal, purely informational.
    #[serde(skip_serializing_if = "Option::is_none", alias = "executed_by")]
    pub executed_by: Option<String>,
}

impl Summary {
    /// Post-reconciliation invariant: the total equals the per-status sum.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.total_tests == self.passed + self.failed + self.errors
    }

    /// Whether this run should trigger a failure alert.
    #[must_use]
    pub const fn requires_alert(&self) -> bool {
        self.failed > 0 || self.errors > 0
    }
}

// ============================================================================
// Report
// ============================================================================

/// How a report's results are structured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportMode {
    /// One flat result list.
    #[default]
    Single,
    /// Results bucketed per mapping.
    MultiMapping,
}

impl ReportMode {
    #[must_use]
    pub const fn is_multi(self) -> bool {
        matches!(self, Self::MultiMapping)
    }
}

/// The canonical, displayable report: the single normalized representation
/// all presentation code reads from, regardless of which raw shape was
/// ingested.
///
/// Constructed once per normalization call and immutable afterwards; view
/// state (expanded SQL panels and the like) lives outside this model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub mode: ReportMode,
    /// Flat results; populated in [`ReportMode::Single`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<TestResult>,
    /// Per-mapping buckets; populated in [`ReportMode::MultiMapping`].
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        rename = "resultsByMapping",
        alias = "results_by_mapping",
        alias = "mappingResults"
    )]
    pub mapping_results: Vec<MappingResult>,
    pub summary: Summary,
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        alias = "project_id"
    )]
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none", alias = "execution_id")]
    pub execution_id: Option<String>,
    /// RFC 3339 after normalization.
    #[serde(
        skip_serializing_if = "Option::is_none",
        alias = "execution_timestamp"
    )]
    pub execution_timestamp: Option<String>,
    /// Free-form tag describing how the run was configured, e.g.
    /// `"scd-config"`.
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        alias = "comparison_mode"
    )]
    pub comparison_mode: String,
    /// Human-readable records of every coercion the malformed-row policy
    /// applied, so garbled input stays visible instead of vanishing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Report {
    /// Iterate every test result, flattened across mappings when in
    /// multi-mapping mode.
    pub fn all_results(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().chain(
            self.mapping_results
                .iter()
                .flat_map(|m| m.predefined_results.iter()),
        )
    }

    /// Whether the report carries no test results at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all_results().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_parse_is_case_insensitive() {
        assert_eq!(TestOutcome::parse("PASS"), Some(TestOutcome::Pass));
        assert_eq!(TestOutcome::parse("pass"), Some(TestOutcome::Pass));
        assert_eq!(TestOutcome::parse(" Fail "), Some(TestOutcome::Fail));
        assert_eq!(TestOutcome::parse("error"), Some(TestOutcome::Error));
        assert_eq!(TestOutcome::parse("WARN"), None);
        assert_eq!(TestOutcome::parse(""), None);
    }

    #[test]
    fn outcome_labels_are_uppercase() {
        assert_eq!(TestOutcome::Pass.label(), "PASS");
        assert_eq!(TestOutcome::Fail.to_string(), "FAIL");
        assert_eq!(TestOutcome::Error.label(), "ERROR");
    }

    #[test]
    fn mode_predicate_matches_variants() {
        assert!(ReportMode::MultiMapping.is_multi());
        assert!(!ReportMode::Single.is_multi());
    }

    #[test]
    fn test_result_accepts_snake_case_aliases() {
        let json = r#"{
            "test_id": "row_count_match",
            "test_name": "Row Count Match",
            "status": "FAIL",
            "sql_query": "SELECT 1",
            "rows_affected": 12,
            "error_message": "Row count mismatch: 12 rows difference"
        }"#;
        let result: TestResult = serde_json::from_str(json).expect("deserialize");
        assert_eq!(result.test_id.as_deref(), Some("row_count_match"));
        assert_eq!(result.test_name, "Row Count Match");
        assert_eq!(result.status, TestOutcome::Fail);
        assert_eq!(result.rows_affected, 12);
        assert_eq!(result.message(), "Row count mismatch: 12 rows difference");
    }

    #[test]
    fn test_result_message_falls_back_to_description() {
        let result = TestResult {
            test_name: "Null Check".to_string(),
            description: "Checks for null keys".to_string(),
            status: TestOutcome::Pass,
            ..Default::default()
        };
        assert_eq!(result.message(), "Checks for null keys");
    }

    #[test]
    fn suggestion_category_defaults_to_custom() {
        let json = r#"{"test_name": "Check emails", "sql_query": "SELECT 1", "reasoning": "because"}"#;
        let suggestion: AiSuggestion = serde_json::from_str(json).expect("deserialize");
        assert_eq!(suggestion.test_category, "custom");
    }

    #[test]
    fn mapping_result_accepts_suggestion_casing_drift() {
        let json = r#"{
            "mapping_id": "m1",
            "predefined_results": [],
            "AISuggestions": [{"testName": "t", "severity": "LOW"}]
        }"#;
        let mapping: MappingResult = serde_json::from_str(json).expect("deserialize");
        assert_eq!(mapping.mapping_id, "m1");
        assert_eq!(mapping.ai_suggestions.len(), 1);
        assert_eq!(mapping.ai_suggestions[0].test_category, "custom");
    }

    #[test]
    fn summary_consistency_and_alerts() {
        let summary = Summary {
            total_mappings: 1,
            total_tests: 5,
            passed: 3,
            failed: 1,
            errors: 1,
            ..Default::default()
        };
        assert!(summary.is_consistent());
        assert!(summary.requires_alert());

        let clean = Summary {
            total_mappings: 1,
            total_tests: 2,
            passed: 2,
            ..Default::default()
        };
        assert!(clean.is_consistent());
        assert!(!clean.requires_alert());
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = Report {
            mode: ReportMode::MultiMapping,
            mapping_results: vec![MappingResult {
                mapping_id: "m1".to_string(),
                ..Default::default()
            }],
            summary: Summary {
                total_mappings: 1,
                ..Default::default()
            },
            project_id: "proj".to_string(),
            comparison_mode: "scd-config".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["mode"], "multiMapping");
        assert!(value.get("resultsByMapping").is_some());
        assert_eq!(value["summary"]["totalMappings"], 1);
        assert_eq!(value["projectId"], "proj");
        assert_eq!(value["comparisonMode"], "scd-config");
        // Empty collections stay off the wire.
        assert!(value.get("results").is_none());
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn report_round_trips_through_old_snake_case_cache() {
        let json = r#"{
            "mode": "single",
            "results": [{"test_name": "t1", "status": "PASS"}],
            "summary": {"total_mappings": 1, "total_tests": 1, "passed": 1, "failed": 0, "errors": 0},
            "project_id": "proj",
            "execution_id": "abc12345",
            "comparison_mode": "gcs"
        }"#;
        let report: Report = serde_json::from_str(json).expect("deserialize");
        assert_eq!(report.mode, ReportMode::Single);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.project_id, "proj");
        assert_eq!(report.execution_id.as_deref(), Some("abc12345"));

        let round = serde_json::to_string(&report).expect("serialize");
        let again: Report = serde_json::from_str(&round).expect("re-deserialize");
        assert_eq!(report, again);
    }
}
