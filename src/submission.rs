//! Custom test submission building.
//!
//! An accepted AI suggestion becomes a saved custom test through an external
//! collaborator. This module supplies that collaborator's input: the pure
//! field assembly (including the dataset/table split of a dotted target) and
//! the per-session at-most-once ledger. The network call itself lives
//! elsewhere.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::AiSuggestion;

/// Dataset the backend stores custom tests in.
pub const DEFAULT_DATASET_ID: &str = "config";

/// Category applied when a suggestion does not carry one.
pub const DEFAULT_TEST_CATEGORY: &str = "custom";

/// Split a dotted target into `(dataset, table)`.
///
/// `dataset.table` maps positionally; `project.dataset.table` drops the
/// leading project segment. Any other segment count is refused — a wrong
/// guess would save the test against the wrong table.
pub fn split_target(target: &str) -> Result<(String, String)> {
    let trimmed = target.trim();
    let parts: Vec<&str> = trimmed.split('.').collect();
    if parts.iter().any(|part| part.trim().is_empty()) {
        return Err(Error::target_parse(trimmed));
    }
    match parts.as_slice() {
        [dataset, table] => Ok(((*dataset).to_string(), (*table).to_string())),
        [_project, dataset, table] => Ok(((*dataset).to_string(), (*table).to_string())),
        _ => Err(Error::target_parse(trimmed)),
    }
}

/// The field set the "save custom test" collaborator requires.
///
/// Serializes snake_case — this goes to the backend API verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTestSubmission {
    pub project_id: String,
    pub dataset_id: String,
    pub test_name: String,
    pub test_category: String,
    pub severity: String,
    pub sql_query: String,
    pub description: String,
    pub target_dataset: String,
    pub target_table: String,
}

impl CustomTestSubmission {
    /// Assemble a submission from an accepted suggestion and the mapping's
    /// dotted target.
    ///
    /// Pure; the only failure is a target that will not split cleanly.
    pub fn build(project_id: &str, suggestion: &AiSuggestion, target: &str) -> Result<Self> {
        let (target_dataset, target_table) = split_target(target)?;
        let test_category = if suggestion.test_category.trim().is_empty() {
            DEFAULT_TEST_CATEGORY.to_string()
        } else {
            suggestion.test_category.clone()
        };
        Ok(Self {
            project_id: project_id.to_string(),
            dataset_id: DEFAULT_DATASET_ID.to_string(),
            test_name: suggestion.test_name.clone(),
            test_category,
            severity: suggestion.severity.clone(),
            sql_query: suggestion.sql_query.clone(),
            description: suggestion.reasoning.clone(),
            target_dataset,
            target_table,
        })
    }

    /// Override the storage dataset.
    #[must_use]
    pub fn with_dataset_id(mut self, dataset_id: impl Into<String>) -> Self {
        self.dataset_id = dataset_id.into();
        self
    }
}

/// Per-session at-most-once tracking for submitted suggestions, keyed by
/// `(mappingId, testName)`.
#[derive(Debug, Clone, Default)]
pub struct SubmissionLedger {
    submitted: BTreeSet<(String, String)>,
}

impl SubmissionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submission. Returns `false` when this pair was already
    /// recorded — the caller must not submit again.
    pub fn record(&mut self, mapping_id: &str, test_name: &str) -> bool {
        self.submitted
            .insert((mapping_id.to_string(), test_name.to_string()))
    }

    #[must_use]
    pub fn is_submitted(&self, mapping_id: &str, test_name: &str) -> bool {
        self.submitted
            .contains(&(mapping_id.to_string(), test_name.to_string()))
    }

    /// Number of recorded submissions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.submitted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.submitted.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
