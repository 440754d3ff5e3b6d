//! Status tallying and summary reconciliation.
//!
//! Embedded summary blocks from upstream have been observed stale, zeroed,
//! and absent, and different call sites used to trust them to different
//! degrees. This module is the one reconciliation policy: counts are always
//! rederived from the actual result rows; the embedded block contributes
//! only the fields that cannot be recomputed (`executedBy`,
//! `totalSuggestions`).

use tracing::warn;

use crate::model::{Report, Summary, TestOutcome, TestResult};

// ============================================================================
// Status counting
// ============================================================================

/// Tally of test outcomes across one result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub passed: i64,
    pub failed: i64,
    pub errors: i64,
}

impl StatusCounts {
    /// Total number of counted results.
    #[must_use]
    pub const fn total(self) -> i64 {
        self.passed + self.failed + self.errors
    }
}

/// Tally results by status.
///
/// Rows whose status was coerced from an unrecognized value enter here as
/// [`TestOutcome::Error`] and are counted under `errors` — nothing is ever
/// dropped from the totals.
pub fn count<'a, I>(results: I) -> StatusCounts
where
    I: IntoIterator<Item = &'a TestResult>,
{
    let mut counts = StatusCounts::default();
    for result in results {
        match result.status {
            TestOutcome::Pass => counts.passed += 1,
            TestOutcome::Fail => counts.failed += 1,
            TestOutcome::Error => counts.errors += 1,
        }
    }
    counts
}

/// Rollup status for a whole run: any error makes the run `ERROR`, else any
/// failure makes it `FAIL`, else `PASS`. This is the badge shown on history
/// rows.
pub fn overall_status<'a, I>(results: I) -> TestOutcome
where
    I: IntoIterator<Item = &'a TestResult>,
{
    let counts = count(results);
    if counts.errors > 0 {
        TestOutcome::Error
    } else if counts.failed > 0 {
        TestOutcome::Fail
    } else {
        TestOutcome::Pass
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// A summary block as found embedded in a payload: every field optional,
/// none trusted for counting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedSummary {
    pub total_mappings: Option<i64>,
    pub total_tests: Option<i64>,
    pub passed: Option<i64>,
    pub failed: Option<i64>,
    pub errors: Option<i64>,
    pub total_suggestions: Option<i64>,
    pub executed_by: Option<String>,
}

impl EmbeddedSummary {
    /// Field-wise merge: `self` wins, `fallback` fills the gaps.
    #[must_use]
    pub fn merged_over(&self, fallback: &Self) -> Self {
        Self {
            total_mappings: self.total_mappings.or(fallback.total_mappings),
            total_tests: self.total_tests.or(fallback.total_tests),
            passed: self.passed.or(fallback.passed),
            failed: self.failed.or(fallback.failed),
            errors: self.errors.or(fallback.errors),
            total_suggestions: self.total_suggestions.or(fallback.total_suggestions),
            executed_by: self
                .executed_by
                .clone()
                .or_else(|| fallback.executed_by.clone()),
        }
    }

    /// Whether the block carries anything at all.
    #[must_use]
    pub const fn is_vacant(&self) -> bool {
        self.total_mappings.is_none()
            && self.total_tests.is_none()
            && self.passed.is_none()
            && self.failed.is_none()
            && self.errors.is_none()
            && self.total_suggestions.is_none()
            && self.executed_by.is_none()
    }
}

/// Produce the authoritative summary for a report skeleton.
///
/// Policy, in order:
/// 1. counts (`totalTests`, `passed`, `failed`, `errors`) come from tallying
///    the report's actual rows, never from the embedded block;
/// 2. a positive embedded `totalTests` that disagrees with the computed
///    total is logged and overridden;
/// 3. `totalMappings` is the mapping count in multi-mapping mode, 1 in
///    single mode, embedded value ignored;
/// 4. `executedBy` and `totalSuggestions` are copied verbatim from the
///    embedded block when present.
///
/// Post-condition: `total_tests == passed + failed + errors`.
#[must_use]
pub fn reconcile(embedded: Option<&EmbeddedSummary>, report: &Report) -> Summary {
    let counts = count(report.all_results());

    if let Some(block) = embedded {
        if let Some(claimed) = block.total_tests {
            if claimed > 0 && claimed != counts.total() {
                warn!(
                    claimed,
                    computed = counts.total(),
                    "embedded summary disagrees with computed counts; using computed"
                );
            }
        }
    }

    let total_mappings = if report.mode.is_multi() {
        report.mapping_results.len() as i64
    } else {
        1
    };

    Summary {
        total_mappings,
        total_tests: counts.total(),
        passed: counts.passed,
        failed: counts.failed,
        errors: counts.errors,
        total_suggestions: embedded.and_then(|block| block.total_suggestions),
        executed_by: embedded.and_then(|block| block.executed_by.clone()),
    }
}

// ============================================================================
// Tests
// ============================================================================
