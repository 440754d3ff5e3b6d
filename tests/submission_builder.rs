//! Integration tests for custom test submission assembly.
//!
//! Covers:
//! - Target splitting: positional two-part, project-prefixed three-part,
//!   and the refuse-to-guess cases
//! - Field mapping from an accepted suggestion to the backend contract
//! - The serialized wire shape (snake_case, exact key set)
//! - At-most-once submission tracking

mod common;

use dataqa_report::Error;
use dataqa_report::model::AiSuggestion;
use dataqa_report::submission::{
    CustomTestSubmission, DEFAULT_DATASET_ID, SubmissionLedger, split_target,
};

fn suggestion() -> AiSuggestion {
    AiSuggestion {
        test_name: "Duplicate order ids".to_string(),
        test_category: "integrity".to_string(),
        severity: "MEDIUM".to_string(),
        sql_query: "SELECT order_id FROM analytics.orders GROUP BY 1 HAVING COUNT(*) > 1"
            .to_string(),
        reasoning: "Orders loaded twice in the last backfill".to_string(),
    }
}

// =============================================================================
// Target splitting
// =============================================================================

#[test]
fn two_part_targets_split_positionally() {
    let (dataset, table) = split_target("analytics.orders").expect("two parts");
    assert_eq!(dataset, "analytics");
    assert_eq!(table, "orders");
}

#[test]
fn three_part_targets_drop_the_project_segment() {
    let (dataset, table) = split_target("acme-prod.analytics.orders").expect("three parts");
    assert_eq!(dataset, "analytics");
    assert_eq!(table, "orders");
}

#[test]
fn surrounding_whitespace_is_tolerated() {
    let (dataset, table) = split_target("  analytics.orders  ").expect("padded");
    assert_eq!(dataset, "analytics");
    assert_eq!(table, "orders");
}

#[test]
fn unguessable_targets_are_refused() {
    for target in ["orders", "", "a.b.c.d", "analytics..orders", ".orders", "analytics."] {
        let err = split_target(target).expect_err(target);
        assert!(
            matches!(err, Error::TargetParse { .. }),
            "{target}: {err}"
        );
        assert!(err.to_string().contains("Cannot split target"));
    }
}

// =============================================================================
// Field assembly
// =============================================================================

#[test]
fn build_maps_every_suggestion_field() {
    let built =
        CustomTestSubmission::build("acme-dw", &suggestion(), "analytics.orders").expect("build");
    assert_eq!(built.project_id, "acme-dw");
    assert_eq!(built.dataset_id, DEFAULT_DATASET_ID);
    assert_eq!(built.test_name, "Duplicate order ids");
    assert_eq!(built.test_category, "integrity");
    assert_eq!(built.severity, "MEDIUM");
    assert_eq!(built.description, "Orders loaded twice in the last backfill");
    assert_eq!(built.target_dataset, "analytics");
    assert_eq!(built.target_table, "orders");
}

#[test]
fn blank_category_falls_back_to_custom() {
    let mut s = suggestion();
    s.test_category = "   ".to_string();
    let built = CustomTestSubmission::build("acme-dw", &s, "analytics.orders").expect("build");
    assert_eq!(built.test_category, "custom");
}

#[test]
fn bad_target_is_the_only_failure() {
    let err = CustomTestSubmission::build("acme-dw", &suggestion(), "orders")
        .expect_err("unsplittable target");
    assert!(matches!(err, Error::TargetParse { .. }));
}

#[test]
fn dataset_id_can_be_overridden() {
    let built = CustomTestSubmission::build("acme-dw", &suggestion(), "analytics.orders")
        .expect("build")
        .with_dataset_id("staging_config");
    assert_eq!(built.dataset_id, "staging_config");
}

#[test]
fn wire_shape_is_snake_case_with_the_exact_key_set() {
    let built =
        CustomTestSubmission::build("acme-dw", &suggestion(), "analytics.orders").expect("build");
    let value = serde_json::to_value(&built).expect("serialize");
    let obj = value.as_object().expect("object");

    let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        [
            "dataset_id",
            "description",
            "project_id",
            "severity",
            "sql_query",
            "target_dataset",
            "target_table",
            "test_category",
            "test_name"
        ]
    );
    assert_eq!(obj["sql_query"], suggestion().sql_query.as_str());
}

// =============================================================================
// At-most-once ledger
// =============================================================================

#[test]
fn ledger_accepts_each_pair_once() {
    let mut ledger = SubmissionLedger::new();
    assert!(ledger.record("orders_mapping", "Duplicate order ids"));
    assert!(!ledger.record("orders_mapping", "Duplicate order ids"));
    assert!(ledger.is_submitted("orders_mapping", "Duplicate order ids"));
    assert_eq!(ledger.len(), 1);
}

#[test]
fn ledger_keys_by_mapping_and_test_name() {
    let mut ledger = SubmissionLedger::new();
    assert!(ledger.record("orders_mapping", "Duplicate order ids"));
    assert!(ledger.record("refunds_mapping", "Duplicate order ids"));
    assert!(ledger.record("orders_mapping", "Null Keys"));
    assert!(!ledger.is_submitted("refunds_mapping", "Null Keys"));
    assert_eq!(ledger.len(), 3);
}

#[test]
fn resubmission_flow_skips_recorded_pairs() {
    // The per-mapping accept-all flow: only unrecorded suggestions go out.
    let accepted = ["s1", "s2", "s3"];
    let mut ledger = SubmissionLedger::new();
    ledger.record("m1", "s2");

    let to_submit: Vec<&str> = accepted
        .iter()
        .copied()
        .filter(|name| ledger.record("m1", name))
        .collect();
    assert_eq!(to_submit, ["s1", "s3"]);
    assert_eq!(ledger.len(), 3);
}
