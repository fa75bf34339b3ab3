//! End-to-end engine tests: coercion through matching, merge resolution,
//! and renumbering, driven without a terminal.

mod common;

use common::{raw_finding, ScriptedPort};
use findmerge::config::ReconcileConfig;
use findmerge::engine::reconcile;
use findmerge::error::ReconcileError;
use findmerge::merge::RedactionHook;
use findmerge::ports::{AutoPort, Choice};
use findmerge::redact::{SubstringScanner, TermTable};

fn auto_config() -> ReconcileConfig {
    let mut config = ReconcileConfig::default();
    config.merge.interactive = false;
    config
}

#[test]
fn near_duplicate_titles_match_at_default_threshold() {
    let config = auto_config();
    let left = vec![raw_finding(1, "SQL Injection")];
    let right = vec![raw_finding(9, "Sql injection vulnerability")];

    let out = reconcile(&left, &right, &config, &mut AutoPort, None).unwrap();

    assert_eq!(out.report.matched, 1);
    assert_eq!(out.left[0].id, out.right[0].id);
}

#[test]
fn matched_identical_records_need_no_decisions() {
    let mut config = ReconcileConfig::default();
    config.merge.interactive = true;
    let doc = vec![raw_finding(1, "SQL Injection"), raw_finding(2, "Stored XSS")];

    // An empty script: any prompt would panic.
    let mut port = ScriptedPort::new(vec![]);
    let out = reconcile(&doc, &doc, &config, &mut port, None).unwrap();

    assert_eq!(out.report.matched, 2);
    assert!(port.exhausted());
    assert_eq!(out.left, out.right);
}

#[test]
fn outputs_stay_positionally_aligned_with_shared_ids() {
    let config = auto_config();
    let left = vec![
        raw_finding(10, "SQL Injection"),
        raw_finding(11, "Path Traversal"),
        raw_finding(12, "Open Redirect"),
    ];
    let right = vec![
        raw_finding(20, "Open Redirect"),
        raw_finding(21, "SQL Injection"),
        raw_finding(22, "Weak TLS Ciphers"),
    ];

    let out = reconcile(&left, &right, &config, &mut AutoPort, None).unwrap();

    assert_eq!(out.left.len(), out.right.len());
    for (position, (l, r)) in out.left.iter().zip(&out.right).enumerate() {
        assert_eq!(l.id, r.id, "position {position}");
        assert_eq!(l.title, r.title, "position {position}");
    }
    let ids: Vec<i64> = out.left.iter().map(|f| f.id).collect();
    let expected: Vec<i64> = (1..=out.left.len() as i64).collect();
    assert_eq!(ids, expected);
}

#[test]
fn unmatched_record_broadcasts_unchanged_to_both_outputs() {
    let config = auto_config();
    let left = vec![raw_finding(1, "SQL Injection")];
    let mut lonely = raw_finding(2, "Kerberoastable Service Accounts");
    lonely["description"] = serde_json::json!("service tickets can be cracked offline");
    let right = vec![raw_finding(7, "SQL Injection"), lonely];

    let out = reconcile(&left, &right, &config, &mut AutoPort, None).unwrap();

    assert_eq!(out.left.len(), 2);
    let position = out
        .left
        .iter()
        .position(|f| f.title.as_deref() == Some("Kerberoastable Service Accounts"))
        .unwrap();
    assert_eq!(out.left[position], out.right[position]);
    assert_eq!(
        out.left[position].description.as_deref(),
        Some("service tickets can be cracked offline")
    );
}

#[test]
fn tags_union_across_matched_pair() {
    let config = auto_config();
    let mut left = raw_finding(1, "SQL Injection");
    left["tags"] = serde_json::json!(["SQLi", "Injection"]);
    let mut right = raw_finding(2, "SQL Injection");
    right["tags"] = serde_json::json!(["sqli", "XSS"]);

    let out = reconcile(&[left], &[right], &config, &mut AutoPort, None).unwrap();

    assert_eq!(out.left[0].tags, vec!["injection", "sqli", "xss"]);
    assert_eq!(out.left[0].tags, out.right[0].tags);
}

#[test]
fn malformed_field_repaired_through_the_port() {
    let mut config = ReconcileConfig::default();
    config.merge.interactive = true;
    let mut broken = raw_finding(1, "SQL Injection");
    broken["cvss_score"] = serde_json::json!("critical");

    // Fix the score during parsing, then resolve the resulting 9.8 vs 7.5
    // conflict by accepting the offered value.
    let mut port =
        ScriptedPort::with_edits(vec![Choice::Fix, Choice::AcceptOffered], vec!["9.8"]);
    let out = reconcile(
        &[broken],
        &[raw_finding(2, "SQL Injection")],
        &config,
        &mut port,
        None,
    )
    .unwrap();

    assert!(port.exhausted());
    assert_eq!(out.report.matched, 1);
    assert_eq!(out.left[0].cvss_score, Some(9.8));
    assert_eq!(out.right[0].cvss_score, Some(9.8));
}

#[test]
fn skipping_a_broken_record_drops_only_that_record() {
    let mut config = ReconcileConfig::default();
    config.merge.interactive = true;
    let mut broken = raw_finding(1, "SQL Injection");
    broken["cvss_score"] = serde_json::json!("n/a");

    let mut port = ScriptedPort::new(vec![Choice::SkipRecord]);
    let out = reconcile(
        &[broken, raw_finding(2, "Stored XSS")],
        &[raw_finding(3, "Stored XSS")],
        &config,
        &mut port,
        None,
    )
    .unwrap();

    assert_eq!(out.report.left_skipped, 1);
    assert_eq!(out.report.matched, 1);
    assert_eq!(out.left.len(), 1);
    assert_eq!(out.left[0].title.as_deref(), Some("Stored XSS"));
}

#[test]
fn abort_during_repair_terminates_the_run() {
    let mut config = ReconcileConfig::default();
    config.merge.interactive = true;
    let mut broken = raw_finding(1, "SQL Injection");
    broken["cvss_score"] = serde_json::json!("n/a");

    let mut port = ScriptedPort::new(vec![Choice::Abort]);
    let err = reconcile(&[broken], &[], &config, &mut port, None).unwrap_err();
    assert!(matches!(err, ReconcileError::Aborted { .. }));
}

#[test]
fn abort_during_conflict_terminates_the_run() {
    let mut config = ReconcileConfig::default();
    config.merge.interactive = true;
    let left = raw_finding(1, "SQL Injection");
    let mut right = raw_finding(2, "SQL Injection");
    right["impact"] = serde_json::json!("full database compromise");

    let mut port = ScriptedPort::new(vec![Choice::Abort]);
    let err = reconcile(&[left], &[right], &config, &mut port, None).unwrap_err();
    assert!(matches!(err, ReconcileError::Aborted { .. }));
}

#[test]
fn conflict_decisions_apply_to_both_outputs() {
    let mut config = ReconcileConfig::default();
    config.merge.interactive = true;
    let left = raw_finding(1, "SQL Injection");
    let mut right = raw_finding(2, "SQL Injection");
    right["mitigation"] = serde_json::json!("deploy a web application firewall");

    let mut port = ScriptedPort::new(vec![Choice::UseLeft]);
    let out = reconcile(&[left], &[right], &config, &mut port, None).unwrap();

    assert!(port.exhausted());
    assert_eq!(
        out.left[0].mitigation.as_deref(),
        Some("validate and encode all input")
    );
    assert_eq!(out.left[0].mitigation, out.right[0].mitigation);
}

#[test]
fn invalid_severity_excludes_the_record_from_all_downstream_steps() {
    let config = auto_config();
    let mut bad = raw_finding(1, "SQL Injection");
    bad["severity"] = serde_json::json!("Sev1");

    let out = reconcile(
        &[bad],
        &[raw_finding(2, "SQL Injection")],
        &config,
        &mut AutoPort,
        None,
    )
    .unwrap();

    assert_eq!(out.report.left_skipped, 1);
    assert_eq!(out.report.matched, 0);
    assert_eq!(out.left.len(), 1);
}

#[test]
fn redaction_rewrites_finalized_fields_on_both_sides() {
    let config = auto_config();
    let mut left = raw_finding(1, "SQL Injection");
    left["description"] = serde_json::json!("the host acme-prod-db leaked records");
    let mut right = raw_finding(2, "SQL Injection");
    right["description"] = serde_json::json!("the host acme-prod-db leaked records");

    let terms = TermTable::parse("acme-prod-db => <redacted-host>\n");
    let scanner = SubstringScanner;
    let hook = RedactionHook {
        port: &scanner,
        terms: &terms,
    };

    let out = reconcile(&[left], &[right], &config, &mut AutoPort, Some(&hook)).unwrap();

    assert_eq!(
        out.left[0].description.as_deref(),
        Some("the host <redacted-host> leaked records")
    );
    assert_eq!(out.left[0].description, out.right[0].description);
}

#[test]
fn serialized_outputs_round_trip_through_parsing() {
    let config = auto_config();
    let left = vec![raw_finding(1, "SQL Injection"), raw_finding(2, "Stored XSS")];
    let right = vec![raw_finding(3, "Stored XSS")];

    let out = reconcile(&left, &right, &config, &mut AutoPort, None).unwrap();
    let reserialized: Vec<serde_json::Value> =
        out.left.iter().map(findmerge::Finding::to_raw).collect();

    // Feeding the output back through the engine parses every record
    // cleanly and changes nothing.
    let again = reconcile(&reserialized, &reserialized, &config, &mut AutoPort, None).unwrap();
    assert_eq!(again.report.left_skipped, 0);
    assert_eq!(again.report.matched, out.left.len());
    assert!(again.report.records.iter().all(|r| !r.updated));
}
