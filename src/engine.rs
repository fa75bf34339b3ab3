//! The reconciliation pipeline.
//!
//! [`reconcile`] drives the full run: both raw collections parse through
//! coercion, matched pairs are found across the threshold tiers, every pair
//! is resolved field by field, unmatched records are appended to both
//! outputs, and the aligned collections are renumbered from the configured
//! start ID.

use tracing::{info, warn};

use crate::config::ReconcileConfig;
use crate::error::ReconcileError;
use crate::matcher::match_tiers;
use crate::merge::{resolve_pair, RedactionHook};
use crate::model::{Finding, ParseOutcome};
use crate::ports::DecisionPort;
use crate::renumber::renumber;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Where one output record came from and whether the merge changed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordProvenance {
    /// The record's final shared ID.
    pub id: i64,
    /// ID the record carried in the left input, when it came from there.
    pub left_source: Option<i64>,
    /// ID the record carried in the right input, when it came from there.
    pub right_source: Option<i64>,
    /// `true` when merge resolution changed at least one field on either
    /// side.
    pub updated: bool,
}

/// Summary of a reconciliation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Records parsed from the left input.
    pub left_parsed: usize,
    /// Left records discarded during parsing.
    pub left_skipped: usize,
    /// Records parsed from the right input.
    pub right_parsed: usize,
    /// Right records discarded during parsing.
    pub right_skipped: usize,
    /// Matched pairs committed across all tiers.
    pub matched: usize,
    /// Left records with no match at any tier.
    pub unmatched_left: usize,
    /// Right records with no match at any tier.
    pub unmatched_right: usize,
    /// Provenance of every output record, in output order.
    pub records: Vec<RecordProvenance>,
}

/// The two merged collections plus the run summary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReconcileOutput {
    /// The merged left collection.
    pub left: Vec<Finding>,
    /// The merged right collection, positionally aligned with `left`.
    pub right: Vec<Finding>,
    /// Run summary.
    pub report: ReconcileReport,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Parse one raw collection, counting skipped records.
fn parse_collection(
    raws: &[serde_json::Value],
    side: &str,
    config: &ReconcileConfig,
    port: &mut dyn DecisionPort,
) -> Result<(Vec<Finding>, usize), ReconcileError> {
    let mut findings = Vec::with_capacity(raws.len());
    let mut skipped = 0;

    for raw in raws {
        match Finding::from_raw(raw, config, port)? {
            ParseOutcome::Parsed(finding) => findings.push(finding),
            ParseOutcome::Skipped => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(side, skipped, "records discarded during parsing");
    }
    info!(side, parsed = findings.len(), skipped, "collection parsed");
    Ok((findings, skipped))
}

/// Reconcile two raw collections into a pair of ID-consistent outputs.
///
/// Unmatched records from either side are appended to *both* outputs, so
/// every logical finding appears in each output exactly once and shares one
/// ID across the pair.
///
/// # Errors
/// Returns [`ReconcileError::Aborted`] when the analyst aborts,
/// [`ReconcileError::InvalidInput`] on malformed records, and
/// [`ReconcileError::LengthMismatch`] if the merged collections lose
/// alignment (an internal invariant break).
pub fn reconcile(
    left_raw: &[serde_json::Value],
    right_raw: &[serde_json::Value],
    config: &ReconcileConfig,
    port: &mut dyn DecisionPort,
    redaction: Option<&RedactionHook<'_>>,
) -> Result<ReconcileOutput, ReconcileError> {
    let (left_findings, left_skipped) = parse_collection(left_raw, "left", config, port)?;
    let (right_findings, right_skipped) = parse_collection(right_raw, "right", config, port)?;

    let outcome = match_tiers(left_findings, right_findings, &config.matching);

    let mut report = ReconcileReport {
        left_parsed: outcome.matches.len() + outcome.unmatched_left.len(),
        left_skipped,
        right_parsed: outcome.matches.len() + outcome.unmatched_right.len(),
        right_skipped,
        matched: outcome.matches.len(),
        unmatched_left: outcome.unmatched_left.len(),
        unmatched_right: outcome.unmatched_right.len(),
        records: Vec::new(),
    };

    let mut merged_left = Vec::new();
    let mut merged_right = Vec::new();

    for pair in &outcome.matches {
        let (left_out, right_out) = resolve_pair(pair, config, port, redaction)?;
        report.records.push(RecordProvenance {
            id: 0,
            left_source: Some(pair.left.id),
            right_source: Some(pair.right.id),
            updated: left_out != pair.left || right_out != pair.right,
        });
        merged_left.push(left_out);
        merged_right.push(right_out);
    }

    // Unmatched records broadcast to both sides, left side's leftovers
    // first, keeping input order within each side.
    for finding in outcome.unmatched_left {
        report.records.push(RecordProvenance {
            id: 0,
            left_source: Some(finding.id),
            right_source: None,
            updated: false,
        });
        merged_right.push(finding.clone());
        merged_left.push(finding);
    }
    for finding in outcome.unmatched_right {
        report.records.push(RecordProvenance {
            id: 0,
            left_source: None,
            right_source: Some(finding.id),
            updated: false,
        });
        merged_left.push(finding.clone());
        merged_right.push(finding);
    }

    renumber(&mut merged_left, &mut merged_right, config.renumber.start_id)?;
    for (provenance, finding) in report.records.iter_mut().zip(&merged_left) {
        provenance.id = finding.id;
    }

    info!(
        matched = report.matched,
        unmatched_left = report.unmatched_left,
        unmatched_right = report.unmatched_right,
        updated = report.records.iter().filter(|r| r.updated).count(),
        output_records = merged_left.len(),
        "reconciliation complete"
    );

    Ok(ReconcileOutput {
        left: merged_left,
        right: merged_right,
        report,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
