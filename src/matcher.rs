//! Greedy bipartite matching across score thresholds.
//!
//! A single tier walks the left collection in input order and pairs each
//! record with its best-scoring unconsumed right candidate, committing the
//! pair when the score clears the tier's threshold. The multi-tier driver
//! repeats this over a descending threshold sequence, feeding only the
//! unmatched remainders forward, so confident matches are taken first and
//! no record is ever matched twice.
//!
//! Determinism: given identical inputs, weights, and threshold sequence,
//! results are fully determined. Score ties keep the earliest-encountered
//! right candidate (strict `>` comparison).

use tracing::{debug, info};

use crate::config::MatchConfig;
use crate::model::Finding;
use crate::score::score;

// ---------------------------------------------------------------------------
// MatchedPair / MatchOutcome
// ---------------------------------------------------------------------------

/// A committed correspondence between one left and one right finding.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchedPair {
    /// The left-side finding.
    pub left: Finding,
    /// The right-side finding.
    pub right: Finding,
    /// The similarity score the pair was committed at.
    pub score: f64,
}

/// Result of one matching pass (or the accumulated multi-tier run).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchOutcome {
    /// Committed pairs.
    pub matches: Vec<MatchedPair>,
    /// Left findings with no candidate at or above the threshold.
    pub unmatched_left: Vec<Finding>,
    /// Right findings never consumed by a pair.
    pub unmatched_right: Vec<Finding>,
}

// ---------------------------------------------------------------------------
// Single tier
// ---------------------------------------------------------------------------

/// Match two collections at a single threshold.
#[must_use]
pub fn match_findings(
    left: Vec<Finding>,
    right: Vec<Finding>,
    threshold: f64,
    config: &MatchConfig,
) -> MatchOutcome {
    info!(
        left = left.len(),
        right = right.len(),
        threshold,
        "matching pass"
    );

    let mut right_slots: Vec<Option<Finding>> = right.into_iter().map(Some).collect();
    let mut matches = Vec::new();
    let mut unmatched_left = Vec::new();

    for candidate in left {
        let mut best_score = 0.0_f64;
        let mut best_index = None;

        for (index, slot) in right_slots.iter().enumerate() {
            let Some(other) = slot else { continue };
            let pair_score = score(&candidate, other, config);
            // Strict comparison: a tie keeps the earliest right candidate.
            if pair_score > best_score {
                best_score = pair_score;
                best_index = Some(index);
            }
        }

        match best_index {
            Some(index) if best_score >= threshold => match right_slots[index].take() {
                Some(other) => {
                    debug!(
                        left = candidate.id,
                        right = other.id,
                        score = best_score,
                        "matched pair"
                    );
                    matches.push(MatchedPair {
                        left: candidate,
                        right: other,
                        score: best_score,
                    });
                }
                None => unmatched_left.push(candidate),
            },
            _ => {
                debug!(left = candidate.id, best_score, "no match at this tier");
                unmatched_left.push(candidate);
            }
        }
    }

    let unmatched_right: Vec<Finding> = right_slots.into_iter().flatten().collect();

    info!(
        matched = matches.len(),
        unmatched_left = unmatched_left.len(),
        unmatched_right = unmatched_right.len(),
        "matching pass complete"
    );

    MatchOutcome {
        matches,
        unmatched_left,
        unmatched_right,
    }
}

// ---------------------------------------------------------------------------
// Multi-tier driver
// ---------------------------------------------------------------------------

/// Match across the configured descending threshold sequence.
///
/// Each tier only sees the records left unmatched by the previous tier;
/// matches accumulate across tiers.
#[must_use]
pub fn match_tiers(
    mut left: Vec<Finding>,
    mut right: Vec<Finding>,
    config: &MatchConfig,
) -> MatchOutcome {
    let mut matches = Vec::new();

    for &threshold in &config.thresholds {
        let outcome = match_findings(left, right, threshold, config);
        matches.extend(outcome.matches);
        left = outcome.unmatched_left;
        right = outcome.unmatched_right;
        if left.is_empty() || right.is_empty() {
            break;
        }
    }

    MatchOutcome {
        matches,
        unmatched_left: left,
        unmatched_right: right,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
