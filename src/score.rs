//! Weighted similarity scoring between two findings.
//!
//! Produces a 0-100 score from per-field components: a token-set fuzzy
//! ratio for the free-text fields and exact equality for the finding type.
//! Title similarity gates the rest: when the raw title ratio falls below the
//! configured minimum, no other field is compared and only the weighted
//! title contribution is returned.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::MatchConfig;
use crate::model::Finding;

// ---------------------------------------------------------------------------
// Token-set ratio
// ---------------------------------------------------------------------------

/// Order-insensitive fuzzy similarity between two strings, 0-100.
///
/// Tokenizes on non-alphanumeric characters, lower-cased, then compares the
/// sorted token intersection against each side's full sorted token set and
/// takes the best pairwise ratio. Word order and repeated words do not
/// affect the result; a string whose tokens are a subset of the other's
/// scores 100.
#[must_use]
pub fn token_set_ratio(left: &str, right: &str) -> f64 {
    let left_tokens = tokenize(left);
    let right_tokens = tokenize(right);

    match (left_tokens.is_empty(), right_tokens.is_empty()) {
        (true, true) => return 100.0,
        (true, false) | (false, true) => return 0.0,
        (false, false) => {}
    }

    let intersection: Vec<&str> = left_tokens
        .intersection(&right_tokens)
        .map(String::as_str)
        .collect();
    let left_only: Vec<&str> = left_tokens
        .difference(&right_tokens)
        .map(String::as_str)
        .collect();
    let right_only: Vec<&str> = right_tokens
        .difference(&left_tokens)
        .map(String::as_str)
        .collect();

    let base = intersection.join(" ");
    let combined_left = join_parts(&base, &left_only);
    let combined_right = join_parts(&base, &right_only);

    let ratio = strsim::normalized_levenshtein(&base, &combined_left)
        .max(strsim::normalized_levenshtein(&base, &combined_right))
        .max(strsim::normalized_levenshtein(
            &combined_left,
            &combined_right,
        ));

    ratio * 100.0
}

fn tokenize(s: &str) -> BTreeSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

fn join_parts(base: &str, rest: &[&str]) -> String {
    if rest.is_empty() {
        base.to_owned()
    } else if base.is_empty() {
        rest.join(" ")
    } else {
        format!("{base} {}", rest.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Weighted scoring
// ---------------------------------------------------------------------------

struct Weights {
    title: f64,
    finding_type: f64,
    description: f64,
    impact: f64,
    mitigation: f64,
}

impl Weights {
    /// Read weights from config, normalizing to sum to 1 only when the raw
    /// sum exceeds 1. A deliberately under-weighted profile stays as is.
    fn from_config(config: &MatchConfig) -> Self {
        let raw = Self {
            title: config.weight_title,
            finding_type: config.weight_finding_type,
            description: config.weight_description,
            impact: config.weight_impact,
            mitigation: config.weight_mitigation,
        };
        let total =
            raw.title + raw.finding_type + raw.description + raw.impact + raw.mitigation;
        if total > 1.0 {
            Self {
                title: raw.title / total,
                finding_type: raw.finding_type / total,
                description: raw.description / total,
                impact: raw.impact / total,
                mitigation: raw.mitigation / total,
            }
        } else {
            raw
        }
    }
}

/// Compute the weighted similarity score between two findings, 0-100.
#[must_use]
pub fn score(left: &Finding, right: &Finding, config: &MatchConfig) -> f64 {
    let weights = Weights::from_config(config);

    let title_raw = token_set_ratio(
        left.title.as_deref().unwrap_or(""),
        right.title.as_deref().unwrap_or(""),
    );
    let title_score = title_raw * weights.title;
    if title_raw < config.min_title_score {
        debug!(
            left = left.id,
            right = right.id,
            title_raw,
            "title below minimum, skipping remaining components"
        );
        return title_score;
    }

    let type_score = match (&left.finding_type, &right.finding_type) {
        (Some(a), Some(b)) if a == b => 100.0 * weights.finding_type,
        _ => 0.0,
    };

    let combined = title_score
        + type_score
        + text_component(&left.description, &right.description, weights.description)
        + text_component(&left.impact, &right.impact, weights.impact)
        + text_component(&left.mitigation, &right.mitigation, weights.mitigation);

    debug!(
        left = left.id,
        right = right.id,
        combined,
        "scored finding pair"
    );
    combined
}

/// Weighted token-set component; zero unless both sides are non-empty.
fn text_component(left: &Option<String>, right: &Option<String>, weight: f64) -> f64 {
    match (left, right) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => token_set_ratio(a, b) * weight,
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
