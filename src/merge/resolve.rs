//! Deterministic auto-suggestion primitives for field merges.
//!
//! These functions compute the candidate merged value for one field of a
//! matched pair. The resolver offers the candidate to the analyst (or
//! applies it directly in non-interactive mode); nothing here consults a
//! port.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{normalize_tags, FieldSpec, FieldValue, Finding};

// ---------------------------------------------------------------------------
// Scalar conflict rule
// ---------------------------------------------------------------------------

/// Resolve a conflict between two versions of a scalar field.
///
/// Blank sides lose outright; with both sides present, the value with the
/// strictly greater whitespace-token count wins, then the strictly longer
/// rendering, then the left value.
#[must_use]
pub fn resolve_conflict(left: &FieldValue, right: &FieldValue) -> FieldValue {
    match (left.is_blank(), right.is_blank()) {
        (true, true) => FieldValue::Null,
        (true, false) => right.clone(),
        (false, true) => left.clone(),
        (false, false) => {
            let left_text = left.render();
            let right_text = right.render();
            let left_tokens = left_text.split_whitespace().count();
            let right_tokens = right_text.split_whitespace().count();

            if left_tokens > right_tokens {
                left.clone()
            } else if right_tokens > left_tokens {
                right.clone()
            } else if left_text.len() > right_text.len() {
                left.clone()
            } else if right_text.len() > left_text.len() {
                right.clone()
            } else {
                left.clone()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tags and extra fields
// ---------------------------------------------------------------------------

/// Union of normalized tag tokens from both sides, duplicates removed.
/// Sorted so the merged order is deterministic.
#[must_use]
pub fn merge_tags(left: &[String], right: &[String]) -> Vec<String> {
    let mut set = BTreeSet::new();
    set.extend(normalize_tags(left));
    set.extend(normalize_tags(right));
    set.into_iter().collect()
}

/// Key-wise merge of the open-ended scalar fields: every key present on
/// either side appears once, its value resolved by the scalar conflict
/// rule.
#[must_use]
pub fn merge_extra(
    left: &BTreeMap<String, FieldValue>,
    right: &BTreeMap<String, FieldValue>,
) -> BTreeMap<String, FieldValue> {
    let keys: BTreeSet<&String> = left.keys().chain(right.keys()).collect();
    keys.into_iter()
        .map(|key| {
            let left_value = left.get(key).unwrap_or(&FieldValue::Null);
            let right_value = right.get(key).unwrap_or(&FieldValue::Null);
            (key.clone(), resolve_conflict(left_value, right_value))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Auto-suggestion
// ---------------------------------------------------------------------------

/// Compute the auto-suggested merged value for one field of a matched pair.
#[must_use]
pub fn auto_suggest(spec: &FieldSpec, left: &Finding, right: &Finding) -> FieldValue {
    match spec.name {
        "tags" => FieldValue::List(
            merge_tags(&left.tags, &right.tags)
                .into_iter()
                .map(FieldValue::Str)
                .collect(),
        ),
        "extra_fields" => FieldValue::Map(merge_extra(&left.extra_fields, &right.extra_fields)),
        _ => resolve_conflict(&(spec.get)(left), &(spec.get)(right)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------
