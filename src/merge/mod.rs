//! Field-level merge resolution for matched pairs.
//!
//! For every field of a matched pair the resolver computes a deterministic
//! auto-suggestion ([`resolve::auto_suggest`]), applies it directly when the
//! two sides already agree, and otherwise routes the conflict through the
//! decision port. Finalized string values optionally pass through the
//! redaction hook before being committed to both output records.

pub mod resolve;

use tracing::{debug, warn};

use crate::config::ReconcileConfig;
use crate::error::ReconcileError;
use crate::matcher::MatchedPair;
use crate::model::{merge_fields, FieldSpec, FieldValue, Finding};
use crate::ports::{Choice, DecisionPort, RedactionPort};
use crate::redact::{replace_term, TermTable};

pub use resolve::{auto_suggest, merge_extra, merge_tags, resolve_conflict};

// ---------------------------------------------------------------------------
// RedactionHook
// ---------------------------------------------------------------------------

/// The scanner and term table used for the post-merge redaction pass.
pub struct RedactionHook<'a> {
    /// The scanning implementation.
    pub port: &'a dyn RedactionPort,
    /// Loaded sensitive terms.
    pub terms: &'a TermTable,
}

// ---------------------------------------------------------------------------
// Pair resolution
// ---------------------------------------------------------------------------

/// Resolve one matched pair into its two output records.
///
/// Both outputs start as copies of their input sides; every merge field is
/// then overwritten according to the fast path, the analyst's decision, or
/// the auto-suggestion (non-interactive mode). `id` is left untouched for
/// the renumberer.
///
/// # Errors
/// Returns [`ReconcileError::Aborted`] when the analyst aborts a conflict
/// decision.
pub fn resolve_pair(
    pair: &MatchedPair,
    config: &ReconcileConfig,
    port: &mut dyn DecisionPort,
    redaction: Option<&RedactionHook<'_>>,
) -> Result<(Finding, Finding), ReconcileError> {
    let mut left_out = pair.left.clone();
    let mut right_out = pair.right.clone();

    for spec in merge_fields() {
        let left_value = (spec.get)(&pair.left);
        let right_value = (spec.get)(&pair.right);
        let offered = auto_suggest(spec, &pair.left, &pair.right);

        if left_value == right_value {
            // Fast path: agreement. The offered value still lands on both
            // sides so normalization (tag casing, key order) applies.
            (spec.set)(&mut left_out, offered.clone());
            (spec.set)(&mut right_out, offered);
        } else if config.merge.interactive {
            apply_decision(
                spec,
                decide_field(spec, &left_value, &right_value, &offered, port)?,
                &left_value,
                &right_value,
                offered,
                &mut left_out,
                &mut right_out,
            );
        } else {
            debug!(
                field = spec.name,
                "non-interactive: offered value applied"
            );
            (spec.set)(&mut left_out, offered.clone());
            (spec.set)(&mut right_out, offered);
        }

        if let Some(hook) = redaction {
            redact_field(spec, &mut left_out, config, port, hook);
            redact_field(spec, &mut right_out, config, port, hook);
        }
    }

    Ok((left_out, right_out))
}

/// The analyst's resolution for one conflicted field.
enum FieldDecision {
    KeepBoth,
    Left,
    Right,
    Offered,
    Concatenated,
    Blank,
}

/// Present a conflicted field and translate the chosen option.
fn decide_field(
    spec: &FieldSpec,
    left_value: &FieldValue,
    right_value: &FieldValue,
    offered: &FieldValue,
    port: &mut dyn DecisionPort,
) -> Result<FieldDecision, ReconcileError> {
    let both_strings = matches!(
        (left_value, right_value),
        (FieldValue::Str(_), FieldValue::Str(_))
    );

    let mut options = vec![Choice::KeepBoth, Choice::UseLeft, Choice::UseRight];
    if both_strings {
        options.push(Choice::Concatenate);
    }
    options.push(Choice::AcceptOffered);
    if spec.is_optional() {
        options.push(Choice::Blank);
    }
    options.push(Choice::Abort);

    let prompt = format!(
        "conflict in '{}'\n  left:    {}\n  right:   {}\n  offered: {}",
        spec.name,
        left_value.render(),
        right_value.render(),
        offered.render(),
    );

    match port.ask(&prompt, &options, Some(Choice::AcceptOffered)) {
        Choice::KeepBoth => Ok(FieldDecision::KeepBoth),
        Choice::UseLeft => Ok(FieldDecision::Left),
        Choice::UseRight => Ok(FieldDecision::Right),
        Choice::Concatenate => Ok(FieldDecision::Concatenated),
        Choice::Blank => Ok(FieldDecision::Blank),
        Choice::Abort => Err(ReconcileError::Aborted {
            context: format!("conflict decision for '{}'", spec.name),
        }),
        _ => Ok(FieldDecision::Offered),
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_decision(
    spec: &FieldSpec,
    decision: FieldDecision,
    left_value: &FieldValue,
    right_value: &FieldValue,
    offered: FieldValue,
    left_out: &mut Finding,
    right_out: &mut Finding,
) {
    let write_both = |left_out: &mut Finding, right_out: &mut Finding, value: FieldValue| {
        (spec.set)(left_out, value.clone());
        (spec.set)(right_out, value);
    };

    match decision {
        FieldDecision::KeepBoth => {
            (spec.set)(left_out, left_value.clone());
            (spec.set)(right_out, right_value.clone());
        }
        FieldDecision::Left => write_both(left_out, right_out, left_value.clone()),
        FieldDecision::Right => write_both(left_out, right_out, right_value.clone()),
        FieldDecision::Offered => write_both(left_out, right_out, offered),
        FieldDecision::Concatenated => {
            let joined = format!("{}\n\n{}", left_value.render(), right_value.render());
            write_both(left_out, right_out, FieldValue::Str(joined));
        }
        FieldDecision::Blank => write_both(left_out, right_out, FieldValue::Null),
    }
}

// ---------------------------------------------------------------------------
// Redaction hook
// ---------------------------------------------------------------------------

/// Scan a finalized string field for sensitive terms and apply the chosen
/// treatment for each hit.
fn redact_field(
    spec: &FieldSpec,
    finding: &mut Finding,
    config: &ReconcileConfig,
    port: &mut dyn DecisionPort,
    hook: &RedactionHook<'_>,
) {
    let FieldValue::Str(mut text) = (spec.get)(finding) else {
        return;
    };
    if text.is_empty() {
        return;
    }

    let hits = hook.port.scan(&text, hook.terms);
    if hits.is_empty() {
        return;
    }

    for hit in hits {
        if config.merge.interactive {
            let mut options = Vec::new();
            if hit.replacement.is_some() {
                options.push(Choice::AcceptReplacement);
            }
            options.push(Choice::Edit);
            options.push(Choice::KeepAsIs);
            let default = if hit.replacement.is_some() {
                Choice::AcceptReplacement
            } else {
                Choice::KeepAsIs
            };

            let prompt = match &hit.replacement {
                Some(replacement) => format!(
                    "sensitive term \"{}\" in '{}': offered replacement \"{replacement}\"",
                    hit.term, spec.name
                ),
                None => format!("sensitive term \"{}\" in '{}'", hit.term, spec.name),
            };

            match port.ask(&prompt, &options, Some(default)) {
                Choice::AcceptReplacement => {
                    if let Some(replacement) = &hit.replacement {
                        text = replace_term(&text, &hit.term, replacement);
                    }
                }
                Choice::Edit => text = port.edit(&text),
                _ => {}
            }
        } else if let Some(replacement) = &hit.replacement {
            warn!(
                term = %hit.term,
                field = spec.name,
                "redacting sensitive term (non-interactive)"
            );
            text = replace_term(&text, &hit.term, replacement);
        } else {
            warn!(
                term = %hit.term,
                field = spec.name,
                "sensitive term left in place (non-interactive, no replacement)"
            );
        }
    }

    (spec.set)(finding, FieldValue::Str(text));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
