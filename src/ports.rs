//! Decision and redaction ports.
//!
//! The engine never talks to a terminal directly. Every point where a human
//! (or script) must choose goes through [`DecisionPort`], and every
//! sensitive-term check goes through [`RedactionPort`]. A console
//! implementation, a scripted test double, and the non-interactive
//! [`AutoPort`] all satisfy the same contracts.

use tracing::debug;

use crate::redact::TermTable;

// ---------------------------------------------------------------------------
// Choice
// ---------------------------------------------------------------------------

/// One selectable outcome offered through [`DecisionPort::ask`].
///
/// The full set covers the three decision menus: field repair during record
/// parsing, field-level merge conflicts, and sensitive-term hits. Each call
/// site passes the subset that applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    // Field repair.
    /// Enter a corrected value and retry coercion.
    Fix,
    /// Discard the whole record being parsed.
    SkipRecord,
    /// Terminate the entire run.
    Abort,
    /// Store no value (offered only for optional fields).
    RemoveValue,

    // Merge conflicts.
    /// Left output keeps the left value, right output keeps the right value.
    KeepBoth,
    /// Both outputs take the left value.
    UseLeft,
    /// Both outputs take the right value.
    UseRight,
    /// Both outputs take the two sides joined (string fields only).
    Concatenate,
    /// Both outputs take the auto-suggested value.
    AcceptOffered,
    /// Both outputs take a blank value (optional fields only).
    Blank,

    // Redaction hits.
    /// Substitute the suggested replacement for the matched term.
    AcceptReplacement,
    /// Hand-edit the value.
    Edit,
    /// Leave the value unchanged.
    KeepAsIs,
}

impl Choice {
    /// Single-character key used by console rendering.
    #[must_use]
    pub const fn key(self) -> char {
        match self {
            Self::Fix => 'f',
            Self::SkipRecord => 's',
            Self::Abort => 'a',
            Self::RemoveValue => 'r',
            Self::KeepBoth => 'k',
            Self::UseLeft => 'l',
            Self::UseRight => 'r',
            Self::Concatenate => 'c',
            Self::AcceptOffered => 'o',
            Self::Blank => 'b',
            Self::AcceptReplacement => 'y',
            Self::Edit => 'e',
            Self::KeepAsIs => 'k',
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fix => "Fix",
            Self::SkipRecord => "Skip whole record",
            Self::Abort => "Abort",
            Self::RemoveValue => "Remove value",
            Self::KeepBoth => "Keep both",
            Self::UseLeft => "Use left",
            Self::UseRight => "Use right",
            Self::Concatenate => "Concatenate",
            Self::AcceptOffered => "Accept offered",
            Self::Blank => "Blank",
            Self::AcceptReplacement => "Accept replacement",
            Self::Edit => "Edit",
            Self::KeepAsIs => "Keep as is",
        }
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// DecisionPort
// ---------------------------------------------------------------------------

/// The interface through which the engine requests a human or scripted
/// choice.
///
/// Implementations must return one of the offered `options`. Both calls
/// block until a response is available; the only escape is returning
/// [`Choice::Abort`] where it is offered.
pub trait DecisionPort {
    /// Present `prompt` and return the selected option.
    fn ask(&mut self, prompt: &str, options: &[Choice], default: Option<Choice>) -> Choice;

    /// Obtain free text from the analyst, seeded with `seed`.
    fn edit(&mut self, seed: &str) -> String;
}

/// Non-interactive port: auto-selects the default (or the first offered
/// option) for every call and returns edit seeds unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoPort;

impl DecisionPort for AutoPort {
    fn ask(&mut self, prompt: &str, options: &[Choice], default: Option<Choice>) -> Choice {
        let chosen = default
            .or_else(|| options.first().copied())
            .unwrap_or(Choice::Abort);
        debug!(%chosen, prompt, "auto-selected default");
        chosen
    }

    fn edit(&mut self, seed: &str) -> String {
        seed.to_owned()
    }
}

// ---------------------------------------------------------------------------
// RedactionPort
// ---------------------------------------------------------------------------

/// A sensitive term found in a field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedactionHit {
    /// The matched term, lower-cased.
    pub term: String,
    /// Suggested replacement, when the term table carries one.
    pub replacement: Option<String>,
}

/// The interface through which finalized field values are scanned for
/// sensitive terms.
pub trait RedactionPort {
    /// Scan `text` against `terms`, returning every match.
    fn scan(&self, text: &str, terms: &TermTable) -> Vec<RedactionHit>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_port_prefers_default() {
        let mut port = AutoPort;
        let chosen = port.ask(
            "pick",
            &[Choice::UseLeft, Choice::AcceptOffered],
            Some(Choice::AcceptOffered),
        );
        assert_eq!(chosen, Choice::AcceptOffered);
    }

    #[test]
    fn auto_port_falls_back_to_first_option() {
        let mut port = AutoPort;
        let chosen = port.ask("pick", &[Choice::UseLeft, Choice::UseRight], None);
        assert_eq!(chosen, Choice::UseLeft);
    }

    #[test]
    fn auto_port_edit_returns_seed() {
        let mut port = AutoPort;
        assert_eq!(port.edit("seed text"), "seed text");
    }

    #[test]
    fn labels_are_distinct() {
        let all = [
            Choice::Fix,
            Choice::SkipRecord,
            Choice::Abort,
            Choice::RemoveValue,
            Choice::KeepBoth,
            Choice::UseLeft,
            Choice::UseRight,
            Choice::Concatenate,
            Choice::AcceptOffered,
            Choice::Blank,
            Choice::AcceptReplacement,
            Choice::Edit,
            Choice::KeepAsIs,
        ];
        let labels: std::collections::BTreeSet<&str> =
            all.iter().map(|c| c.label()).collect();
        assert_eq!(labels.len(), all.len());
    }
}
