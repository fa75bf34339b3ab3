//! Sensitive-term table loading and the substring scanner.
//!
//! The term file is line-oriented: `term => replacement` suggests a
//! substitution, a bare `term` only flags the match. Blank lines and lines
//! starting with `#` are skipped. Terms are matched case-insensitively.

use std::path::Path;

use tracing::{debug, info};

use crate::ports::{RedactionHit, RedactionPort};

// ---------------------------------------------------------------------------
// TermTable
// ---------------------------------------------------------------------------

/// One loaded term with its optional suggested replacement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermEntry {
    /// The sensitive term, lower-cased.
    pub term: String,
    /// Replacement to offer when the term is found.
    pub replacement: Option<String>,
}

/// The loaded sensitive-term table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TermTable {
    entries: Vec<TermEntry>,
}

impl TermTable {
    /// Parse a term table from file contents.
    #[must_use]
    pub fn parse(contents: &str) -> Self {
        let mut entries = Vec::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let entry = match line.split_once("=>") {
                Some((term, replacement)) => TermEntry {
                    term: term.trim().to_lowercase(),
                    replacement: Some(replacement.trim().to_owned()),
                },
                None => TermEntry {
                    term: line.to_lowercase(),
                    replacement: None,
                },
            };
            if !entry.term.is_empty() {
                entries.push(entry);
            }
        }
        info!(terms = entries.len(), "loaded sensitive terms");
        Self { entries }
    }

    /// Load a term table from a file.
    ///
    /// # Errors
    /// Returns the underlying I/O error when the file cannot be read.
    pub fn load(path: &Path) -> Result<Self, std::io::Error> {
        debug!(path = %path.display(), "reading sensitive terms file");
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    /// The loaded entries, in file order.
    #[must_use]
    pub fn entries(&self) -> &[TermEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SubstringScanner
// ---------------------------------------------------------------------------

/// Case-insensitive substring scanner over the term table.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubstringScanner;

impl RedactionPort for SubstringScanner {
    fn scan(&self, text: &str, terms: &TermTable) -> Vec<RedactionHit> {
        let lowered = text.to_lowercase();
        terms
            .entries()
            .iter()
            .filter(|entry| lowered.contains(&entry.term))
            .map(|entry| RedactionHit {
                term: entry.term.clone(),
                replacement: entry.replacement.clone(),
            })
            .collect()
    }
}

/// Replace every case-insensitive occurrence of `term` in `text`.
///
/// The non-matching portions keep their original casing.
#[must_use]
pub fn replace_term(text: &str, term: &str, replacement: &str) -> String {
    if term.is_empty() {
        return text.to_owned();
    }
    let lowered = text.to_lowercase();
    let needle = term.to_lowercase();

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(found) = lowered[cursor..].find(&needle) {
        let start = cursor + found;
        out.push_str(&text[cursor..start]);
        out.push_str(replacement);
        cursor = start + needle.len();
    }
    out.push_str(&text[cursor..]);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_replacement_and_flag_lines() {
        let table = TermTable::parse(
            "# internal hosts\nacme-prod-db => <redacted-host>\n\nalice\n",
        );
        assert_eq!(
            table.entries(),
            &[
                TermEntry {
                    term: "acme-prod-db".to_owned(),
                    replacement: Some("<redacted-host>".to_owned()),
                },
                TermEntry {
                    term: "alice".to_owned(),
                    replacement: None,
                },
            ]
        );
    }

    #[test]
    fn parse_lowercases_terms_but_not_replacements() {
        let table = TermTable::parse("ACME-Prod-DB => DB-Host-01\n");
        assert_eq!(table.entries()[0].term, "acme-prod-db");
        assert_eq!(
            table.entries()[0].replacement.as_deref(),
            Some("DB-Host-01")
        );
    }

    #[test]
    fn parse_empty_input_is_empty_table() {
        assert!(TermTable::parse("").is_empty());
        assert!(TermTable::parse("# only a comment\n\n").is_empty());
    }

    #[test]
    fn scan_matches_case_insensitively() {
        let table = TermTable::parse("acme-prod-db => <redacted-host>\n");
        let hits = SubstringScanner.scan("Host ACME-PROD-DB was reachable", &table);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].term, "acme-prod-db");
        assert_eq!(hits[0].replacement.as_deref(), Some("<redacted-host>"));
    }

    #[test]
    fn scan_misses_cleanly() {
        let table = TermTable::parse("alice\n");
        assert!(SubstringScanner.scan("no names here", &table).is_empty());
    }

    #[test]
    fn scan_reports_every_matching_term() {
        let table = TermTable::parse("alice\nbob => <analyst>\n");
        let hits = SubstringScanner.scan("alice asked bob", &table);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn replace_term_covers_all_occurrences() {
        let out = replace_term("Alice met alice and ALICE", "alice", "<name>");
        assert_eq!(out, "<name> met <name> and <name>");
    }

    #[test]
    fn replace_term_keeps_surrounding_text() {
        let out = replace_term(
            "host acme-prod-db was accessed",
            "acme-prod-db",
            "<redacted-host>",
        );
        assert_eq!(out, "host <redacted-host> was accessed");
    }

    #[test]
    fn replace_empty_term_is_identity() {
        assert_eq!(replace_term("unchanged", "", "x"), "unchanged");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.txt");
        std::fs::write(&path, "alice => <analyst>\n").unwrap();
        let table = TermTable::load(&path).unwrap();
        assert_eq!(table.entries().len(), 1);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(TermTable::load(Path::new("/nonexistent/terms.txt")).is_err());
    }
}
