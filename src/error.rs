//! Unified error type for reconciliation runs.
//!
//! Defines [`ReconcileError`], the error surface of the engine. Coercion
//! failures and record skips are not errors: they are handled through the
//! repair loop and [`ParseOutcome`](crate::model::ParseOutcome). Everything
//! here terminates the run, and each variant's message says what happened
//! and what to do next.

use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// ReconcileError
// ---------------------------------------------------------------------------

/// Fatal error for a reconciliation run. No partial output is written once
/// one of these propagates.
#[derive(Debug)]
pub enum ReconcileError {
    /// The analyst chose Abort during a repair or conflict decision.
    Aborted {
        /// What was being decided when the abort was requested.
        context: String,
    },

    /// The two merged collections lost positional alignment before
    /// renumbering. Indicates an internal invariant break upstream, not a
    /// data problem.
    LengthMismatch {
        /// Length of the merged left collection.
        left: usize,
        /// Length of the merged right collection.
        right: usize,
    },

    /// An input document does not have the expected shape.
    InvalidInput {
        /// Human-readable description of the problem.
        detail: String,
    },

    /// A configuration file could not be loaded or failed validation.
    Config {
        /// Path to the configuration file, if known.
        path: Option<PathBuf>,
        /// Human-readable description of the problem.
        detail: String,
    },

    /// An I/O error occurred.
    Io(std::io::Error),
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted { context } => {
                write!(
                    f,
                    "run aborted by the analyst during {context}.\n  No output was written."
                )
            }
            Self::LengthMismatch { left, right } => {
                write!(
                    f,
                    "merged collections are out of alignment: left has {left} record(s), right has {right}.\n  This is an internal error in the merge pipeline; please report it."
                )
            }
            Self::InvalidInput { detail } => {
                write!(
                    f,
                    "invalid input: {detail}\n  Each input file must be a JSON array of finding objects."
                )
            }
            Self::Config { path, detail } => match path {
                Some(p) => write!(
                    f,
                    "configuration error in '{}': {detail}\n  To fix: edit the config file and correct the issue.",
                    p.display()
                ),
                None => write!(f, "configuration error: {detail}"),
            },
            Self::Io(err) => {
                write!(
                    f,
                    "I/O error: {err}\n  To fix: check file paths and permissions."
                )
            }
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReconcileError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<crate::config::ConfigError> for ReconcileError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config {
            path: err.path,
            detail: err.message,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_aborted() {
        let err = ReconcileError::Aborted {
            context: "field repair for 'cvss_score'".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("aborted"));
        assert!(msg.contains("cvss_score"));
        assert!(msg.contains("No output was written"));
    }

    #[test]
    fn display_length_mismatch() {
        let err = ReconcileError::LengthMismatch { left: 4, right: 3 };
        let msg = format!("{err}");
        assert!(msg.contains("4 record(s)"));
        assert!(msg.contains('3'));
        assert!(msg.contains("internal error"));
    }

    #[test]
    fn display_invalid_input() {
        let err = ReconcileError::InvalidInput {
            detail: "top-level value is not an array".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("not an array"));
        assert!(msg.contains("JSON array"));
    }

    #[test]
    fn display_config_with_path() {
        let err = ReconcileError::Config {
            path: Some(PathBuf::from("findmerge.toml")),
            detail: "unknown field 'foo'".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("findmerge.toml"));
        assert!(msg.contains("unknown field 'foo'"));
        assert!(msg.contains("edit the config file"));
    }

    #[test]
    fn display_io() {
        let err = ReconcileError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        let msg = format!("{err}");
        assert!(msg.contains("no such file"));
        assert!(msg.contains("check file paths"));
    }

    #[test]
    fn error_source_io() {
        let err = ReconcileError::Io(std::io::Error::other("disk full"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn error_source_non_io_is_none() {
        let err = ReconcileError::Aborted {
            context: "x".to_owned(),
        };
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn from_config_error() {
        let cfg_err = crate::config::ConfigError {
            path: Some(PathBuf::from("findmerge.toml")),
            message: "bad syntax".to_owned(),
        };
        let err: ReconcileError = cfg_err.into();
        match err {
            ReconcileError::Config { path, detail } => {
                assert_eq!(path, Some(PathBuf::from("findmerge.toml")));
                assert_eq!(detail, "bad syntax");
            }
            other => panic!("expected Config, got {other:?}"),
        }
    }
}
