//! Reconciliation configuration (`findmerge.toml`).
//!
//! Defines the typed configuration for a reconciliation run: match weights
//! and thresholds, the allowed severity set, merge interactivity, redaction,
//! and renumbering. Missing file means all defaults; unknown fields are
//! rejected with line-level detail.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level reconciliation configuration.
///
/// Parsed from `findmerge.toml`. Missing fields use defaults; a missing file
/// is not an error.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
#[derive(Default)]
pub struct ReconcileConfig {
    /// Similarity scoring and matching settings.
    #[serde(default, rename = "match")]
    pub matching: MatchConfig,

    /// Severity validation settings.
    #[serde(default)]
    pub severity: SeverityConfig,

    /// Merge resolution settings.
    #[serde(default)]
    pub merge: MergeConfig,

    /// Sensitive-term redaction settings.
    #[serde(default)]
    pub redaction: RedactionConfig,

    /// Output renumbering settings.
    #[serde(default)]
    pub renumber: RenumberConfig,
}

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Similarity scoring weights and match thresholds.
///
/// Weights are normalized to sum to 1 only when their raw sum exceeds 1, so
/// a deliberately under-weighted profile is preserved.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchConfig {
    /// Weight of the title similarity component.
    #[serde(default = "default_weight_title")]
    pub weight_title: f64,

    /// Weight of the finding-type equality component.
    #[serde(default = "default_weight_finding_type")]
    pub weight_finding_type: f64,

    /// Weight of the description similarity component.
    #[serde(default = "default_weight_description")]
    pub weight_description: f64,

    /// Weight of the impact similarity component.
    #[serde(default = "default_weight_impact")]
    pub weight_impact: f64,

    /// Weight of the mitigation similarity component.
    #[serde(default = "default_weight_mitigation")]
    pub weight_mitigation: f64,

    /// Minimum raw title ratio (0-100). Below this, scoring stops after the
    /// title component: a title this far apart is treated as a non-match.
    #[serde(default = "default_min_title_score")]
    pub min_title_score: f64,

    /// Match thresholds, processed in order. Each tier re-runs the matcher
    /// over the records left unmatched by the previous tier.
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<f64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            weight_title: default_weight_title(),
            weight_finding_type: default_weight_finding_type(),
            weight_description: default_weight_description(),
            weight_impact: default_weight_impact(),
            weight_mitigation: default_weight_mitigation(),
            min_title_score: default_min_title_score(),
            thresholds: default_thresholds(),
        }
    }
}

const fn default_weight_title() -> f64 {
    0.3
}

const fn default_weight_finding_type() -> f64 {
    0.1
}

const fn default_weight_description() -> f64 {
    0.2
}

const fn default_weight_impact() -> f64 {
    0.2
}

const fn default_weight_mitigation() -> f64 {
    0.2
}

const fn default_min_title_score() -> f64 {
    50.0
}

fn default_thresholds() -> Vec<f64> {
    vec![95.0, 85.0]
}

// ---------------------------------------------------------------------------
// SeverityConfig
// ---------------------------------------------------------------------------

/// Allowed severity values. A record whose severity is outside this set is
/// discarded during parsing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeverityConfig {
    /// The allowed severity strings, matched exactly.
    #[serde(default = "default_allowed_severities")]
    pub allowed: Vec<String>,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            allowed: default_allowed_severities(),
        }
    }
}

fn default_allowed_severities() -> Vec<String> {
    ["Low", "Medium", "High", "Critical"]
        .map(str::to_owned)
        .to_vec()
}

// ---------------------------------------------------------------------------
// MergeConfig
// ---------------------------------------------------------------------------

/// Merge resolution behaviour.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    /// When `true`, every field conflict is presented through the decision
    /// port. When `false`, the auto-suggested value is applied silently
    /// (best-guess mode) and the choice is logged.
    #[serde(default = "default_interactive")]
    pub interactive: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            interactive: default_interactive(),
        }
    }
}

const fn default_interactive() -> bool {
    true
}

// ---------------------------------------------------------------------------
// RedactionConfig
// ---------------------------------------------------------------------------

/// Sensitive-term redaction settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
#[derive(Default)]
pub struct RedactionConfig {
    /// Enable scanning of finalized field values.
    #[serde(default)]
    pub enabled: bool,

    /// Path to the sensitive-terms file (`term => replacement` lines).
    /// Required when `enabled` is `true`.
    #[serde(default)]
    pub terms_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// RenumberConfig
// ---------------------------------------------------------------------------

/// Output renumbering settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenumberConfig {
    /// First ID assigned to the merged outputs.
    #[serde(default = "default_start_id")]
    pub start_id: i64,
}

impl Default for RenumberConfig {
    fn default() -> Self {
        Self {
            start_id: default_start_id(),
        }
    }
}

const fn default_start_id() -> i64 {
    1
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a reconciliation configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl ReconcileConfig {
    /// Load configuration from a TOML file.
    ///
    /// - If the file does not exist, returns all defaults (not an error).
    /// - If the file exists but contains invalid TOML, unknown fields, or
    ///   values that fail validation, returns a [`ConfigError`].
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found), parse
    /// errors, or validation failures.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML, unknown fields, or validation
    /// failures.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that the type system cannot express.
    ///
    /// # Errors
    /// Returns `ConfigError` describing the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError {
            path: None,
            message,
        };

        let weights = [
            ("weight_title", self.matching.weight_title),
            ("weight_finding_type", self.matching.weight_finding_type),
            ("weight_description", self.matching.weight_description),
            ("weight_impact", self.matching.weight_impact),
            ("weight_mitigation", self.matching.weight_mitigation),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(format!(
                    "match.{name} must be a non-negative number, got {weight}"
                )));
            }
        }

        if !(0.0..=100.0).contains(&self.matching.min_title_score) {
            return Err(invalid(format!(
                "match.min_title_score must be between 0 and 100, got {}",
                self.matching.min_title_score
            )));
        }

        if self.matching.thresholds.is_empty() {
            return Err(invalid(
                "match.thresholds must list at least one threshold".to_owned(),
            ));
        }
        for window in self.matching.thresholds.windows(2) {
            if window[1] >= window[0] {
                return Err(invalid(format!(
                    "match.thresholds must be strictly descending, got {} before {}",
                    window[0], window[1]
                )));
            }
        }

        if self.severity.allowed.is_empty() {
            return Err(invalid(
                "severity.allowed must list at least one severity".to_owned(),
            ));
        }

        if self.redaction.enabled && self.redaction.terms_file.is_none() {
            return Err(invalid(
                "redaction.enabled requires redaction.terms_file".to_owned(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
