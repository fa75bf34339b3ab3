//! The finding record and its field accessor table.
//!
//! A [`Finding`] is one security-assessment record being reconciled. Parsing
//! from raw JSON goes through coercion field by field; a value that cannot
//! be coerced is surfaced through the decision port's repair loop rather
//! than dropped.
//!
//! Field iteration (parsing, merge resolution, serialization) walks the
//! fixed [`FieldSpec`] table instead of reflecting over the struct, so every
//! access stays type-safe.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::ReconcileConfig;
use crate::error::ReconcileError;
use crate::ports::{Choice, DecisionPort};

use super::coerce::{coerce, TypeDescriptor};
use super::value::FieldValue;

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

/// A single finding with all defined fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Finding {
    /// Identifier, unique within one output collection. Reassigned by the
    /// renumberer.
    pub id: i64,
    /// Severity; always a member of the configured allowed set.
    pub severity: String,
    /// CVSS base score.
    pub cvss_score: Option<f64>,
    /// CVSS vector string.
    pub cvss_vector: Option<String>,
    /// Finding category (e.g. "Web Application").
    pub finding_type: Option<String>,
    /// Short title.
    pub title: Option<String>,
    /// Narrative description.
    pub description: Option<String>,
    /// Business or technical impact.
    pub impact: Option<String>,
    /// Remediation guidance.
    pub mitigation: Option<String>,
    /// Steps to reproduce.
    pub replication_steps: Option<String>,
    /// Host-based detection techniques.
    pub host_detection_techniques: Option<String>,
    /// Network-based detection techniques.
    pub network_detection_techniques: Option<String>,
    /// External references.
    pub references: Option<String>,
    /// Additional analyst guidance.
    pub finding_guidance: Option<String>,
    /// Normalized (lower-cased, trimmed) tag tokens; semantically a set.
    pub tags: Vec<String>,
    /// Open-ended scalar fields outside the fixed schema.
    pub extra_fields: BTreeMap<String, FieldValue>,
}

/// Lower-case, trim, and de-blank tag tokens.
#[must_use]
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Field accessor table
// ---------------------------------------------------------------------------

/// One entry in the field accessor table: the field's name, declared type,
/// and typed getter/setter.
///
/// Setters expect a value of the field's declared shape (the getter's or
/// coercion's output) and apply the natural narrowing; blank values clear
/// optional fields.
pub struct FieldSpec {
    /// Field name as it appears in the record documents.
    pub name: &'static str,
    /// Declared type of the field.
    pub descriptor: fn() -> TypeDescriptor,
    /// Read the field as a [`FieldValue`].
    pub get: fn(&Finding) -> FieldValue,
    /// Write the field from a [`FieldValue`].
    pub set: fn(&mut Finding, FieldValue),
}

impl FieldSpec {
    /// Returns `true` if the field's declared type admits a blank value.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        (self.descriptor)().is_optional()
    }
}

fn opt_string_field(value: &Option<String>) -> FieldValue {
    match value {
        Some(s) => FieldValue::Str(s.clone()),
        None => FieldValue::Null,
    }
}

/// The full accessor table, `id` first. Order matches the record document
/// layout and drives parse/merge/serialization iteration.
static FIELDS: [FieldSpec; 16] = [
    FieldSpec {
        name: "id",
        descriptor: || TypeDescriptor::Scalar(super::coerce::ScalarKind::Int),
        get: |f| FieldValue::Int(f.id),
        set: |f, v| {
            if let FieldValue::Int(i) = v {
                f.id = i;
            }
        },
    },
    FieldSpec {
        name: "severity",
        descriptor: || TypeDescriptor::Scalar(super::coerce::ScalarKind::Str),
        get: |f| FieldValue::Str(f.severity.clone()),
        set: |f, v| f.severity = v.into_opt_string().unwrap_or_default(),
    },
    FieldSpec {
        name: "cvss_score",
        descriptor: TypeDescriptor::optional_float,
        get: |f| match f.cvss_score {
            Some(score) => FieldValue::Float(score),
            None => FieldValue::Null,
        },
        set: |f, v| f.cvss_score = v.into_opt_f64(),
    },
    FieldSpec {
        name: "cvss_vector",
        descriptor: TypeDescriptor::optional_str,
        get: |f| opt_string_field(&f.cvss_vector),
        set: |f, v| f.cvss_vector = v.into_opt_string(),
    },
    FieldSpec {
        name: "finding_type",
        descriptor: TypeDescriptor::optional_str,
        get: |f| opt_string_field(&f.finding_type),
        set: |f, v| f.finding_type = v.into_opt_string(),
    },
    FieldSpec {
        name: "title",
        descriptor: TypeDescriptor::optional_str,
        get: |f| opt_string_field(&f.title),
        set: |f, v| f.title = v.into_opt_string(),
    },
    FieldSpec {
        name: "description",
        descriptor: TypeDescriptor::optional_str,
        get: |f| opt_string_field(&f.description),
        set: |f, v| f.description = v.into_opt_string(),
    },
    FieldSpec {
        name: "impact",
        descriptor: TypeDescriptor::optional_str,
        get: |f| opt_string_field(&f.impact),
        set: |f, v| f.impact = v.into_opt_string(),
    },
    FieldSpec {
        name: "mitigation",
        descriptor: TypeDescriptor::optional_str,
        get: |f| opt_string_field(&f.mitigation),
        set: |f, v| f.mitigation = v.into_opt_string(),
    },
    FieldSpec {
        name: "replication_steps",
        descriptor: TypeDescriptor::optional_str,
        get: |f| opt_string_field(&f.replication_steps),
        set: |f, v| f.replication_steps = v.into_opt_string(),
    },
    FieldSpec {
        name: "host_detection_techniques",
        descriptor: TypeDescriptor::optional_str,
        get: |f| opt_string_field(&f.host_detection_techniques),
        set: |f, v| f.host_detection_techniques = v.into_opt_string(),
    },
    FieldSpec {
        name: "network_detection_techniques",
        descriptor: TypeDescriptor::optional_str,
        get: |f| opt_string_field(&f.network_detection_techniques),
        set: |f, v| f.network_detection_techniques = v.into_opt_string(),
    },
    FieldSpec {
        name: "references",
        descriptor: TypeDescriptor::optional_str,
        get: |f| opt_string_field(&f.references),
        set: |f, v| f.references = v.into_opt_string(),
    },
    FieldSpec {
        name: "finding_guidance",
        descriptor: TypeDescriptor::optional_str,
        get: |f| opt_string_field(&f.finding_guidance),
        set: |f, v| f.finding_guidance = v.into_opt_string(),
    },
    FieldSpec {
        name: "tags",
        descriptor: TypeDescriptor::str_list,
        get: |f| FieldValue::List(f.tags.iter().cloned().map(FieldValue::Str).collect()),
        set: |f, v| f.tags = normalize_tags(&v.into_string_list()),
    },
    FieldSpec {
        name: "extra_fields",
        descriptor: TypeDescriptor::scalar_map,
        get: |f| FieldValue::Map(f.extra_fields.clone()),
        set: |f, v| f.extra_fields = v.into_scalar_map(),
    },
];

/// All fields, `id` included.
#[must_use]
pub fn field_specs() -> &'static [FieldSpec] {
    &FIELDS
}

/// The fields that participate in merge resolution (everything except `id`).
#[must_use]
pub fn merge_fields() -> &'static [FieldSpec] {
    &FIELDS[1..]
}

/// Look up a field spec by name.
#[must_use]
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|spec| spec.name == name)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Result of parsing one raw record.
#[derive(Clone, Debug, PartialEq)]
pub enum ParseOutcome {
    /// The record coerced and validated cleanly.
    Parsed(Finding),
    /// The record was discarded: the analyst skipped it during repair, or
    /// its severity failed validation.
    Skipped,
}

enum Repair {
    Fixed(FieldValue),
    SkipRecord,
}

impl Finding {
    /// Convert a raw JSON record into a `Finding`, coercing and validating
    /// every field. Coercion failures are routed through `port` for repair.
    ///
    /// # Errors
    /// Returns [`ReconcileError::InvalidInput`] when the record is not a
    /// JSON object, and [`ReconcileError::Aborted`] when the analyst aborts
    /// during repair.
    pub fn from_raw(
        raw: &serde_json::Value,
        config: &ReconcileConfig,
        port: &mut dyn DecisionPort,
    ) -> Result<ParseOutcome, ReconcileError> {
        let Some(object) = raw.as_object() else {
            return Err(ReconcileError::InvalidInput {
                detail: format!("expected a finding object, got {raw}"),
            });
        };

        let mut finding = Self::default();
        for spec in field_specs() {
            let raw_value = object
                .get(spec.name)
                .map_or(FieldValue::Null, FieldValue::from_json);
            let descriptor = (spec.descriptor)();

            let coerced = match coerce(&raw_value, &descriptor, spec.name) {
                Ok(value) => value,
                Err(err) => {
                    debug!(%err, "coercion failed, entering repair loop");
                    match repair_field(spec, &raw_value, port)? {
                        Repair::Fixed(value) => value,
                        Repair::SkipRecord => {
                            warn!(field = spec.name, "analyst skipped record during repair");
                            return Ok(ParseOutcome::Skipped);
                        }
                    }
                }
            };

            (spec.set)(&mut finding, trim_string(coerced));
        }

        if !config
            .severity
            .allowed
            .iter()
            .any(|allowed| *allowed == finding.severity)
        {
            warn!(
                severity = %finding.severity,
                allowed = ?config.severity.allowed,
                "invalid severity, record discarded"
            );
            return Ok(ParseOutcome::Skipped);
        }

        debug!(id = finding.id, "parsed finding");
        Ok(ParseOutcome::Parsed(finding))
    }

    /// Serialize back into the record document shape.
    #[must_use]
    pub fn to_raw(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for spec in field_specs() {
            object.insert(spec.name.to_owned(), (spec.get)(self).to_json());
        }
        serde_json::Value::Object(object)
    }
}

fn trim_string(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Str(s) => FieldValue::Str(s.trim().to_owned()),
        other => other,
    }
}

/// The interactive repair loop for a field that failed coercion.
///
/// Loops until the corrected value coerces, or the analyst skips the record
/// or aborts the run. For optional fields a "remove value" option is
/// offered.
fn repair_field(
    spec: &FieldSpec,
    current: &FieldValue,
    port: &mut dyn DecisionPort,
) -> Result<Repair, ReconcileError> {
    let descriptor = (spec.descriptor)();
    let mut options = vec![Choice::Fix, Choice::SkipRecord, Choice::Abort];
    if descriptor.is_optional() {
        options.push(Choice::RemoveValue);
    }

    let mut attempt = current.clone();
    loop {
        let prompt = format!(
            "invalid value \"{}\" ({}) in '{}': a {} is needed",
            attempt.render(),
            attempt.kind_name(),
            spec.name,
            descriptor,
        );
        match port.ask(&prompt, &options, Some(Choice::SkipRecord)) {
            Choice::Fix => {
                let corrected = FieldValue::Str(port.edit(""));
                match coerce(&corrected, &descriptor, spec.name) {
                    Ok(value) => return Ok(Repair::Fixed(value)),
                    Err(err) => {
                        debug!(%err, "corrected value still invalid");
                        attempt = corrected;
                    }
                }
            }
            Choice::RemoveValue => return Ok(Repair::Fixed(FieldValue::Null)),
            Choice::Abort => {
                return Err(ReconcileError::Aborted {
                    context: format!("field repair for '{}'", spec.name),
                });
            }
            _ => return Ok(Repair::SkipRecord),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
