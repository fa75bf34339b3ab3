//! Runtime value union for finding fields.
//!
//! [`FieldValue`] is the single value representation that flows through
//! coercion, merge resolution, and serialization. Raw JSON input converts
//! into it losslessly, and every coerced field value is one of its variants.

use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A dynamically-typed field value.
///
/// Input records arrive with arbitrary shapes, so every field starts life as
/// a `FieldValue` and is narrowed by coercion against the field's declared
/// [`TypeDescriptor`](crate::model::TypeDescriptor).
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Absent or blank value.
    Null,
    /// Signed integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// String.
    Str(String),
    /// Ordered sequence of values.
    List(Vec<FieldValue>),
    /// String-keyed map of values. `BTreeMap` keeps serialization order
    /// deterministic.
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Convert a JSON value into a `FieldValue`.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => Self::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Self::List(items.iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back into a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Int(i) => serde_json::Value::Number((*i).into()),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Returns `true` for the blank forms: `Null`, an empty or
    /// whitespace-only string, an empty list, or an empty map.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Str(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
            Self::Int(_) | Self::Float(_) | Self::Bool(_) => false,
        }
    }

    /// Short name of the runtime type, for diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Render as plain text for prompts, token counting, and length
    /// comparison. `Null` renders as the empty string.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Str(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(Self::render)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Map(_) => self.to_json().to_string(),
        }
    }

    /// Consume into an optional string. Blank values become `None`;
    /// non-string scalars take their rendered form.
    #[must_use]
    pub fn into_opt_string(self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        match self {
            Self::Str(s) => Some(s),
            other => Some(other.render()),
        }
    }

    /// Consume into an optional float. Blank values become `None`.
    #[must_use]
    pub fn into_opt_f64(self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(f),
            Self::Int(i) => Some(i as f64),
            _ => None,
        }
    }

    /// Consume into a list of strings. Non-list values yield an empty list.
    #[must_use]
    pub fn into_string_list(self) -> Vec<String> {
        match self {
            Self::List(items) => items
                .into_iter()
                .filter_map(Self::into_opt_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Consume into a scalar map. Non-map values yield an empty map.
    #[must_use]
    pub fn into_scalar_map(self) -> BTreeMap<String, FieldValue> {
        match self {
            Self::Map(map) => map,
            _ => BTreeMap::new(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
