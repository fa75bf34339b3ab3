//! Recursive value coercion against a closed set of type descriptors.
//!
//! Every finding field declares a [`TypeDescriptor`]; [`coerce`] converts an
//! arbitrary [`FieldValue`] into that shape or fails with a [`CoercionError`].
//! Dispatch is an exhaustive match over the descriptor, no runtime
//! reflection.
//!
//! Blank input (null, empty string, empty list/map) always succeeds and
//! yields the type's canonical empty representation, so callers never see a
//! partially-coerced value.

use std::collections::BTreeMap;
use std::fmt;

use super::value::FieldValue;

// ---------------------------------------------------------------------------
// TypeDescriptor
// ---------------------------------------------------------------------------

/// Scalar leaf types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    /// Signed integer.
    Int,
    /// Floating-point number.
    Float,
    /// String.
    Str,
    /// Boolean.
    Bool,
    /// Any scalar, passed through unchanged. Used for the open-ended
    /// `extra_fields` values, which carry arbitrary scalars.
    Any,
}

/// Declared shape of a finding field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// A scalar value.
    Scalar(ScalarKind),
    /// A value that may be absent.
    Optional(Box<TypeDescriptor>),
    /// An ordered sequence of `T`.
    List(Box<TypeDescriptor>),
    /// A map from `K` to `V`. Keys are always coerced to strings.
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Shorthand constructors used by the field table.
    #[must_use]
    pub fn optional_str() -> Self {
        Self::Optional(Box::new(Self::Scalar(ScalarKind::Str)))
    }

    #[must_use]
    pub fn optional_float() -> Self {
        Self::Optional(Box::new(Self::Scalar(ScalarKind::Float)))
    }

    #[must_use]
    pub fn str_list() -> Self {
        Self::List(Box::new(Self::Scalar(ScalarKind::Str)))
    }

    #[must_use]
    pub fn scalar_map() -> Self {
        Self::Map(
            Box::new(Self::Scalar(ScalarKind::Str)),
            Box::new(Self::Scalar(ScalarKind::Any)),
        )
    }

    /// Returns `true` if the descriptor admits an absent value.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Str => write!(f, "str"),
            Self::Bool => write!(f, "bool"),
            Self::Any => write!(f, "any scalar"),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Optional(inner) => write!(f, "{inner} or nothing"),
            Self::List(inner) => write!(f, "list of {inner}"),
            Self::Map(key, value) => write!(f, "map of {key} to {value}"),
        }
    }
}

// ---------------------------------------------------------------------------
// CoercionError
// ---------------------------------------------------------------------------

/// A raw value could not be converted to its field's declared type.
///
/// Recovered locally through the interactive repair loop; never silently
/// swallowed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoercionError {
    /// Name of the field being coerced.
    pub field: String,
    /// Rendering of the expected type descriptor.
    pub expected: String,
    /// Rendering of the offending value.
    pub value: String,
    /// Runtime type of the offending value.
    pub found: &'static str,
}

impl CoercionError {
    fn new(field: &str, descriptor: &TypeDescriptor, value: &FieldValue) -> Self {
        Self {
            field: field.to_owned(),
            expected: descriptor.to_string(),
            value: value.render(),
            found: value.kind_name(),
        }
    }
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}' expected {} but got {} \"{}\"",
            self.field, self.expected, self.found, self.value
        )
    }
}

impl std::error::Error for CoercionError {}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Truthy and falsy string forms accepted for bool coercion.
const TRUE_WORDS: [&str; 5] = ["true", "1", "yes", "y", "on"];
const FALSE_WORDS: [&str; 5] = ["false", "0", "no", "n", "off"];

/// Coerce `value` into the shape declared by `descriptor`.
///
/// # Errors
/// Returns a [`CoercionError`] when no conversion rule applies.
pub fn coerce(
    value: &FieldValue,
    descriptor: &TypeDescriptor,
    field_name: &str,
) -> Result<FieldValue, CoercionError> {
    if value.is_blank() {
        return Ok(canonical_empty(descriptor));
    }

    match descriptor {
        TypeDescriptor::Optional(inner) => coerce(value, inner, field_name),
        TypeDescriptor::Scalar(kind) => coerce_scalar(value, *kind, descriptor, field_name),
        TypeDescriptor::List(inner) => coerce_list(value, inner, descriptor, field_name),
        TypeDescriptor::Map(_, val_ty) => coerce_map(value, val_ty, descriptor, field_name),
    }
}

/// The canonical empty representation of a type.
fn canonical_empty(descriptor: &TypeDescriptor) -> FieldValue {
    match descriptor {
        TypeDescriptor::List(_) => FieldValue::List(Vec::new()),
        TypeDescriptor::Map(..) => FieldValue::Map(BTreeMap::new()),
        TypeDescriptor::Scalar(_) | TypeDescriptor::Optional(_) => FieldValue::Null,
    }
}

fn coerce_scalar(
    value: &FieldValue,
    kind: ScalarKind,
    descriptor: &TypeDescriptor,
    field_name: &str,
) -> Result<FieldValue, CoercionError> {
    let fail = || CoercionError::new(field_name, descriptor, value);

    match (kind, value) {
        // Fast path: already the right shape.
        (ScalarKind::Int, FieldValue::Int(_))
        | (ScalarKind::Float, FieldValue::Float(_))
        | (ScalarKind::Str, FieldValue::Str(_))
        | (ScalarKind::Bool, FieldValue::Bool(_)) => Ok(value.clone()),

        (
            ScalarKind::Any,
            FieldValue::Int(_) | FieldValue::Float(_) | FieldValue::Bool(_) | FieldValue::Str(_),
        ) => Ok(value.clone()),

        (ScalarKind::Int, FieldValue::Float(f)) => {
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                Ok(FieldValue::Int(*f as i64))
            } else {
                Err(fail())
            }
        }
        (ScalarKind::Int, FieldValue::Bool(b)) => Ok(FieldValue::Int(i64::from(*b))),
        (ScalarKind::Int, FieldValue::Str(s)) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(FieldValue::Int(i));
            }
            match s.parse::<f64>() {
                Ok(f) if f.fract() == 0.0 => Ok(FieldValue::Int(f as i64)),
                _ => Err(fail()),
            }
        }

        (ScalarKind::Float, FieldValue::Int(i)) => Ok(FieldValue::Float(*i as f64)),
        (ScalarKind::Float, FieldValue::Bool(b)) => {
            Ok(FieldValue::Float(if *b { 1.0 } else { 0.0 }))
        }
        (ScalarKind::Float, FieldValue::Str(s)) => match s.trim().parse::<f64>() {
            Ok(f) => Ok(FieldValue::Float(f)),
            Err(_) => Err(fail()),
        },

        (ScalarKind::Str, FieldValue::Int(_) | FieldValue::Float(_) | FieldValue::Bool(_)) => {
            Ok(FieldValue::Str(value.render()))
        }

        (ScalarKind::Bool, FieldValue::Str(s)) => {
            let word = s.trim().to_lowercase();
            if TRUE_WORDS.contains(&word.as_str()) {
                Ok(FieldValue::Bool(true))
            } else if FALSE_WORDS.contains(&word.as_str()) {
                Ok(FieldValue::Bool(false))
            } else {
                Err(fail())
            }
        }
        (ScalarKind::Bool, FieldValue::Int(0)) => Ok(FieldValue::Bool(false)),
        (ScalarKind::Bool, FieldValue::Int(1)) => Ok(FieldValue::Bool(true)),

        _ => Err(fail()),
    }
}

fn coerce_list(
    value: &FieldValue,
    inner: &TypeDescriptor,
    descriptor: &TypeDescriptor,
    field_name: &str,
) -> Result<FieldValue, CoercionError> {
    let elements: Vec<FieldValue> = match value {
        FieldValue::Str(s) => split_list_string(s)
            .into_iter()
            .map(FieldValue::Str)
            .collect(),
        FieldValue::List(items) => items.clone(),
        _ => return Err(CoercionError::new(field_name, descriptor, value)),
    };

    let mut coerced = Vec::with_capacity(elements.len());
    for element in &elements {
        coerced.push(coerce(element, inner, field_name)?);
    }
    Ok(FieldValue::List(coerced))
}

/// Split a flat string into list elements.
///
/// The first of `;`, `,`, `|` present in the string wins as the delimiter;
/// a string with none of them is a single-element list. Elements are trimmed
/// and empties dropped.
fn split_list_string(s: &str) -> Vec<String> {
    for delimiter in [';', ',', '|'] {
        if s.contains(delimiter) {
            return s
                .split(delimiter)
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_owned)
                .collect();
        }
    }
    vec![s.trim().to_owned()]
}

fn coerce_map(
    value: &FieldValue,
    val_ty: &TypeDescriptor,
    descriptor: &TypeDescriptor,
    field_name: &str,
) -> Result<FieldValue, CoercionError> {
    let entries: BTreeMap<String, FieldValue> = match value {
        FieldValue::Map(map) => map.clone(),
        FieldValue::Str(s) => parse_map_string(s)
            .ok_or_else(|| CoercionError::new(field_name, descriptor, value))?,
        _ => return Err(CoercionError::new(field_name, descriptor, value)),
    };

    let mut coerced = BTreeMap::new();
    for (key, entry) in &entries {
        coerced.insert(key.clone(), coerce(entry, val_ty, field_name)?);
    }
    Ok(FieldValue::Map(coerced))
}

/// Parse a map out of a string: a JSON object, or a JSON array holding
/// exactly one object (unwrapped).
fn parse_map_string(s: &str) -> Option<BTreeMap<String, FieldValue>> {
    let parsed: serde_json::Value = serde_json::from_str(s.trim()).ok()?;
    let object = match parsed {
        serde_json::Value::Object(_) => parsed,
        serde_json::Value::Array(items) if items.len() == 1 && items[0].is_object() => {
            items.into_iter().next()?
        }
        _ => return None,
    };
    match FieldValue::from_json(&object) {
        FieldValue::Map(map) => Some(map),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
