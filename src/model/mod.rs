//! The typed finding model: value union, coercion engine, and the record
//! itself.

pub mod coerce;
pub mod finding;
pub mod value;

pub use coerce::{coerce, CoercionError, ScalarKind, TypeDescriptor};
pub use finding::{
    field_spec, field_specs, merge_fields, normalize_tags, FieldSpec, Finding, ParseOutcome,
};
pub use value::FieldValue;
