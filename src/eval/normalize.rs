//! Record field normalization
//!
//! Heterogeneous field representations (numeric-as-string, absent, the `-1`
//! sentinel) collapse into a canonical comparable form before matching.

use serde_json::Value;

use crate::records::Record;

/// A numeric field after normalization. `-1`, unparsable values and absent
/// fields all normalize to [`Undefined`](NumericField::Undefined), and two
/// `Undefined` values compare equal, so a pair of sentinel-valued records
/// matches on the value dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericField {
    Defined(f64),
    Undefined,
}

impl NumericField {
    pub fn is_undefined(&self) -> bool {
        matches!(self, NumericField::Undefined)
    }
}

/// Error raised when a field has a shape normalization cannot handle. The
/// matcher treats this as a per-pair failure: the pair is skipped, the
/// cross product continues.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("field '{field}' is not a string: {value}")]
    NotAString { field: &'static str, value: Value },
}

/// Normalize a numeric field. Conversion failure is a normal, silent
/// outcome, never an error.
pub fn normalize_numeric(value: Option<&Value>) -> NumericField {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n != -1.0 => NumericField::Defined(n),
        _ => NumericField::Undefined,
    }
}

/// Normalize a code field to its canonical string form. Absent and null map
/// to the empty string; no trimming is applied.
pub fn normalize_code(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Normalize a unit field: absent maps to the empty string, strings are
/// trimmed, and any other present value is a normalization error.
pub fn normalize_unit(value: Option<&Value>) -> Result<String, FieldError> {
    match value {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(other) => Err(FieldError::NotAString {
            field: "unit",
            value: other.clone(),
        }),
    }
}

/// A record reduced to its comparable form. All four dimensions are
/// normalized and carried, but [`matches`](NormalizedRecord::matches)
/// consults only `code` and `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub code: String,
    pub value: NumericField,
    pub unit: String,
    pub year: NumericField,
}

impl NormalizedRecord {
    pub fn from_record(record: &Record) -> Result<Self, FieldError> {
        Ok(Self {
            code: normalize_code(record.get("code")),
            value: normalize_numeric(record.get("value")),
            unit: normalize_unit(record.get("unit"))?,
            year: normalize_numeric(record.get("year")),
        })
    }

    /// Equivalence predicate: normalized codes equal and normalized values
    /// equal (two `Undefined` values included).
    pub fn matches(&self, other: &NormalizedRecord) -> bool {
        self.code == other.code && self.value == other.value
    }
}
