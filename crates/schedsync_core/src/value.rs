//! Field storage kinds and typed values.
//!
//! [`StorageKind::parse`] is the single place where candidate text is checked
//! against a storage kind. Everything else in the crate goes through it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a document field stores its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Free text.
    Text,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Real,
    /// Reference to another element, stored as its numeric id.
    ElementId,
}

impl StorageKind {
    /// Parses candidate text into a value of this kind.
    ///
    /// Text accepts anything. Integer and element id accept a decimal
    /// integer, or `true`/`false` as `1`/`0`. Real accepts any finite float.
    /// Empty input is only valid for text.
    pub fn parse(self, text: &str) -> Result<FieldValue, String> {
        let trimmed = text.trim();
        if self != StorageKind::Text && trimmed.is_empty() {
            return Err(format!("empty value is not a valid {}", self));
        }

        match self {
            StorageKind::Text => Ok(FieldValue::Text(text.to_string())),
            StorageKind::Integer => parse_integer(trimmed)
                .map(FieldValue::Integer)
                .ok_or_else(|| format!("'{}' is not a valid integer", text)),
            StorageKind::ElementId => parse_integer(trimmed)
                .map(FieldValue::ElementId)
                .ok_or_else(|| format!("'{}' is not a valid element id", text)),
            StorageKind::Real => match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(FieldValue::Real(v)),
                _ => Err(format!("'{}' is not a valid real number", text)),
            },
        }
    }

    /// Returns true if `value` can be stored in a field of this kind.
    pub fn accepts(self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (_, FieldValue::Empty)
                | (StorageKind::Text, FieldValue::Text(_))
                | (StorageKind::Integer, FieldValue::Integer(_))
                | (StorageKind::Real, FieldValue::Real(_))
                | (StorageKind::ElementId, FieldValue::ElementId(_))
        )
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageKind::Text => "text",
            StorageKind::Integer => "integer",
            StorageKind::Real => "real number",
            StorageKind::ElementId => "element id",
        };
        f.write_str(name)
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    if text.eq_ignore_ascii_case("true") {
        return Some(1);
    }
    if text.eq_ignore_ascii_case("false") {
        return Some(0);
    }
    text.parse::<i64>().ok()
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// No value stored.
    Empty,
    /// Text value.
    Text(String),
    /// Integer value.
    Integer(i64),
    /// Real value.
    Real(f64),
    /// Element reference.
    ElementId(i64),
}

impl FieldValue {
    /// Returns the canonical text form used for comparison and display.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Empty => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(v) | FieldValue::ElementId(v) => v.to_string(),
            FieldValue::Real(v) => format_real(*v),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Formats a real with at least one decimal digit (`10.0`, `12.5`).
pub fn format_real(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
