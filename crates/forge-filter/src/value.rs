//! Literal value coercion for the filter grammar.
//!
//! Raw query-string values are plain strings; the compiler coerces them
//! into typed literals before any operator parsing so operator operands
//! receive the same treatment (`age=gt:30` compares against the number 30).

use serde_json::{Number, Value as JsonValue};

/// A coerced filter literal.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Str(String),
    Num(Number),
    Bool(bool),
    /// 24-hex-character database object identifier.
    ObjectId(String),
}

impl FilterValue {
    /// Coerce a raw string into a typed literal.
    ///
    /// Order matters: boolean, then number, then ObjectId shape, then plain
    /// string. `"true"`/`"false"` match case-insensitively.
    pub fn coerce(raw: &str) -> FilterValue {
        if raw.eq_ignore_ascii_case("true") {
            return FilterValue::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return FilterValue::Bool(false);
        }
        if let Ok(n) = raw.parse::<i64>() {
            return FilterValue::Num(n.into());
        }
        if let Ok(f) = raw.parse::<f64>() {
            if let Some(n) = Number::from_f64(f) {
                return FilterValue::Num(n);
            }
        }
        if is_object_id(raw) {
            return FilterValue::ObjectId(raw.to_string());
        }
        FilterValue::Str(raw.to_string())
    }

    /// Render as a JSON value for the compiled filter document.
    ///
    /// ObjectIds render as their hex string; the database driver applies
    /// the native identifier type downstream.
    pub fn to_json(&self) -> JsonValue {
        match self {
            FilterValue::Str(s) => JsonValue::String(s.clone()),
            FilterValue::Num(n) => JsonValue::Number(n.clone()),
            FilterValue::Bool(b) => JsonValue::Bool(*b),
            FilterValue::ObjectId(s) => JsonValue::String(s.clone()),
        }
    }
}

/// Whether a string has the shape of a database object identifier
/// (exactly 24 hexadecimal characters).
pub fn is_object_id(s: &str) -> bool {
    s.len() == 24 && s.chars().all(|c| c.is_ascii_hexdigit())
}
