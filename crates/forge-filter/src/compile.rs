//! Query-parameter filter compilation.
//!
//! Translates a flat query-parameter map using the operator grammar
//! (`gt:`, `lt:`, `gte:`, `lte:`, `ne:`, `in:`, `all:`, `regex:`, `or:`,
//! `exists:`) into an immutable [`FilterExpression`] that renders to an
//! aggregation-style filter document.
//!
//! Every raw key is classified exactly once into a literal, an operator
//! clause, or an OR combinator; unclassified values fall back to
//! literal string/ObjectId coercion and are never silently dropped.

use std::collections::BTreeMap;

use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::trace;

use forge_core::{Error, Result};

use crate::value::{is_object_id, FilterValue};

/// Reserved pagination keys stripped before filter compilation.
pub const RESERVED_KEYS: &[&str] = &["page", "limit", "sort"];

/// Comparison operators mapping onto `$gt`/`$lt`/`$gte`/`$lte`/`$ne`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Lt,
    Gte,
    Lte,
    Ne,
}

impl CompareOp {
    fn document_key(self) -> &'static str {
        match self {
            CompareOp::Gt => "$gt",
            CompareOp::Lt => "$lt",
            CompareOp::Gte => "$gte",
            CompareOp::Lte => "$lte",
            CompareOp::Ne => "$ne",
        }
    }
}

/// A compiled condition on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Literal equality.
    Eq(FilterValue),
    /// Comparison clause (`$gt`, `$lt`, `$gte`, `$lte`, `$ne`).
    Compare { op: CompareOp, value: FilterValue },
    /// Set membership (`$in`).
    In(Vec<FilterValue>),
    /// Array containment (`$all`).
    All(Vec<FilterValue>),
    /// Escaped, case-insensitive regex match.
    Regex { pattern: String },
    /// Field presence (`$exists`).
    Exists(bool),
    /// Pre-structured value passed through untouched.
    Raw(JsonValue),
}

impl Condition {
    /// Render this condition as its filter-document value.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Condition::Eq(v) => v.to_json(),
            Condition::Compare { op, value } => {
                serde_json::json!({ (op.document_key()): value.to_json() })
            }
            Condition::In(values) => {
                serde_json::json!({ "$in": values.iter().map(FilterValue::to_json).collect::<Vec<_>>() })
            }
            Condition::All(values) => {
                serde_json::json!({ "$all": values.iter().map(FilterValue::to_json).collect::<Vec<_>>() })
            }
            Condition::Regex { pattern } => {
                serde_json::json!({ "$regex": pattern, "$options": "i" })
            }
            Condition::Exists(b) => serde_json::json!({ "$exists": b }),
            Condition::Raw(v) => v.clone(),
        }
    }
}

/// Immutable compiled representation of a query-parameter map.
///
/// Built in one compiler pass (plus the named OR-hoisting and ObjectId
/// post-processing rules) rather than by incremental mutation, so the
/// result cannot depend on parameter iteration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpression {
    /// Per-field conditions, ANDed together.
    pub fields: BTreeMap<String, Condition>,
    /// Top-level OR branches: `(field, condition)` pairs.
    pub or: Vec<(String, Condition)>,
}

impl FilterExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.or.is_empty()
    }

    /// Add (or override) a field condition; used for server-enforced
    /// additional filters such as tenant scoping.
    pub fn with_field(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.fields.insert(field.into(), condition);
        self
    }

    /// Render the full aggregation-style filter document.
    pub fn to_document(&self) -> JsonValue {
        let mut doc = JsonMap::new();
        for (field, condition) in &self.fields {
            doc.insert(field.clone(), condition.to_json());
        }
        if !self.or.is_empty() {
            let branches: Vec<JsonValue> = self
                .or
                .iter()
                .map(|(field, condition)| {
                    serde_json::json!({ (field.clone()): condition.to_json() })
                })
                .collect();
            doc.insert("$or".to_string(), JsonValue::Array(branches));
        }
        JsonValue::Object(doc)
    }
}

/// Fixed operator table. Overlapping prefixes are ordered longest-first so
/// `gte:` wins over `gt:`; first match wins.
const OPERATOR_TABLE: &[&str] = &[
    "gte:", "lte:", "gt:", "lt:", "ne:", "in:", "all:", "regex:", "or:", "exists:",
];

/// Escape every regex metacharacter in a raw pattern so the compiled regex
/// matches the operand literally (`regex:a.b` matches a literal dot).
pub fn escape_regex(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() * 2);
    for c in raw.chars() {
        if matches!(
            c,
            '\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Outcome of classifying one key/value pair.
enum Classified {
    /// A condition on the key itself.
    Field(Condition),
    /// Cross-field OR: the key's literal tested against each listed field.
    CrossFieldOr(Vec<(String, Condition)>),
}

/// Classify a raw string value against the operator table.
fn classify_value(key: &str, raw: &str) -> Result<Classified> {
    // Boolean and numeric literals cannot carry an operator prefix.
    if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false") {
        return Ok(Classified::Field(Condition::Eq(FilterValue::coerce(raw))));
    }
    if raw.parse::<f64>().is_ok() {
        return Ok(Classified::Field(Condition::Eq(FilterValue::coerce(raw))));
    }

    for prefix in OPERATOR_TABLE {
        if let Some(operand) = raw.strip_prefix(prefix) {
            return classify_operator(key, prefix, operand);
        }
    }

    // No operator matched: ObjectId shape or plain string literal.
    Ok(Classified::Field(Condition::Eq(FilterValue::coerce(raw))))
}

fn classify_operator(key: &str, prefix: &str, operand: &str) -> Result<Classified> {
    let condition = match prefix {
        "gt:" | "lt:" | "gte:" | "lte:" | "ne:" => {
            let op = match prefix {
                "gt:" => CompareOp::Gt,
                "lt:" => CompareOp::Lt,
                "gte:" => CompareOp::Gte,
                "lte:" => CompareOp::Lte,
                _ => CompareOp::Ne,
            };
            Condition::Compare {
                op,
                value: FilterValue::coerce(operand),
            }
        }
        "in:" | "all:" => {
            let values: Vec<FilterValue> = operand
                .split(',')
                .filter(|s| !s.is_empty())
                .map(FilterValue::coerce)
                .collect();
            if prefix == "in:" {
                Condition::In(values)
            } else {
                Condition::All(values)
            }
        }
        "regex:" => {
            let pattern = escape_regex(operand);
            if pattern.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "regex filter for '{}' must not be empty",
                    key
                )));
            }
            Condition::Regex { pattern }
        }
        "exists:" => {
            let flag = operand.eq_ignore_ascii_case("true");
            Condition::Exists(flag)
        }
        "or:" => {
            // Cross-field OR: operand lists field names, each tested
            // against the key's own literal value.
            let literal = FilterValue::coerce(key);
            let branches: Vec<(String, Condition)> = operand
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|field| (field.to_string(), Condition::Eq(literal.clone())))
                .collect();
            if branches.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "or filter for '{}' must list at least one field",
                    key
                )));
            }
            return Ok(Classified::CrossFieldOr(branches));
        }
        _ => unreachable!("prefix comes from OPERATOR_TABLE"),
    };
    Ok(Classified::Field(condition))
}

/// Named hoisting rule: keys prefixed `or:` move into the top-level `$or`
/// combinator instead of the flat field map.
fn strip_or_key(key: &str) -> Option<String> {
    key.strip_prefix("or:").map(str::to_string)
}

/// Defensive second pass: coerce any remaining ObjectId-shaped string
/// literals that slipped through as plain strings.
fn coerce_object_ids(expr: &mut FilterExpression) {
    let coerce = |condition: &mut Condition| {
        if let Condition::Eq(FilterValue::Str(s)) = condition {
            if is_object_id(s) {
                *condition = Condition::Eq(FilterValue::ObjectId(s.clone()));
            }
        }
    };
    for condition in expr.fields.values_mut() {
        coerce(condition);
    }
    for (_, condition) in expr.or.iter_mut() {
        coerce(condition);
    }
}

/// Compile a raw query-parameter map into a [`FilterExpression`].
///
/// Pagination keys (`page`, `limit`, `sort`) are stripped first.
/// Pre-structured values (arrays/objects) pass through untouched; string
/// values run through literal coercion and the operator table; other JSON
/// scalars become equality literals. `additional` filters (server-enforced
/// scoping) merge in last and override compiled conditions on conflict.
pub fn compile_filter(
    params: &JsonMap<String, JsonValue>,
    additional: &[(String, Condition)],
) -> Result<FilterExpression> {
    let mut expr = FilterExpression::new();

    for (key, value) in params {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }

        let classified = match value {
            JsonValue::Array(_) | JsonValue::Object(_) => {
                Classified::Field(Condition::Raw(value.clone()))
            }
            JsonValue::String(raw) => classify_value(key, raw)?,
            JsonValue::Bool(b) => Classified::Field(Condition::Eq(FilterValue::Bool(*b))),
            JsonValue::Number(n) => Classified::Field(Condition::Eq(FilterValue::Num(n.clone()))),
            JsonValue::Null => continue,
        };

        match classified {
            Classified::Field(condition) => {
                trace!(key = %key, "classified filter key");
                match strip_or_key(key) {
                    Some(field) => expr.or.push((field, condition)),
                    None => {
                        expr.fields.insert(key.clone(), condition);
                    }
                }
            }
            Classified::CrossFieldOr(branches) => {
                expr.or.extend(branches);
            }
        }
    }

    coerce_object_ids(&mut expr);

    for (field, condition) in additional {
        expr.fields.insert(field.clone(), condition.clone());
    }

    Ok(expr)
}
