//! In-memory evaluation of compiled filter documents.
//!
//! Production deployments hand the compiled document to the database
//! driver; the in-memory listing repository (single-instance/testing
//! deployments) evaluates it directly against flat JSON documents.

use std::cmp::Ordering;

use regex::RegexBuilder;
use serde_json::Value as JsonValue;

use crate::compile::FilterExpression;

impl FilterExpression {
    /// Whether `doc` satisfies this expression.
    pub fn matches(&self, doc: &JsonValue) -> bool {
        matches_document(&self.to_document(), doc)
    }
}

/// Evaluate a compiled filter document against a flat JSON document.
pub fn matches_document(filter: &JsonValue, doc: &JsonValue) -> bool {
    let Some(conditions) = filter.as_object() else {
        return true;
    };

    conditions.iter().all(|(key, condition)| {
        if key == "$or" {
            return condition
                .as_array()
                .map(|branches| branches.iter().any(|b| matches_document(b, doc)))
                .unwrap_or(false);
        }
        field_matches(doc, key, condition)
    })
}

fn field_matches(doc: &JsonValue, field: &str, condition: &JsonValue) -> bool {
    let value = doc.get(field);

    match condition.as_object() {
        Some(ops) if ops.keys().any(|k| k.starts_with('$')) => {
            ops.iter().all(|(op, operand)| {
                operator_matches(op, operand, ops, value, doc, field)
            })
        }
        _ => value.is_some_and(|v| values_equal(v, condition)),
    }
}

fn operator_matches(
    op: &str,
    operand: &JsonValue,
    all_ops: &serde_json::Map<String, JsonValue>,
    value: Option<&JsonValue>,
    doc: &JsonValue,
    field: &str,
) -> bool {
    match op {
        "$gt" => ordered(value, operand).is_some_and(|o| o == Ordering::Greater),
        "$gte" => ordered(value, operand).is_some_and(|o| o != Ordering::Less),
        "$lt" => ordered(value, operand).is_some_and(|o| o == Ordering::Less),
        "$lte" => ordered(value, operand).is_some_and(|o| o != Ordering::Greater),
        "$ne" => !value.is_some_and(|v| values_equal(v, operand)),
        "$in" => operand.as_array().is_some_and(|set| {
            value.is_some_and(|v| match v.as_array() {
                Some(items) => items.iter().any(|i| set.iter().any(|s| values_equal(i, s))),
                None => set.iter().any(|s| values_equal(v, s)),
            })
        }),
        "$all" => operand.as_array().is_some_and(|required| {
            value.and_then(JsonValue::as_array).is_some_and(|items| {
                required
                    .iter()
                    .all(|r| items.iter().any(|i| values_equal(i, r)))
            })
        }),
        "$regex" => {
            let case_insensitive = all_ops
                .get("$options")
                .and_then(JsonValue::as_str)
                .is_some_and(|o| o.contains('i'));
            let Some(pattern) = operand.as_str() else {
                return false;
            };
            let Ok(re) = RegexBuilder::new(pattern)
                .case_insensitive(case_insensitive)
                .build()
            else {
                return false;
            };
            value
                .and_then(JsonValue::as_str)
                .is_some_and(|s| re.is_match(s))
        }
        // Evaluated as part of $regex
        "$options" => true,
        "$exists" => {
            let expected = operand.as_bool().unwrap_or(false);
            doc.get(field).is_some() == expected
        }
        // Unknown operators never match (backend-only stages)
        _ => false,
    }
}

/// Loose equality: numbers compare numerically, everything else structurally.
fn values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn ordered(value: Option<&JsonValue>, operand: &JsonValue) -> Option<Ordering> {
    let value = value?;
    if let (Some(x), Some(y)) = (value.as_f64(), operand.as_f64()) {
        return x.partial_cmp(&y);
    }
    match (value.as_str(), operand.as_str()) {
        (Some(x), Some(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Compare two documents by a field for in-memory sorting.
///
/// Missing values sort after present ones; string comparison optionally
/// lowercases both sides (case-insensitive sort fields).
pub fn compare_by_field(
    a: &JsonValue,
    b: &JsonValue,
    field: &str,
    case_insensitive: bool,
) -> Ordering {
    match (a.get(field), b.get(field)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            if let (Some(xf), Some(yf)) = (x.as_f64(), y.as_f64()) {
                return xf.partial_cmp(&yf).unwrap_or(Ordering::Equal);
            }
            match (x.as_str(), y.as_str()) {
                (Some(xs), Some(ys)) if case_insensitive => {
                    xs.to_lowercase().cmp(&ys.to_lowercase())
                }
                (Some(xs), Some(ys)) => xs.cmp(ys),
                _ => Ordering::Equal,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_filter;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> serde_json::Map<String, JsonValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), JsonValue::String(v.to_string())))
            .collect()
    }

    fn compiled_matches(pairs: &[(&str, &str)], doc: JsonValue) -> bool {
        compile_filter(&params(pairs), &[]).unwrap().matches(&doc)
    }

    #[test]
    fn test_equality_match() {
        assert!(compiled_matches(&[("city", "Austin")], json!({"city": "Austin"})));
        assert!(!compiled_matches(&[("city", "Austin")], json!({"city": "Dallas"})));
        assert!(!compiled_matches(&[("city", "Austin")], json!({})));
    }

    #[test]
    fn test_numeric_comparison() {
        let doc = json!({"budget": 5000});
        assert!(compiled_matches(&[("budget", "gt:1000")], doc.clone()));
        assert!(compiled_matches(&[("budget", "lte:5000")], doc.clone()));
        assert!(!compiled_matches(&[("budget", "lt:5000")], doc.clone()));
        assert!(compiled_matches(&[("budget", "ne:1")], doc));
    }

    #[test]
    fn test_in_membership() {
        let doc = json!({"status": "active"});
        assert!(compiled_matches(&[("status", "in:active,paused")], doc.clone()));
        assert!(!compiled_matches(&[("status", "in:closed,paused")], doc));
    }

    #[test]
    fn test_in_against_array_field() {
        let doc = json!({"tags": ["crm", "email"]});
        assert!(compiled_matches(&[("tags", "in:email,sms")], doc.clone()));
        assert!(!compiled_matches(&[("tags", "in:sms")], doc));
    }

    #[test]
    fn test_all_containment() {
        let doc = json!({"tags": ["crm", "email", "pages"]});
        assert!(compiled_matches(&[("tags", "all:crm,email")], doc.clone()));
        assert!(!compiled_matches(&[("tags", "all:crm,sms")], doc));
    }

    #[test]
    fn test_regex_is_case_insensitive_and_literal() {
        let doc = json!({"name": "A.B Consulting"});
        assert!(compiled_matches(&[("name", "regex:a.b")], doc));
        // The escaped dot must not act as a wildcard
        assert!(!compiled_matches(
            &[("name", "regex:a.b")],
            json!({"name": "AxB Consulting"})
        ));
    }

    #[test]
    fn test_exists() {
        assert!(compiled_matches(&[("email", "exists:true")], json!({"email": "x@y.z"})));
        assert!(!compiled_matches(&[("email", "exists:true")], json!({})));
        assert!(compiled_matches(&[("email", "exists:false")], json!({})));
    }

    #[test]
    fn test_or_branches() {
        let doc = json!({"lastName": "smith"});
        assert!(compiled_matches(&[("smith", "or:firstName,lastName")], doc));
        assert!(!compiled_matches(
            &[("smith", "or:firstName,lastName")],
            json!({"firstName": "jones"})
        ));
    }

    #[test]
    fn test_hoisted_or_key_with_and_field() {
        let doc = json!({"status": "active", "city": "Austin"});
        assert!(compiled_matches(&[("or:status", "active"), ("city", "Austin")], doc));
        assert!(!compiled_matches(
            &[("or:status", "active"), ("city", "Austin")],
            json!({"status": "active", "city": "Dallas"})
        ));
    }

    #[test]
    fn test_compare_by_field_numbers() {
        let a = json!({"budget": 10});
        let b = json!({"budget": 20});
        assert_eq!(compare_by_field(&a, &b, "budget", false), Ordering::Less);
    }

    #[test]
    fn test_compare_by_field_case_insensitive() {
        let a = json!({"name": "alpha"});
        let b = json!({"name": "Beta"});
        assert_eq!(compare_by_field(&a, &b, "name", true), Ordering::Less);
        // Case-sensitive comparison puts uppercase first
        assert_eq!(compare_by_field(&a, &b, "name", false), Ordering::Greater);
    }

    #[test]
    fn test_compare_by_field_missing_sorts_last() {
        let a = json!({"budget": 10});
        let b = json!({});
        assert_eq!(compare_by_field(&a, &b, "budget", false), Ordering::Less);
        assert_eq!(compare_by_field(&b, &a, "budget", false), Ordering::Greater);
    }
}
