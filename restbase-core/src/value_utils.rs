//! Value utility functions shared across modules
//!
//! Dot-path field access over JSON values, plus the loose comparison
//! rules the query engine is built on. Query parameters always arrive as
//! text, so equality and ordering against them coerce by the type of the
//! *record* value, never the other way around.

use serde_json::Value;
use std::cmp::Ordering;

/// Resolve a dot-separated path against a record.
///
/// Walks one object level per segment. A segment that is absent, or an
/// intermediate value that is not an object, short-circuits to `None`
/// instead of failing.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use restbase_core::value_utils::get_path;
///
/// let record = json!({"category": {"name": "toys"}});
/// assert_eq!(get_path(&record, "category.name"), Some(&json!("toys")));
/// assert_eq!(get_path(&record, "category.missing"), None);
/// ```
pub fn get_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    // Fast path: no dots means simple field access
    if !path.contains('.') {
        return record.get(path);
    }

    let mut value = record;
    for part in path.split('.') {
        match value {
            Value::Object(map) => value = map.get(part)?,
            _ => return None,
        }
    }
    Some(value)
}

/// Loose equality between a record value and a query-parameter string.
///
/// Coercion rules (the `eq`/`ne` contract, documented here and in the
/// predicate tests):
/// - strings compare byte-wise
/// - numbers compare as f64 against the parsed parameter
/// - booleans compare against the literal `"true"` / `"false"`
/// - `null` never equals any parameter, nor do arrays or objects
pub fn loose_eq(value: &Value, param: &str) -> bool {
    match value {
        Value::String(s) => s == param,
        Value::Number(n) => param
            .parse::<f64>()
            .map(|p| n.as_f64() == Some(p))
            .unwrap_or(false),
        Value::Bool(b) => param == if *b { "true" } else { "false" },
        _ => false,
    }
}

/// Loose equality between two record values, used for id matching.
///
/// Ids may be stored as numbers and referenced as strings (or vice
/// versa), so `1` and `"1"` match.
pub fn loose_eq_values(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => s
            .parse::<f64>()
            .map(|p| n.as_f64() == Some(p))
            .unwrap_or(false),
        _ => false,
    }
}

/// Compare two JSON values
///
/// Returns `Some(Ordering)` for comparable types (numbers, strings,
/// booleans), `None` for incompatible types.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(n1), Value::Number(n2)) => {
            let f1 = n1.as_f64()?;
            let f2 = n2.as_f64()?;
            f1.partial_cmp(&f2)
        }
        (Value::String(s1), Value::String(s2)) => Some(s1.cmp(s2)),
        (Value::Bool(b1), Value::Bool(b2)) => Some(b1.cmp(b2)),
        _ => None,
    }
}

/// Compare two optional JSON values with None handling
///
/// Used for sorting where missing values need consistent ordering.
///
/// # Ordering rules
///
/// - None < Some(_)
/// - Some(a) vs Some(b) uses compare_values
/// - Incompatible types return Equal (stable sort keeps their order)
pub fn compare_values_with_none(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(av), Some(bv)) => compare_values(av, bv).unwrap_or(Ordering::Equal),
    }
}

/// Render a record value as text for substring matching.
/// Strings render verbatim, everything else through its JSON
/// serialization.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
