// restbase-core/src/predicate.rs
//! Predicate builder: one query parameter -> one filter over a record.
//!
//! A parameter key splits into `(field, operator)` on its trailing
//! underscore token: `price_lte=100` filters `price` with `lte`,
//! `category.name=toys` has no recognized suffix and filters with `eq`.
//! Keys whose field part is empty (`_sort`, `_start`, ...) carry plan
//! directives instead and are handled by the planner.
//!
//! Unrecognized operator suffixes contribute no predicate at all; the
//! parameter is silently ignored.

use crate::value_utils::{compare_values, get_path, loose_eq, to_text};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::cmp::Ordering;

/// Recognized filter operator suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lte,
    Gte,
    Like,
}

impl FilterOp {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "lte" => Some(Self::Lte),
            "gte" => Some(Self::Gte),
            "like" => Some(Self::Like),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lte => "lte",
            Self::Gte => "gte",
            Self::Like => "like",
        }
    }
}

/// Split a raw query key into `(field, operator)`.
///
/// The operator is the trailing `_token` where the token itself contains
/// no underscore; everything before it is the field. Without such a
/// suffix the whole key is the field and the operator defaults to `eq`.
pub fn split_key(key: &str) -> (&str, &str) {
    match key.rfind('_') {
        Some(idx) if idx + 1 < key.len() => (&key[..idx], &key[idx + 1..]),
        _ => (key, "eq"),
    }
}

/// One compiled filter: field path, operator, raw parameter text.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub field: String,
    pub op: FilterOp,
    pub param: String,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: FilterOp, param: impl Into<String>) -> Self {
        Predicate {
            field: field.into(),
            op,
            param: param.into(),
        }
    }

    /// Evaluate this predicate against a record.
    pub fn matches(&self, record: &Value) -> bool {
        let value = get_path(record, &self.field);
        match self.op {
            FilterOp::Eq => value.is_some_and(|v| loose_eq(v, &self.param)),
            FilterOp::Ne => !value.is_some_and(|v| loose_eq(v, &self.param)),
            FilterOp::Lte => value.is_some_and(|v| within_bound(v, &self.param, Bound::Upper)),
            FilterOp::Gte => value.is_some_and(|v| within_bound(v, &self.param, Bound::Lower)),
            FilterOp::Like => value.is_some_and(|v| {
                to_text(v)
                    .to_lowercase()
                    .contains(&self.param.to_lowercase())
            }),
        }
    }
}

#[derive(Clone, Copy)]
enum Bound {
    /// `lte`: value must be <= the bound.
    Upper,
    /// `gte`: value must be >= the bound.
    Lower,
}

/// Ordered comparison of a record value against a parameter.
///
/// Numbers compare as f64 against the parsed parameter. Strings that
/// parse as timestamps compare as instants, with a date-only parameter
/// widened to the inclusive edge of its calendar day: `lte` against its
/// end-of-day (23:59:59.999), `gte` against its start-of-day. Any other
/// string compares lexicographically. Everything else fails the bound.
fn within_bound(value: &Value, param: &str, bound: Bound) -> bool {
    let accepted = |ord: Ordering| match bound {
        Bound::Upper => ord != Ordering::Greater,
        Bound::Lower => ord != Ordering::Less,
    };
    match value {
        Value::Number(_) => match param.parse::<f64>() {
            Ok(limit) => compare_values(value, &Value::from(limit)).is_some_and(accepted),
            Err(_) => false,
        },
        Value::String(s) => match parse_instant(s) {
            Some(instant) => match day_bound(param, bound) {
                Some(limit) => accepted(instant.cmp(&limit)),
                None => false,
            },
            None => accepted(s.as_str().cmp(param)),
        },
        _ => false,
    }
}

/// Parse a record value as an instant: RFC 3339, or a bare `YYYY-MM-DD`
/// day taken at midnight UTC.
fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Interpret a comparison parameter as an instant. A calendar-day
/// parameter maps to the inclusive edge of the day selected by `bound`;
/// a full timestamp is used as-is.
fn day_bound(param: &str, bound: Bound) -> Option<DateTime<Utc>> {
    if let Ok(day) = NaiveDate::parse_from_str(param, "%Y-%m-%d") {
        let edge = match bound {
            Bound::Upper => day.and_hms_milli_opt(23, 59, 59, 999),
            Bound::Lower => day.and_hms_opt(0, 0, 0),
        };
        return edge.map(|naive| naive.and_utc());
    }
    DateTime::parse_from_rfc3339(param)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}
