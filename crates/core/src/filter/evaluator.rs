//! Rule evaluator -- pure logic over plain records.
//!
//! Coercions follow JavaScript semantics. Text operators use `String(x)`,
//! numeric operators use `Number(x)` and a missing field is `undefined`.

use serde_json::{Number, Value};

use super::rules::{Condition, FilterGroup, FilterNode, FilterRule, Operator};
use crate::types::Record;

/// Whether `item` satisfies a single rule.
pub fn evaluate_rule(item: &Record, rule: &FilterRule) -> bool {
    let field = item.get(&rule.field);

    match rule.operator {
        Operator::Equals => strict_equals(field, &rule.value),
        Operator::Contains => lowercase(field).contains(&lowercase(Some(&rule.value))),
        Operator::StartsWith => lowercase(field).starts_with(&lowercase(Some(&rule.value))),
        Operator::EndsWith => lowercase(field).ends_with(&lowercase(Some(&rule.value))),
        Operator::GreaterThan => to_number(field) > to_number(Some(&rule.value)),
        Operator::LessThan => to_number(field) < to_number(Some(&rule.value)),
        Operator::Between => match rule.value.as_array() {
            Some(bounds) => {
                let x = to_number(field);
                let min = to_number(bounds.first());
                let max = to_number(bounds.get(1));
                min <= x && x <= max
            }
            None => false,
        },
        // A missing set means nothing is in it and everything is outside it.
        Operator::In => rule
            .value
            .as_array()
            .is_some_and(|set| set.iter().any(|v| strict_equals(field, v))),
        Operator::NotIn => rule
            .value
            .as_array()
            .map_or(true, |set| !set.iter().any(|v| strict_equals(field, v))),
    }
}

/// Whether `item` satisfies a group.
///
/// An empty AND group is `true` and an empty OR group is `false`; only
/// [`filter_records`] treats an empty *root* group as "no filter".
pub fn evaluate_group(item: &Record, group: &FilterGroup) -> bool {
    let mut results = group.rules.iter().map(|node| evaluate_node(item, node));
    match group.condition {
        Condition::And => results.all(|passed| passed),
        Condition::Or => results.any(|passed| passed),
    }
}

pub fn evaluate_node(item: &Record, node: &FilterNode) -> bool {
    match node {
        FilterNode::Rule(rule) => evaluate_rule(item, rule),
        FilterNode::Group(group) => evaluate_group(item, group),
    }
}

/// Keep the items passing `root`. A root with no rules returns everything.
pub fn filter_records(items: &[Record], root: &FilterGroup) -> Vec<Record> {
    if root.rules.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| evaluate_group(item, root))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Coercions
// ---------------------------------------------------------------------------

/// Strict equality with no type coercion. Numbers compare by value.
pub(crate) fn strict_equals(field: Option<&Value>, expected: &Value) -> bool {
    match (field, expected) {
        (None, _) => false,
        (Some(Value::Number(a)), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Some(a), b) => a == b,
    }
}

/// `String(x)`.
pub(crate) fn to_js_string(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => number_to_string(n),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_js_string(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

/// `Number(x)`; `NaN` never compares true.
pub(crate) fn to_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_number(s),
        Some(array @ Value::Array(_)) => parse_number(&to_js_string(Some(array))),
        Some(Value::Object(_)) => f64::NAN,
    }
}

fn lowercase(value: Option<&Value>) -> String {
    to_js_string(value).to_lowercase()
}

fn number_to_string(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn parse_number(raw: &str) -> f64 {
    let s = raw.trim();
    match s {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')) =>
        {
            s.parse().unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    }
}
