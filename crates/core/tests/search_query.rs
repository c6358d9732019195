//! Integration tests for the free-text search language.

mod common;

use serde_json::json;

use common::records;
use opsdash_core::search::{Comparison, LogicalOperator};
use opsdash_core::{apply_parsed_query, parse_query, search};

// ---------------------------------------------------------------------------
// Test: parsing
// ---------------------------------------------------------------------------

#[test]
fn and_query_parses_to_two_units() {
    let parsed = parse_query("user:john AND type:update");
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].field, "user");
    assert_eq!(parsed[0].value, "john");
    assert_eq!(parsed[0].operator, Some(LogicalOperator::And));
    assert_eq!(parsed[1].field, "type");
    assert_eq!(parsed[1].operator, None);
}

#[test]
fn documented_query_shapes() {
    let parsed = parse_query("date>=2024-01-01");
    assert_eq!(parsed[0].field, "date");
    assert_eq!(parsed[0].comparison, Comparison::GreaterOrEqual);
    assert_eq!(parsed[0].value, "2024-01-01");

    let parsed = parse_query(r#"description:CONTAINS:"important""#);
    assert_eq!(parsed[0].field, "description");
    assert_eq!(parsed[0].comparison, Comparison::Contains);
    assert_eq!(parsed[0].value, "important");
}

// ---------------------------------------------------------------------------
// Test: applying
// ---------------------------------------------------------------------------

#[test]
fn and_query_keeps_matching_record() {
    common::init_tracing();
    let data = records(json!([
        {"user": "john", "type": "update"},
        {"user": "john", "type": "create"}
    ]));
    let queries = parse_query("user:john AND type:update");
    assert_eq!(apply_parsed_query(&data, &queries), vec![data[0].clone()]);
}

/// Parentheses do not group: the query folds left to right.
#[test]
fn parentheses_do_not_change_results() {
    let data = records(json!([
        {"type": "delete", "user": "amy"},
        {"type": "update", "user": "john"},
        {"type": "create", "user": "amy"}
    ]));
    assert_eq!(
        search(&data, "user:amy AND (type:update OR type:create)"),
        search(&data, "user:amy AND type:update OR type:create")
    );
}

#[test]
fn not_excludes_matches() {
    let data = records(json!([
        {"type": "delete"},
        {"type": "update"}
    ]));
    let result = search(&data, "NOT type:delete");
    assert_eq!(result, vec![data[1].clone()]);
}

#[test]
fn string_comparisons_are_lexical() {
    let data = records(json!([
        {"date": "2024-02-01"},
        {"date": "2023-11-30"},
        {"date": "2024-01-01"}
    ]));
    assert_eq!(search(&data, "date>=2024-01-01").len(), 2);
    assert_eq!(search(&data, "date<2024-01-01").len(), 1);
    assert_eq!(search(&data, "date!=2024-01-01").len(), 2);
}
