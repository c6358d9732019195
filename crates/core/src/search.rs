//! Free-text search language for list views.
//!
//! Queries look like `type:update AND user:john`, `date>=2024-01-01` or
//! `description:CONTAINS:"important"`. The input is tokenized with a single
//! regex, parsed into a flat list of [`ParsedQuery`] and applied with a
//! left-to-right fold.
//!
//! Parentheses are recognised by the tokenizer but have no effect on
//! evaluation.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::evaluator::{to_js_string, to_number};
use crate::types::Record;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Token grammar, in priority order. Keyword comparisons come before field
/// markers so `CONTAINS:` is never read as a field name. Only a leading
/// quote opens a quoted string; inside a bare value quotes and `!` are
/// ordinary characters, while `<`, `>` and `=` end the value so
/// `date>=2024` splits in three. A value ending in `!` directly before `=`
/// gives the `!` back to the comparison (see [`tokenize`]).
const TOKEN_PATTERN: &str = r#"(?x)
      (?P<keyword>\b(?:CONTAINS|STARTS|ENDS)\b:?)
    | (?P<field>\w+):
    | (?P<paren>[()])
    | (?P<op>\b(?:AND|OR|NOT)\b)
    | (?P<cmp>>=|<=|!=|=|>|<)
    | "(?P<dq>[^"]*)"
    | '(?P<sq>[^']*)'
    | (?P<value>[^\s()<>="'][^\s()<>=]*)
"#;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TOKEN_PATTERN).expect("valid regex"));

/// How a query compares the field against its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "CONTAINS")]
    Contains,
    #[serde(rename = "STARTS")]
    StartsWith,
    #[serde(rename = "ENDS")]
    EndsWith,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::Contains => "CONTAINS",
            Self::StartsWith => "STARTS",
            Self::EndsWith => "ENDS",
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.trim_end_matches(':') {
            "=" => Some(Self::Equals),
            "!=" => Some(Self::NotEquals),
            ">" => Some(Self::GreaterThan),
            "<" => Some(Self::LessThan),
            ">=" => Some(Self::GreaterOrEqual),
            "<=" => Some(Self::LessOrEqual),
            "CONTAINS" => Some(Self::Contains),
            "STARTS" => Some(Self::StartsWith),
            "ENDS" => Some(Self::EndsWith),
            _ => None,
        }
    }
}

/// Logical operator joining a query to the running result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

impl LogicalOperator {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "NOT" => Some(Self::Not),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `name:` with the colon stripped.
    Field(String),
    Comparison(Comparison),
    Operator(LogicalOperator),
    LParen,
    RParen,
    /// Bare word or quoted string (quotes stripped).
    Value(String),
}

/// Split a query string into tokens.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut negate_next = false;

    for caps in TOKEN_RE.captures_iter(input) {
        let negate = std::mem::take(&mut negate_next);
        let token = if let Some(m) = caps.name("keyword").or_else(|| caps.name("cmp")) {
            Comparison::from_symbol(m.as_str()).map(Token::Comparison)
        } else if let Some(m) = caps.name("field") {
            Some(Token::Field(m.as_str().to_string()))
        } else if let Some(m) = caps.name("paren") {
            Some(if m.as_str() == "(" {
                Token::LParen
            } else {
                Token::RParen
            })
        } else if let Some(m) = caps.name("op") {
            LogicalOperator::from_keyword(m.as_str()).map(Token::Operator)
        } else if let Some(m) = caps.name("value") {
            let raw = m.as_str();
            // `status!=done`: the `!` belongs to the comparison.
            match raw.strip_suffix('!') {
                Some(head) if input[m.end()..].starts_with('=') => {
                    negate_next = true;
                    Some(Token::Value(head.to_string()))
                }
                _ => Some(Token::Value(raw.to_string())),
            }
        } else {
            caps.name("dq")
                .or_else(|| caps.name("sq"))
                .map(|m| Token::Value(m.as_str().to_string()))
        };

        let Some(token) = token else { continue };
        if negate && token == Token::Comparison(Comparison::Equals) {
            tokens.push(Token::Comparison(Comparison::NotEquals));
        } else {
            tokens.push(token);
        }
    }

    tokens
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// One field/comparison/value unit.
///
/// `operator` joins this query's result to the running result when the
/// list is folded; it is recorded on the left-hand query of `a AND b`.
/// An empty `field` is a free-text term matched against every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub field: String,
    pub comparison: Comparison,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<LogicalOperator>,
}

#[derive(Default)]
struct PendingQuery {
    field: Option<String>,
    comparison: Option<Comparison>,
    operator: Option<LogicalOperator>,
}

impl PendingQuery {
    fn complete(&mut self, value: String) -> ParsedQuery {
        let field = self.field.take().unwrap_or_default();
        let comparison = self.comparison.take().unwrap_or(if field.is_empty() {
            Comparison::Contains
        } else {
            Comparison::Equals
        });
        ParsedQuery {
            field,
            comparison,
            value,
            operator: self.operator.take(),
        }
    }
}

/// Tokenize and parse a query string.
pub fn parse_query(input: &str) -> Vec<ParsedQuery> {
    parse_tokens(&tokenize(input))
}

pub fn parse_tokens(tokens: &[Token]) -> Vec<ParsedQuery> {
    let mut queries = Vec::new();
    let mut pending = PendingQuery::default();
    let mut iter = tokens.iter().peekable();

    while let Some(token) = iter.next() {
        match token {
            Token::Field(name) => pending.field = Some(name.clone()),
            Token::Comparison(comparison) => pending.comparison = Some(*comparison),
            Token::Operator(op) => pending.operator = Some(*op),
            Token::LParen | Token::RParen => {}
            Token::Value(value) => {
                // `date>=...`: a bare word directly before a comparison names the field.
                if pending.field.is_none()
                    && pending.comparison.is_none()
                    && matches!(iter.peek(), Some(Token::Comparison(_)))
                {
                    pending.field = Some(value.clone());
                    continue;
                }

                let mut query = pending.complete(value.clone());
                if let Some(Token::Operator(op)) = iter.peek() {
                    query.operator = Some(*op);
                    iter.next();
                }
                queries.push(query);
            }
        }
    }

    queries
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Fold `queries` over one record, starting from `true`.
///
/// `AND` gives `result && m`, `OR` gives `result || m`, `NOT` gives
/// `result && !m`, and a query without an operator overwrites the result.
pub fn matches_parsed_query(record: &Record, queries: &[ParsedQuery]) -> bool {
    queries.iter().fold(true, |result, query| {
        let matched = query_matches(record, query);
        match query.operator {
            Some(LogicalOperator::And) => result && matched,
            Some(LogicalOperator::Or) => result || matched,
            Some(LogicalOperator::Not) => result && !matched,
            None => matched,
        }
    })
}

/// Keep the records for which the folded result is `true`.
pub fn apply_parsed_query(data: &[Record], queries: &[ParsedQuery]) -> Vec<Record> {
    data.iter()
        .filter(|record| matches_parsed_query(record, queries))
        .cloned()
        .collect()
}

/// Parse `input` and apply it to `data`.
pub fn search(data: &[Record], input: &str) -> Vec<Record> {
    let queries = parse_query(input);
    let results = apply_parsed_query(data, &queries);
    tracing::debug!(
        queries = queries.len(),
        total = data.len(),
        matched = results.len(),
        "Search applied"
    );
    results
}

fn query_matches(record: &Record, query: &ParsedQuery) -> bool {
    if query.field.is_empty() {
        return record
            .values()
            .any(|value| compare(Some(value), query.comparison, &query.value));
    }
    compare(record.get(&query.field), query.comparison, &query.value)
}

/// Compare a field against the query text using the field's own type.
fn compare(field: Option<&Value>, comparison: Comparison, expected: &str) -> bool {
    let Some(field) = field else {
        return comparison == Comparison::NotEquals;
    };

    match comparison {
        Comparison::Contains => text(field).contains(&expected.to_lowercase()),
        Comparison::StartsWith => text(field).starts_with(&expected.to_lowercase()),
        Comparison::EndsWith => text(field).ends_with(&expected.to_lowercase()),
        Comparison::Equals => native_order(field, expected) == Some(Ordering::Equal),
        Comparison::NotEquals => native_order(field, expected) != Some(Ordering::Equal),
        Comparison::GreaterThan => native_order(field, expected) == Some(Ordering::Greater),
        Comparison::LessThan => native_order(field, expected) == Some(Ordering::Less),
        Comparison::GreaterOrEqual => matches!(
            native_order(field, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Comparison::LessOrEqual => matches!(
            native_order(field, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

fn text(field: &Value) -> String {
    to_js_string(Some(field)).to_lowercase()
}

/// Strings order lexically and case-sensitively, numbers numerically, and
/// booleans as `true`/`false` text. Other types have no order.
fn native_order(field: &Value, expected: &str) -> Option<Ordering> {
    match field {
        Value::String(s) => Some(s.as_str().cmp(expected)),
        Value::Number(n) => {
            let wanted = to_number(Some(&Value::String(expected.to_string())));
            n.as_f64()?.partial_cmp(&wanted)
        }
        Value::Bool(b) => Some(b.to_string().as_str().cmp(expected)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
