//! Filter rule and group types.
//!
//! The wire shape matches the dashboard's saved filters: a group is any
//! object carrying `condition`, everything else is a rule.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::{new_id, EntryId};

/// Field-level comparison applied by a [`FilterRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    /// Inclusive `[min, max]`.
    Between,
    In,
    NotIn,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Operator::Equals,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::Between,
        Operator::In,
        Operator::NotIn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::GreaterThan => "greaterThan",
            Self::LessThan => "lessThan",
            Self::Between => "between",
            Self::In => "in",
            Self::NotIn => "notIn",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a group combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    And,
    Or,
}

// ---------------------------------------------------------------------------
// FilterRule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    pub id: EntryId,
    pub field: String,
    pub operator: Operator,
    /// Scalar, except a 2-element array for `between` and an array for
    /// `in`/`notIn`.
    pub value: Value,
}

impl FilterRule {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            id: new_id(),
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<EntryId>) -> Self {
        self.id = id.into();
        self
    }

    /// Check the rule is well-formed for form feedback.
    ///
    /// Evaluation never calls this: malformed rules fall back to fail-safe
    /// results instead.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.field.trim().is_empty() {
            return Err(CoreError::Validation(
                "Filter field must not be empty".to_string(),
            ));
        }
        match self.operator {
            Operator::Between => match self.value.as_array() {
                Some(bounds) if bounds.len() == 2 => Ok(()),
                _ => Err(CoreError::Validation(format!(
                    "'between' on '{}' requires a [min, max] pair",
                    self.field
                ))),
            },
            Operator::In | Operator::NotIn if !self.value.is_array() => {
                Err(CoreError::Validation(format!(
                    "'{}' on '{}' requires a list of values",
                    self.operator, self.field
                )))
            }
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// FilterGroup / FilterNode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub id: EntryId,
    pub condition: Condition,
    #[serde(default)]
    pub rules: Vec<FilterNode>,
}

/// A child of a group: either a leaf rule or a nested group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterNode {
    Group(FilterGroup),
    Rule(FilterRule),
}

impl FilterNode {
    pub fn id(&self) -> &str {
        match self {
            Self::Group(g) => &g.id,
            Self::Rule(r) => &r.id,
        }
    }
}

impl From<FilterRule> for FilterNode {
    fn from(rule: FilterRule) -> Self {
        Self::Rule(rule)
    }
}

impl From<FilterGroup> for FilterNode {
    fn from(group: FilterGroup) -> Self {
        Self::Group(group)
    }
}

impl Default for FilterGroup {
    fn default() -> Self {
        Self::new(Condition::And)
    }
}

impl FilterGroup {
    /// An empty group with a fresh id.
    pub fn new(condition: Condition) -> Self {
        Self {
            id: new_id(),
            condition,
            rules: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<EntryId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_rule(mut self, rule: FilterRule) -> Self {
        self.rules.push(FilterNode::Rule(rule));
        self
    }

    pub fn with_group(mut self, group: FilterGroup) -> Self {
        self.rules.push(FilterNode::Group(group));
        self
    }

    /// Number of leaf rules in the whole subtree.
    pub fn rule_count(&self) -> usize {
        self.rules
            .iter()
            .map(|node| match node {
                FilterNode::Rule(_) => 1,
                FilterNode::Group(g) => g.rule_count(),
            })
            .sum()
    }

    /// Validate every rule in the subtree, stopping at the first error.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.rules.iter().try_for_each(|node| match node {
            FilterNode::Rule(r) => r.validate(),
            FilterNode::Group(g) => g.validate(),
        })
    }
}
