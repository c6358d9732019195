//! Copy-on-write edits of a filter tree.
//!
//! Every function takes the current root by reference and returns a freshly
//! built tree; the input is never mutated. Targets are located by id through
//! recursive descent. An id that matches nothing yields a tree equal to the
//! input.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rules::{Condition, FilterGroup, FilterNode, FilterRule, Operator};

/// Partial update for a rule. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl RuleUpdate {
    fn apply(&self, rule: &mut FilterRule) {
        if let Some(field) = &self.field {
            rule.field = field.clone();
        }
        if let Some(operator) = self.operator {
            rule.operator = operator;
        }
        if let Some(value) = &self.value {
            rule.value = value.clone();
        }
    }
}

/// Append `rule` to the group with id `group_id`.
pub fn add_rule(root: &FilterGroup, group_id: &str, rule: &FilterRule) -> FilterGroup {
    rebuild(root, &|mut group| {
        if group.id == group_id {
            group.rules.push(FilterNode::Rule(rule.clone()));
        }
        group
    })
}

/// Append `group` as a nested child of the group with id `parent_id`.
pub fn add_group(root: &FilterGroup, parent_id: &str, group: &FilterGroup) -> FilterGroup {
    rebuild(root, &|mut parent| {
        if parent.id == parent_id {
            parent.rules.push(FilterNode::Group(group.clone()));
        }
        parent
    })
}

/// Remove the rule or nested group with id `node_id`, wherever it sits.
pub fn remove_rule(root: &FilterGroup, node_id: &str) -> FilterGroup {
    rebuild(root, &|mut group| {
        group.rules.retain(|node| node.id() != node_id);
        group
    })
}

/// Apply `update` to the rule with id `rule_id`.
pub fn update_rule(root: &FilterGroup, rule_id: &str, update: &RuleUpdate) -> FilterGroup {
    rebuild(root, &|mut group| {
        for node in &mut group.rules {
            if let FilterNode::Rule(rule) = node {
                if rule.id == rule_id {
                    update.apply(rule);
                }
            }
        }
        group
    })
}

/// Switch the group with id `group_id` between AND and OR.
pub fn update_group_condition(
    root: &FilterGroup,
    group_id: &str,
    condition: Condition,
) -> FilterGroup {
    rebuild(root, &|mut group| {
        if group.id == group_id {
            group.condition = condition;
        }
        group
    })
}

/// Find a group (the root included) by id.
pub fn find_group<'a>(root: &'a FilterGroup, group_id: &str) -> Option<&'a FilterGroup> {
    if root.id == group_id {
        return Some(root);
    }
    root.rules.iter().find_map(|node| match node {
        FilterNode::Group(g) => find_group(g, group_id),
        FilterNode::Rule(_) => None,
    })
}

/// Find a rule by id anywhere in the tree.
pub fn find_rule<'a>(root: &'a FilterGroup, rule_id: &str) -> Option<&'a FilterRule> {
    root.rules.iter().find_map(|node| match node {
        FilterNode::Rule(r) if r.id == rule_id => Some(r),
        FilterNode::Rule(_) => None,
        FilterNode::Group(g) => find_rule(g, rule_id),
    })
}

/// Rebuild the tree bottom-up, passing every rebuilt group through `edit`.
fn rebuild<F>(group: &FilterGroup, edit: &F) -> FilterGroup
where
    F: Fn(FilterGroup) -> FilterGroup,
{
    let rules = group
        .rules
        .iter()
        .map(|node| match node {
            FilterNode::Rule(rule) => FilterNode::Rule(rule.clone()),
            FilterNode::Group(child) => FilterNode::Group(rebuild(child, edit)),
        })
        .collect();

    edit(FilterGroup {
        id: group.id.clone(),
        condition: group.condition,
        rules,
    })
}
