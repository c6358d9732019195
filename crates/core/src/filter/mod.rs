//! Composable filter engine.
//!
//! Provides rule/group types, a pure evaluator, copy-on-write tree edits, and
//! [`FilterEngine`], the stateful wrapper a list view owns.

pub mod evaluator;
pub mod rules;
pub mod tree;

use std::fmt;

pub use evaluator::{evaluate_group, evaluate_node, evaluate_rule, filter_records};
pub use rules::{Condition, FilterGroup, FilterNode, FilterRule, Operator};
pub use tree::RuleUpdate;

use crate::types::Record;

/// Callback fired once per [`FilterEngine::filter_data`] call.
pub type FilterChangeCallback = Box<dyn FnMut(&[Record]) + Send>;

/// Owns the root filter group of one list view.
///
/// Tree edits replace the root with a rebuilt tree; each returns `true`
/// when the new tree differs from the old one.
pub struct FilterEngine {
    root: FilterGroup,
    on_filter_change: Option<FilterChangeCallback>,
}

impl fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterEngine")
            .field("root", &self.root)
            .field("has_callback", &self.on_filter_change.is_some())
            .finish()
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(FilterGroup::new(Condition::And))
    }
}

impl FilterEngine {
    pub fn new(root: FilterGroup) -> Self {
        Self {
            root,
            on_filter_change: None,
        }
    }

    pub fn on_filter_change<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&[Record]) + Send + 'static,
    {
        self.on_filter_change = Some(Box::new(callback));
        self
    }

    pub fn root(&self) -> &FilterGroup {
        &self.root
    }

    pub fn set_root(&mut self, root: FilterGroup) {
        self.root = root;
    }

    /// Apply the current tree to `items`.
    pub fn filter_data(&mut self, items: &[Record]) -> Vec<Record> {
        let filtered = filter_records(items, &self.root);
        tracing::debug!(
            total = items.len(),
            kept = filtered.len(),
            rules = self.root.rule_count(),
            "Filter applied"
        );
        if let Some(callback) = self.on_filter_change.as_mut() {
            callback(&filtered);
        }
        filtered
    }

    pub fn evaluate(&self, item: &Record) -> bool {
        evaluate_group(item, &self.root)
    }

    // -- tree edits ----------------------------------------------------------

    pub fn add_rule(&mut self, group_id: &str, rule: FilterRule) -> bool {
        self.replace(tree::add_rule(&self.root, group_id, &rule))
    }

    pub fn add_group(&mut self, parent_id: &str, group: FilterGroup) -> bool {
        self.replace(tree::add_group(&self.root, parent_id, &group))
    }

    pub fn remove_rule(&mut self, node_id: &str) -> bool {
        self.replace(tree::remove_rule(&self.root, node_id))
    }

    pub fn update_rule(&mut self, rule_id: &str, update: &RuleUpdate) -> bool {
        self.replace(tree::update_rule(&self.root, rule_id, update))
    }

    pub fn update_group_condition(&mut self, group_id: &str, condition: Condition) -> bool {
        self.replace(tree::update_group_condition(&self.root, group_id, condition))
    }

    /// Drop every rule, keeping the root id and condition.
    pub fn clear(&mut self) -> bool {
        let cleared = FilterGroup {
            id: self.root.id.clone(),
            condition: self.root.condition,
            rules: Vec::new(),
        };
        self.replace(cleared)
    }

    fn replace(&mut self, next: FilterGroup) -> bool {
        if next == self.root {
            return false;
        }
        self.root = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;

    fn items() -> Vec<Record> {
        vec![
            json!({"name": "Gala", "capacity": 300}),
            json!({"name": "Brunch", "capacity": 40}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect()
    }

    #[test]
    fn default_engine_passes_everything() {
        let mut engine = FilterEngine::default();
        assert_eq!(engine.filter_data(&items()).len(), 2);
    }

    #[test]
    fn edits_change_results() {
        let mut engine = FilterEngine::new(FilterGroup::new(Condition::And).with_id("root"));
        let rule = FilterRule::new("capacity", Operator::GreaterThan, 100).with_id("big");
        assert!(engine.add_rule("root", rule));
        assert_eq!(engine.filter_data(&items()).len(), 1);

        assert!(engine.remove_rule("big"));
        assert_eq!(engine.filter_data(&items()).len(), 2);
    }

    #[test]
    fn edit_with_unknown_id_reports_no_change() {
        let mut engine = FilterEngine::default();
        let rule = FilterRule::new("capacity", Operator::GreaterThan, 100);
        assert!(!engine.add_rule("missing", rule));
        assert!(!engine.clear());
    }

    #[test]
    fn callback_receives_filtered_items() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let root = FilterGroup::new(Condition::And).with_rule(FilterRule::new(
            "name",
            Operator::StartsWith,
            "br",
        ));
        let mut engine = FilterEngine::new(root)
            .on_filter_change(move |filtered: &[Record]| sink.lock().unwrap().push(filtered.len()));

        engine.filter_data(&items());
        engine.filter_data(&[]);

        assert_eq!(*seen.lock().unwrap(), vec![1, 0]);
    }
}
