//! Branching audit history.
//!
//! Every entry becomes a node in an id → node map. The active branch is a
//! cursor (`current_branch`) that grows with [`HistoryGraph::add_entry`] and
//! rewinds with [`HistoryGraph::create_branch`]; nothing is ever deleted, so
//! reverting to an old entry and editing again leaves the abandoned entries
//! reachable as a sibling subtree.
//!
//! [`HistoryGraph::merge_branch`] adds a second incoming edge to a node,
//! turning the forest into a DAG. After a merge a node's `parent_id` and the
//! set of nodes listing it as a child diverge; use
//! [`HistoryGraph::parents_of`] and [`HistoryGraph::ancestors`] rather than
//! following `parent_id` alone.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::entry::{HistoryEntry, HistoryLog};
use crate::config::HistoryConfig;
use crate::diff::{changed_fields, diff_records, FieldDiff};
use crate::error::CoreError;
use crate::types::{EntryId, Record};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Actions owned by the surrounding application.
///
/// `revert` performs the actual data mutation behind a revert; `preview`
/// loads a past version for display. Neither may touch the graph.
#[async_trait]
pub trait HistoryActions: Send + Sync {
    async fn revert(&self, entry_id: &str) -> Result<(), CoreError>;

    async fn preview(&self, entry_id: &str) -> Result<(), CoreError>;
}

// ---------------------------------------------------------------------------
// HistoryNode
// ---------------------------------------------------------------------------

/// A history entry plus its position in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryNode {
    #[serde(flatten)]
    pub entry: HistoryEntry,
    /// The entry that preceded this one on the branch it was added to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EntryId>,
    /// Direct descendants, in the order they were attached.
    #[serde(default)]
    pub children: Vec<EntryId>,
}

impl HistoryNode {
    pub fn id(&self) -> &str {
        &self.entry.id
    }
}

// ---------------------------------------------------------------------------
// HistoryGraph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryGraph {
    log: HistoryLog,
    nodes: HashMap<EntryId, HistoryNode>,
    /// Node ids in insertion order.
    order: Vec<EntryId>,
    root_id: Option<EntryId>,
    current_branch: Vec<EntryId>,
    #[serde(skip)]
    error: Option<String>,
}

impl HistoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            log: HistoryLog::with_max_entries(max_entries),
            ..Self::default()
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self {
            log: HistoryLog::from_config(config),
            ..Self::default()
        }
    }

    // -- mutation ------------------------------------------------------------

    /// Append an entry to the log and attach it to the tip of the active branch.
    pub fn add_entry(&mut self, entry: HistoryEntry) -> Result<(), CoreError> {
        if self.nodes.contains_key(&entry.id) {
            return Err(CoreError::Conflict(format!(
                "History entry '{}' already exists",
                entry.id
            )));
        }

        let id = entry.id.clone();
        let parent_id = self.current_branch.last().cloned();

        if let Some(evicted) = self.log.push(entry.clone()) {
            tracing::trace!(
                entry_id = %evicted.id,
                "History log at capacity, evicted oldest entry"
            );
        }

        if let Some(parent) = parent_id.as_ref().and_then(|p| self.nodes.get_mut(p)) {
            parent.children.push(id.clone());
        }
        self.nodes.insert(
            id.clone(),
            HistoryNode {
                entry,
                parent_id: parent_id.clone(),
                children: Vec::new(),
            },
        );
        self.order.push(id.clone());
        if self.root_id.is_none() {
            self.root_id = Some(id.clone());
        }
        self.current_branch.push(id.clone());

        tracing::debug!(entry_id = %id, parent_id = ?parent_id, "History entry added");
        Ok(())
    }

    /// Rewind the active branch so it ends at `from_entry_id`.
    ///
    /// Returns `false` and leaves the branch untouched when the id is not on
    /// the active branch.
    pub fn create_branch(&mut self, from_entry_id: &str) -> bool {
        match self.current_branch.iter().position(|id| id == from_entry_id) {
            Some(index) => {
                self.current_branch.truncate(index + 1);
                tracing::debug!(
                    entry_id = from_entry_id,
                    branch_len = self.current_branch.len(),
                    "Active branch rewound"
                );
                true
            }
            None => {
                tracing::trace!(
                    entry_id = from_entry_id,
                    "Branch point not on active branch, ignoring"
                );
                false
            }
        }
    }

    /// Record `from_entry_id` as an additional child of `to_entry_id`.
    ///
    /// `from_entry_id`'s own `parent_id` is left unchanged. Returns `false`
    /// when either id is unknown, the ids are equal, the edge already exists,
    /// or the edge would make the graph cyclic.
    pub fn merge_branch(&mut self, from_entry_id: &str, to_entry_id: &str) -> bool {
        if from_entry_id == to_entry_id
            || !self.nodes.contains_key(from_entry_id)
            || !self.nodes.contains_key(to_entry_id)
        {
            tracing::warn!(
                from = from_entry_id,
                to = to_entry_id,
                "Merge rejected: unknown or identical entries"
            );
            return false;
        }
        if self.is_descendant(to_entry_id, from_entry_id) {
            tracing::warn!(
                from = from_entry_id,
                to = to_entry_id,
                "Merge rejected: target descends from source"
            );
            return false;
        }

        let Some(target) = self.nodes.get_mut(to_entry_id) else {
            return false;
        };
        if target.children.iter().any(|c| c == from_entry_id) {
            return false;
        }
        target.children.push(from_entry_id.to_string());
        tracing::debug!(from = from_entry_id, to = to_entry_id, "Branches merged");
        true
    }

    /// Run the application's revert action and, on success, branch from the entry.
    ///
    /// On failure the error message is stored (see [`error`](Self::error))
    /// and the active branch is left as it was.
    pub async fn handle_revert(&mut self, actions: &dyn HistoryActions, entry_id: &str) -> bool {
        self.error = None;

        match self.nodes.get(entry_id).map(|n| n.entry.can_revert) {
            None => {
                self.fail(
                    entry_id,
                    CoreError::NotFound {
                        entity: "history_entry",
                        id: entry_id.to_string(),
                    },
                );
                return false;
            }
            Some(false) => {
                self.fail(
                    entry_id,
                    CoreError::Validation(format!("History entry '{entry_id}' cannot be reverted")),
                );
                return false;
            }
            Some(true) => {}
        }

        match actions.revert(entry_id).await {
            Ok(()) => {
                self.create_branch(entry_id);
                true
            }
            Err(err) => {
                self.fail(entry_id, err);
                false
            }
        }
    }

    /// Run the application's preview action. Never changes the graph.
    ///
    /// An unknown id stores an error without calling the action.
    pub async fn handle_preview(&mut self, actions: &dyn HistoryActions, entry_id: &str) -> bool {
        self.error = None;
        if !self.nodes.contains_key(entry_id) {
            self.fail(
                entry_id,
                CoreError::NotFound {
                    entity: "history_entry",
                    id: entry_id.to_string(),
                },
            );
            return false;
        }
        match actions.preview(entry_id).await {
            Ok(()) => true,
            Err(err) => {
                self.fail(entry_id, err);
                false
            }
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn fail(&mut self, entry_id: &str, err: CoreError) {
        tracing::warn!(entry_id, error = %err, "History action failed");
        self.error = Some(err.to_string());
    }

    // -- queries -------------------------------------------------------------

    /// The message of the last failed revert or preview, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The bounded entry log, oldest first.
    pub fn entries(&self) -> &HistoryLog {
        &self.log
    }

    pub fn node(&self, id: &str) -> Option<&HistoryNode> {
        self.nodes.get(id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &HistoryNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root_id.as_deref()
    }

    pub fn current_branch(&self) -> &[EntryId] {
        &self.current_branch
    }

    /// The tip of the active branch.
    pub fn current_entry_id(&self) -> Option<&str> {
        self.current_branch.last().map(String::as_str)
    }

    pub fn children(&self, id: &str) -> &[EntryId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Every node listing `id` as a child, in insertion order.
    pub fn parents_of(&self, id: &str) -> Vec<&str> {
        self.nodes()
            .filter(|n| n.children.iter().any(|c| c == id))
            .map(HistoryNode::id)
            .collect()
    }

    /// All nodes that can reach `id` through any incoming edge, nearest first.
    pub fn ancestors(&self, id: &str) -> Vec<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut result = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::from(vec![id]);

        while let Some(current) = queue.pop_front() {
            for parent in self.parents_of(current) {
                if parent != id && seen.insert(parent) {
                    result.push(parent);
                    queue.push_back(parent);
                }
            }
        }
        result
    }

    pub fn is_branch_point(&self, id: &str) -> bool {
        self.children(id).len() > 1
    }

    pub fn is_merge_node(&self, id: &str) -> bool {
        self.parents_of(id).len() > 1
    }

    pub fn branch_points(&self) -> Vec<&str> {
        self.nodes()
            .filter(|n| n.children.len() > 1)
            .map(HistoryNode::id)
            .collect()
    }

    pub fn merge_nodes(&self) -> Vec<&str> {
        self.nodes()
            .map(HistoryNode::id)
            .filter(|id| self.is_merge_node(id))
            .collect()
    }

    /// Field-level diff of two entries' metadata, for side-by-side preview.
    pub fn compare(&self, before_id: &str, after_id: &str) -> Result<Vec<FieldDiff>, CoreError> {
        let before = self.metadata_record(before_id)?;
        let after = self.metadata_record(after_id)?;
        Ok(diff_records(&before, &after))
    }

    /// Like [`compare`](Self::compare), keeping only the keys that differ.
    pub fn compare_changed(
        &self,
        before_id: &str,
        after_id: &str,
    ) -> Result<Vec<FieldDiff>, CoreError> {
        let before = self.metadata_record(before_id)?;
        let after = self.metadata_record(after_id)?;
        Ok(changed_fields(&before, &after))
    }

    fn metadata_record(&self, id: &str) -> Result<Record, CoreError> {
        let node = self.nodes.get(id).ok_or_else(|| CoreError::NotFound {
            entity: "history_entry",
            id: id.to_string(),
        })?;
        Ok(node
            .entry
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Whether `candidate` is reachable from `from` through child edges.
    fn is_descendant(&self, candidate: &str, from: &str) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = self.children(from).iter().map(String::as_str).collect();
        while let Some(current) = stack.pop() {
            if current == candidate {
                return true;
            }
            if seen.insert(current) {
                stack.extend(self.children(current).iter().map(String::as_str));
            }
        }
        false
    }
}
