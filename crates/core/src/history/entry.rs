//! Audit-log entries and the bounded append-only log that holds them.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{HistoryConfig, DEFAULT_MAX_ENTRIES};
use crate::filter::{evaluate_group, FilterGroup};
use crate::search;
use crate::types::{new_id, EntryId, Record, Timestamp};

// ---------------------------------------------------------------------------
// Entry types
// ---------------------------------------------------------------------------

/// The kind of user-visible mutation an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Create,
    Update,
    Delete,
    Restore,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Restore => "restore",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user who performed a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryUser {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl HistoryUser {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: None,
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

// ---------------------------------------------------------------------------
// HistoryEntry
// ---------------------------------------------------------------------------

/// One user-visible mutation. Immutable once appended to a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: EntryId,
    pub timestamp: Timestamp,
    pub description: String,
    pub user: HistoryUser,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Displayed key/value details, e.g. the changed fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub can_revert: bool,
}

impl HistoryEntry {
    /// Create a revertable entry stamped with a fresh id and the current time.
    pub fn new(entry_type: EntryType, description: impl Into<String>, user: HistoryUser) -> Self {
        Self {
            id: new_id(),
            timestamp: Utc::now(),
            description: description.into(),
            user,
            entry_type,
            metadata: BTreeMap::new(),
            can_revert: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<EntryId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn not_revertable(mut self) -> Self {
        self.can_revert = false;
        self
    }

    /// Flatten the entry into a searchable record.
    ///
    /// Exposes `id`, `timestamp` (RFC 3339), `date` (`YYYY-MM-DD`, so
    /// `date>=2024-01-01` compares lexically), `description`, `user` (the
    /// name), `type` and `canRevert`. Metadata keys are merged in unless
    /// they collide with one of those.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        for (key, value) in &self.metadata {
            record.insert(key.clone(), value.clone());
        }
        record.insert("id".into(), self.id.clone().into());
        record.insert("timestamp".into(), self.timestamp.to_rfc3339().into());
        record.insert(
            "date".into(),
            self.timestamp.format("%Y-%m-%d").to_string().into(),
        );
        record.insert("description".into(), self.description.clone().into());
        record.insert("user".into(), self.user.name.clone().into());
        record.insert("type".into(), self.entry_type.as_str().into());
        record.insert("canRevert".into(), self.can_revert.into());
        record
    }
}

// ---------------------------------------------------------------------------
// HistoryLog
// ---------------------------------------------------------------------------

/// Append-only entry sequence capped at `max_entries`, oldest dropped first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl HistoryLog {
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::with_max_entries(config.max_entries)
    }

    /// Append an entry, returning the evicted one if the cap was exceeded.
    pub fn push(&mut self, entry: HistoryEntry) -> Option<HistoryEntry> {
        self.entries.push_back(entry);
        if self.entries.len() > self.max_entries {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Entries matching a free-text query such as `type:update AND user:john`.
    pub fn search(&self, query: &str) -> Vec<&HistoryEntry> {
        let queries = search::parse_query(query);
        self.entries
            .iter()
            .filter(|e| search::matches_parsed_query(&e.to_record(), &queries))
            .collect()
    }

    /// Entries passing a rule tree. An empty root group passes everything.
    pub fn filter(&self, group: &FilterGroup) -> Vec<&HistoryEntry> {
        if group.rules.is_empty() {
            return self.entries.iter().collect();
        }
        self.entries
            .iter()
            .filter(|e| evaluate_group(&e.to_record(), group))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::filter::{Condition, FilterRule, Operator};

    fn entry(id: &str, kind: EntryType, user: &str) -> HistoryEntry {
        HistoryEntry::new(kind, format!("{kind} by {user}"), HistoryUser::new(user)).with_id(id)
    }

    #[test]
    fn entry_type_display() {
        assert_eq!(EntryType::Restore.to_string(), "restore");
        assert_eq!(EntryType::Create.as_str(), "create");
    }

    #[test]
    fn entry_serializes_with_wire_names() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let e = entry("e1", EntryType::Update, "john")
            .with_timestamp(ts)
            .with_metadata("status", "confirmed");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "update");
        assert_eq!(json["canRevert"], true);
        assert_eq!(json["metadata"]["status"], "confirmed");
        assert!(json["user"].get("avatar").is_none());
    }

    #[test]
    fn empty_metadata_is_omitted() {
        let json = serde_json::to_value(entry("e1", EntryType::Create, "amy")).unwrap();
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn record_flattens_user_and_date() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 5, 8, 30, 0).unwrap();
        let record = entry("e1", EntryType::Delete, "amy")
            .with_timestamp(ts)
            .with_metadata("venue", "Hall A")
            .with_metadata("user", "spoofed")
            .to_record();
        assert_eq!(record["user"], json!("amy"));
        assert_eq!(record["date"], json!("2024-01-05"));
        assert_eq!(record["type"], json!("delete"));
        assert_eq!(record["venue"], json!("Hall A"));
    }

    #[test]
    fn log_evicts_oldest_first() {
        let mut log = HistoryLog::with_max_entries(2);
        assert!(log.push(entry("a", EntryType::Create, "amy")).is_none());
        assert!(log.push(entry("b", EntryType::Update, "amy")).is_none());
        let evicted = log.push(entry("c", EntryType::Update, "amy")).unwrap();
        assert_eq!(evicted.id, "a");
        let ids: Vec<&str> = log.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(log.latest().unwrap().id, "c");
    }

    #[test]
    fn log_search_uses_query_language() {
        let mut log = HistoryLog::default();
        log.push(entry("a", EntryType::Update, "john"));
        log.push(entry("b", EntryType::Create, "john"));
        log.push(entry("c", EntryType::Update, "mary"));

        let hits: Vec<&str> = log
            .search("type:update")
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(hits, vec!["a", "c"]);
    }

    #[test]
    fn log_filter_uses_rule_tree() {
        let mut log = HistoryLog::default();
        log.push(entry("a", EntryType::Update, "john"));
        log.push(entry("b", EntryType::Delete, "mary"));

        let group = FilterGroup::new(Condition::And).with_rule(FilterRule::new(
            "type",
            Operator::In,
            json!(["delete", "restore"]),
        ));
        let hits = log.filter(&group);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");

        assert_eq!(log.filter(&FilterGroup::new(Condition::Or)).len(), 2);
    }
}
