//! Key-by-key record comparison used when previewing history versions.

use serde::{Deserialize, Serialize};

use crate::types::Record;

/// The status of a key in a diff comparison.
///
/// - `Added`     -- present only in the newer record.
/// - `Removed`   -- present only in the older record.
/// - `Changed`   -- present in both with different values.
/// - `Unchanged` -- present in both with identical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Added,
    Removed,
    Changed,
    Unchanged,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
        }
    }
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single key difference between two records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub key: String,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub status: DiffStatus,
}

/// Compare two records key-by-key, sorted by key name.
pub fn diff_records(before: &Record, after: &Record) -> Vec<FieldDiff> {
    let mut keys: Vec<&String> = before.keys().chain(after.keys()).collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter_map(|key| {
            let status = match (before.get(key), after.get(key)) {
                (Some(a), Some(b)) if a == b => DiffStatus::Unchanged,
                (Some(_), Some(_)) => DiffStatus::Changed,
                (Some(_), None) => DiffStatus::Removed,
                (None, Some(_)) => DiffStatus::Added,
                (None, None) => return None,
            };
            Some(FieldDiff {
                key: key.clone(),
                before: before.get(key).cloned(),
                after: after.get(key).cloned(),
                status,
            })
        })
        .collect()
}

/// Only the keys that differ.
pub fn changed_fields(before: &Record, after: &Record) -> Vec<FieldDiff> {
    diff_records(before, after)
        .into_iter()
        .filter(|d| d.status != DiffStatus::Unchanged)
        .collect()
}
