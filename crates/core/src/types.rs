/// Identifiers for history entries, filter rules, groups and presets.
pub type EntryId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A plain data record as handed over by the UI layer.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Generate a fresh random identifier.
pub fn new_id() -> EntryId {
    uuid::Uuid::new_v4().to_string()
}
