//! Saved filter presets.
//!
//! A preset is a named rule tree or text query. Presets for one list view
//! are stored together as a JSON array under a namespaced key in the
//! injected [`KeyValueStore`].

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::filter::{filter_records, FilterGroup};
use crate::search;
use crate::storage::{load_json, save_json, KeyValueStore};
use crate::types::{new_id, EntryId, Record, Timestamp};

/* --------------------------------------------------------------------------
   Validation limits
   -------------------------------------------------------------------------- */

/// Maximum length for a preset name.
pub const MAX_PRESET_NAME_LEN: usize = 200;

/// Maximum length for a preset description.
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// Validate a preset name: non-empty and within length limit.
pub fn validate_preset_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Preset name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_PRESET_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Preset name too long: {} chars (max {MAX_PRESET_NAME_LEN})",
            name.len()
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
   Types
   -------------------------------------------------------------------------- */

/// What a preset stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PresetFilter {
    Rules { group: FilterGroup },
    Query { query: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPreset {
    pub id: EntryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub filter: PresetFilter,
    pub created_at: Timestamp,
}

impl FilterPreset {
    pub fn from_rules(name: impl Into<String>, group: FilterGroup) -> Self {
        Self::new(name, PresetFilter::Rules { group })
    }

    pub fn from_query(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self::new(
            name,
            PresetFilter::Query {
                query: query.into(),
            },
        )
    }

    fn new(name: impl Into<String>, filter: PresetFilter) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            description: None,
            filter,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_preset_name(&self.name)?;
        if let Some(description) = &self.description {
            if description.len() > MAX_DESCRIPTION_LEN {
                return Err(CoreError::Validation(format!(
                    "Preset description too long: {} chars (max {MAX_DESCRIPTION_LEN})",
                    description.len()
                )));
            }
        }
        match &self.filter {
            PresetFilter::Rules { group } => group.validate(),
            PresetFilter::Query { .. } => Ok(()),
        }
    }

    /// Run the stored filter over `records`.
    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        match &self.filter {
            PresetFilter::Rules { group } => filter_records(records, group),
            PresetFilter::Query { query } => search::search(records, query),
        }
    }
}

/* --------------------------------------------------------------------------
   Store
   -------------------------------------------------------------------------- */

/// Presets for one namespace (typically one list view).
#[derive(Debug)]
pub struct PresetStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> PresetStore<S> {
    pub fn new(store: S, namespace: &str) -> Self {
        Self {
            store,
            key: format!("{namespace}:filter-presets"),
        }
    }

    /// All presets, in save order.
    pub fn list(&self) -> Result<Vec<FilterPreset>, CoreError> {
        Ok(load_json(&self.store, &self.key)?.unwrap_or_default())
    }

    pub fn get(&self, id: &str) -> Result<Option<FilterPreset>, CoreError> {
        Ok(self.list()?.into_iter().find(|p| p.id == id))
    }

    /// Insert or replace (by id) a preset.
    ///
    /// Names are unique per namespace, compared case-insensitively.
    pub fn save(&self, preset: FilterPreset) -> Result<(), CoreError> {
        preset.validate()?;
        let mut presets = self.list()?;

        let wanted = preset.name.trim().to_lowercase();
        if presets
            .iter()
            .any(|p| p.id != preset.id && p.name.trim().to_lowercase() == wanted)
        {
            return Err(CoreError::Conflict(format!(
                "A preset named '{}' already exists",
                preset.name
            )));
        }

        match presets.iter_mut().find(|p| p.id == preset.id) {
            Some(existing) => *existing = preset,
            None => presets.push(preset),
        }
        save_json(&self.store, &self.key, &presets)?;
        tracing::debug!(key = %self.key, count = presets.len(), "Filter presets saved");
        Ok(())
    }

    /// Delete a preset. Returns `false` when no preset had that id.
    pub fn delete(&self, id: &str) -> Result<bool, CoreError> {
        let mut presets = self.list()?;
        let before = presets.len();
        presets.retain(|p| p.id != id);
        if presets.len() == before {
            return Ok(false);
        }
        if presets.is_empty() {
            self.store.remove(&self.key)?;
        } else {
            save_json(&self.store, &self.key, &presets)?;
        }
        Ok(true)
    }
}

/* --------------------------------------------------------------------------
   Tests
   -------------------------------------------------------------------------- */
