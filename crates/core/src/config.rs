//! History bounds configuration.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default number of undo steps kept by a [`HistoryStack`](crate::history::HistoryStack).
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Default number of entries kept in a [`HistoryLog`](crate::history::HistoryLog).
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Env var overriding [`HistoryConfig::max_history`].
pub const ENV_MAX_HISTORY: &str = "OPSDASH_MAX_HISTORY";

/// Env var overriding [`HistoryConfig::max_entries`].
pub const ENV_MAX_ENTRIES: &str = "OPSDASH_MAX_HISTORY_ENTRIES";

/// Bounds applied to undo stacks and audit history logs.
///
/// Defaults suit the dashboard's editors; override via environment variables
/// when embedding the core somewhere with different memory constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Maximum length of the undo (`past`) stack.
    pub max_history: usize,
    /// Maximum number of entries retained in the audit log.
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl HistoryConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default |
    /// |-------------------------------|---------|
    /// | `OPSDASH_MAX_HISTORY`         | `50`    |
    /// | `OPSDASH_MAX_HISTORY_ENTRIES` | `100`   |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            max_history: parse_bound(&lookup, ENV_MAX_HISTORY, DEFAULT_MAX_HISTORY)?,
            max_entries: parse_bound(&lookup, ENV_MAX_ENTRIES, DEFAULT_MAX_ENTRIES)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Both bounds must be at least 1.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_history == 0 {
            return Err(CoreError::Validation(
                "max_history must be at least 1".to_string(),
            ));
        }
        if self.max_entries == 0 {
            return Err(CoreError::Validation(
                "max_entries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_bound<F>(lookup: &F, key: &str, default: usize) -> Result<usize, CoreError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            CoreError::Validation(format!("{key} must be a non-negative integer, got '{raw}'"))
        }),
    }
}
