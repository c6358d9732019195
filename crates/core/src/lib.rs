//! Client-side core of the operations dashboard.
//!
//! Everything here is pure data manipulation over small in-memory
//! collections: undo/redo history, the branching audit-history graph, the
//! rule-tree filter engine, the free-text search language, and saved filter
//! presets. No module performs I/O; storage and the revert/preview actions
//! are injected by the surrounding application.

pub mod config;
pub mod diff;
pub mod error;
pub mod filter;
pub mod history;
pub mod preset;
pub mod search;
pub mod storage;
pub mod types;

pub use config::HistoryConfig;
pub use error::CoreError;
pub use filter::{Condition, FilterEngine, FilterGroup, FilterNode, FilterRule, Operator};
pub use history::{HistoryActions, HistoryEntry, HistoryGraph, HistoryStack, HistoryState};
pub use search::{apply_parsed_query, parse_query, search, ParsedQuery};
