//! Undo/redo state history and the branching audit-history graph.
//!
//! - [`stack`]: generic bounded undo/redo over any value type.
//! - [`entry`]: audit entries and the bounded append-only log.
//! - [`graph`]: branch/merge tracking over entries, with injected
//!   revert/preview actions.

pub mod entry;
pub mod graph;
pub mod stack;

pub use entry::{EntryType, HistoryEntry, HistoryLog, HistoryUser};
pub use graph::{HistoryActions, HistoryGraph, HistoryNode};
pub use stack::{HistoryStack, HistoryState, StateChangeCallback};
