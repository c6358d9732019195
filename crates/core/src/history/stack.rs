//! Bounded two-stack undo/redo container.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{HistoryConfig, DEFAULT_MAX_HISTORY};

/// Callback fired after every state transition with the new present value.
pub type StateChangeCallback<T> = Box<dyn FnMut(&T) + Send>;

/// The past/present/future triple.
///
/// `past` is ordered oldest first, `future` nearest redo first. Both
/// serialize as plain JSON arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryState<T> {
    pub past: VecDeque<T>,
    pub present: T,
    pub future: VecDeque<T>,
}

impl<T> HistoryState<T> {
    /// A fresh state with empty undo and redo stacks.
    pub fn new(present: T) -> Self {
        Self {
            past: VecDeque::new(),
            present,
            future: VecDeque::new(),
        }
    }
}

/// Generic undo/redo history over any value type.
///
/// New edits go through [`set_state`](Self::set_state), which discards the
/// redo lineage. [`undo`](Self::undo) and [`redo`](Self::redo) only move
/// values between the two stacks, so `past.len() + future.len()` is conserved
/// across them; the `max_history` bound is enforced on `set_state` alone.
pub struct HistoryStack<T> {
    state: HistoryState<T>,
    max_history: usize,
    on_state_change: Option<StateChangeCallback<T>>,
}

impl<T: fmt::Debug> fmt::Debug for HistoryStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStack")
            .field("state", &self.state)
            .field("max_history", &self.max_history)
            .field("has_callback", &self.on_state_change.is_some())
            .finish()
    }
}

impl<T> HistoryStack<T> {
    /// Start a history at `initial` with the default bound of 50 undo steps.
    pub fn new(initial: T) -> Self {
        Self::with_max_history(initial, DEFAULT_MAX_HISTORY)
    }

    pub fn with_max_history(initial: T, max_history: usize) -> Self {
        Self {
            state: HistoryState::new(initial),
            max_history,
            on_state_change: None,
        }
    }

    pub fn from_config(initial: T, config: &HistoryConfig) -> Self {
        Self::with_max_history(initial, config.max_history)
    }

    /// Resume from a persisted snapshot, trimming `past` to the bound.
    pub fn from_state(mut state: HistoryState<T>, max_history: usize) -> Self {
        truncate_front(&mut state.past, max_history);
        Self {
            state,
            max_history,
            on_state_change: None,
        }
    }

    /// Install the callback fired after each transition.
    pub fn on_state_change<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&T) + Send + 'static,
    {
        self.on_state_change = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> &HistoryState<T> {
        &self.state
    }

    pub fn into_state(self) -> HistoryState<T> {
        self.state
    }

    pub fn present(&self) -> &T {
        &self.state.present
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn can_undo(&self) -> bool {
        !self.state.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.state.future.is_empty()
    }

    /// Record a new present value. Clears the redo stack.
    pub fn set_state(&mut self, new_state: T) {
        let previous = std::mem::replace(&mut self.state.present, new_state);
        self.state.past.push_back(previous);
        truncate_front(&mut self.state.past, self.max_history);
        self.state.future.clear();
        tracing::trace!(
            past = self.state.past.len(),
            max_history = self.max_history,
            "History state pushed"
        );
        self.notify();
    }

    /// Step back one state. No-op when there is nothing to undo.
    pub fn undo(&mut self) -> &T {
        let Some(previous) = self.state.past.pop_back() else {
            tracing::trace!("Undo requested with empty past, ignoring");
            return &self.state.present;
        };
        let current = std::mem::replace(&mut self.state.present, previous);
        self.state.future.push_front(current);
        self.notify();
        &self.state.present
    }

    /// Step forward one state. No-op when there is nothing to redo.
    pub fn redo(&mut self) -> &T {
        let Some(next) = self.state.future.pop_front() else {
            tracing::trace!("Redo requested with empty future, ignoring");
            return &self.state.present;
        };
        let current = std::mem::replace(&mut self.state.present, next);
        self.state.past.push_back(current);
        self.notify();
        &self.state.present
    }

    /// Drop both stacks and start over at `initial`.
    pub fn reset(&mut self, initial: T) {
        self.state = HistoryState::new(initial);
        self.notify();
    }

    fn notify(&mut self) {
        if let Some(callback) = self.on_state_change.as_mut() {
            callback(&self.state.present);
        }
    }
}

/// Evict oldest entries until `stack.len() <= max`.
fn truncate_front<T>(stack: &mut VecDeque<T>, max: usize) {
    while stack.len() > max {
        stack.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn pushed(values: &[i32], max: usize) -> HistoryStack<i32> {
        let mut history = HistoryStack::with_max_history(0, max);
        for v in values {
            history.set_state(*v);
        }
        history
    }

    // -- set_state -----------------------------------------------------------

    #[test]
    fn new_history_has_nothing_to_undo_or_redo() {
        let history = HistoryStack::new("draft".to_string());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.present(), "draft");
        assert_eq!(history.max_history(), DEFAULT_MAX_HISTORY);
    }

    #[test]
    fn set_state_moves_present_to_past() {
        let history = pushed(&[1, 2], 10);
        assert_eq!(*history.present(), 2);
        assert_eq!(history.state().past, VecDeque::from(vec![0, 1]));
    }

    #[test]
    fn set_state_evicts_oldest_beyond_bound() {
        let history = pushed(&[1, 2, 3, 4, 5], 3);
        assert_eq!(history.state().past, VecDeque::from(vec![2, 3, 4]));
        assert_eq!(*history.present(), 5);
    }

    #[test]
    fn set_state_after_undo_clears_future() {
        let mut history = pushed(&[1, 2], 10);
        history.undo();
        assert!(history.can_redo());

        history.set_state(9);
        assert!(!history.can_redo());
        assert_eq!(*history.redo(), 9);
    }

    // -- undo / redo ---------------------------------------------------------

    #[test]
    fn undo_on_empty_past_is_noop() {
        let mut history = HistoryStack::new(7);
        assert_eq!(*history.undo(), 7);
        assert!(!history.can_redo());
    }

    #[test]
    fn redo_on_empty_future_is_noop() {
        let mut history = pushed(&[1], 10);
        assert_eq!(*history.redo(), 1);
        assert_eq!(history.state().past.len(), 1);
    }

    #[test]
    fn undo_then_redo_restores_value() {
        let mut history = pushed(&[10, 20, 30], 10);
        assert_eq!(*history.undo(), 20);
        assert_eq!(*history.undo(), 10);
        assert_eq!(history.state().future, VecDeque::from(vec![20, 30]));
        assert_eq!(*history.redo(), 20);
        assert_eq!(*history.redo(), 30);
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_does_not_truncate_beyond_bound() {
        let mut history = pushed(&[1, 2, 3], 2);
        history.undo();
        history.undo();
        history.redo();
        history.redo();
        assert_eq!(history.state().past, VecDeque::from(vec![1, 2]));
    }

    // -- reset ---------------------------------------------------------------

    #[test]
    fn reset_clears_both_stacks() {
        let mut history = pushed(&[1, 2, 3], 10);
        history.undo();
        history.reset(100);
        assert_eq!(*history.present(), 100);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    // -- callback ------------------------------------------------------------

    #[test]
    fn callback_fires_once_per_transition() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut history =
            HistoryStack::new(0).on_state_change(move |v: &i32| sink.lock().unwrap().push(*v));

        history.set_state(1);
        history.set_state(2);
        history.undo();
        history.redo();
        history.reset(5);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 1, 2, 5]);
    }

    #[test]
    fn callback_not_fired_on_noop() {
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let mut history =
            HistoryStack::new(0).on_state_change(move |_: &i32| *sink.lock().unwrap() += 1);

        history.undo();
        history.redo();

        assert_eq!(*count.lock().unwrap(), 0);
    }

    // -- snapshots -----------------------------------------------------------

    #[test]
    fn from_state_trims_past_to_bound() {
        let state = HistoryState {
            past: VecDeque::from(vec![1, 2, 3, 4]),
            present: 5,
            future: VecDeque::from(vec![6]),
        };
        let history = HistoryStack::from_state(state, 2);
        assert_eq!(history.state().past, VecDeque::from(vec![3, 4]));
        assert!(history.can_redo());
    }

    #[test]
    fn state_serializes_as_plain_arrays() {
        let history = pushed(&[1, 2], 10);
        let json = serde_json::to_value(history.state()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"past": [0, 1], "present": 2, "future": []})
        );
    }
}
