//! Integration tests for the bounded undo/redo stack.

mod common;

use std::sync::{Arc, Mutex};

use opsdash_core::{HistoryConfig, HistoryStack};

// ---------------------------------------------------------------------------
// Test: undo/redo conservation
// ---------------------------------------------------------------------------

/// After n edits and k undos, `present` is the value k states back and the
/// combined length of past and future is unchanged.
#[test]
fn undo_redo_conserves_entries() {
    common::init_tracing();
    let mut history = HistoryStack::new(0);
    for value in 1..=5 {
        history.set_state(value);
    }
    let total = history.state().past.len() + history.state().future.len();
    assert_eq!(total, 5);

    for _ in 0..3 {
        history.undo();
    }
    assert_eq!(*history.present(), 2);
    assert_eq!(
        history.state().past.len() + history.state().future.len(),
        total
    );

    assert_eq!(*history.redo(), 3);
    assert_eq!(
        history.state().past.len() + history.state().future.len(),
        total
    );
}

// ---------------------------------------------------------------------------
// Test: bound
// ---------------------------------------------------------------------------

/// With `max_history = h` and m > h edits, the oldest values are evicted.
#[test]
fn past_is_bounded_oldest_first() {
    let mut history = HistoryStack::with_max_history(0, 3);
    for value in 1..=7 {
        history.set_state(value);
    }
    let past: Vec<i32> = history.state().past.iter().copied().collect();
    assert_eq!(past, vec![4, 5, 6]);
    assert_eq!(*history.present(), 7);
}

/// The bound comes from configuration when built with `from_config`.
#[test]
fn bound_from_config() {
    let config = HistoryConfig {
        max_history: 2,
        ..HistoryConfig::default()
    };
    let mut history = HistoryStack::from_config("a".to_string(), &config);
    for value in ["b", "c", "d"] {
        history.set_state(value.to_string());
    }
    assert_eq!(history.state().past.len(), 2);
    assert_eq!(history.max_history(), 2);
}

// ---------------------------------------------------------------------------
// Test: redo destroyed on new edit
// ---------------------------------------------------------------------------

#[test]
fn new_edit_after_undo_discards_redo() {
    let mut history = HistoryStack::new("draft".to_string());
    history.set_state("v1".to_string());
    history.set_state("v2".to_string());
    history.undo();
    assert!(history.can_redo());

    history.set_state("v1b".to_string());
    assert!(!history.can_redo());
    assert_eq!(history.redo(), "v1b");
}

// ---------------------------------------------------------------------------
// Test: change notifications
// ---------------------------------------------------------------------------

/// The callback sees every transition but is not fired by a no-op undo.
#[test]
fn callback_tracks_transitions() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut history =
        HistoryStack::new(1).on_state_change(move |value: &i32| sink.lock().unwrap().push(*value));

    history.undo();
    history.set_state(2);
    history.set_state(3);
    history.undo();
    history.redo();
    history.redo();

    assert_eq!(*seen.lock().unwrap(), vec![2, 3, 2, 3]);
}
