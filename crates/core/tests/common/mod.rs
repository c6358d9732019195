//! Shared helpers for the core integration tests.

#![allow(dead_code)]

use serde_json::Value;
use tracing_subscriber::EnvFilter;

use opsdash_core::types::Record;

/// Install a test-writer subscriber once per binary. Honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Turn a JSON array literal into records, skipping non-objects.
pub fn records(value: Value) -> Vec<Record> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(|v| v.as_object().cloned()).collect())
        .unwrap_or_default()
}

/// Turn a JSON object literal into a single record.
pub fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}
