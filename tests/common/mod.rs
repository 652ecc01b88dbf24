//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use gridforge::CommandItem;
use tempfile::TempDir;

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// An item whose generated command carries `id`, so dispatched jobs can be
/// told apart in a tracker's spawn record.
pub fn item(id: &str) -> CommandItem {
    CommandItem::new(["run.sh"]).with_param("id", id)
}

/// A wire-format result message for job `name`.
pub fn result_message(score: f64, name: &str, config: &str) -> String {
    format!("result {score}\t{name}\t{config}")
}
