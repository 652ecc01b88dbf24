//! Job naming and liveness snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique name assigned to one dispatched run.
///
/// Names are minted by the engine as `<engine-name>-<counter>` and are never
/// reused within a run; every name maps to exactly one item for its whole
/// lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobName(String);

impl JobName {
    /// Wrap a raw name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The raw name string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for JobName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Combined liveness snapshot from a single backend status query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveJobs {
    /// Names currently executing.
    pub running: Vec<JobName>,
    /// Names accepted by the backend but not yet executing.
    pub queued: Vec<JobName>,
}

impl LiveJobs {
    /// True when the backend reports no job in either state.
    pub fn is_empty(&self) -> bool {
        self.running.is_empty() && self.queued.is_empty()
    }

    /// Every live name, running first.
    pub fn names(&self) -> impl Iterator<Item = &JobName> {
        self.running.iter().chain(self.queued.iter())
    }
}
