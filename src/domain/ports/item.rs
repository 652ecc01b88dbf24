//! Capability contract for experiment configurations.

use std::fmt::Debug;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::models::JobName;

/// One experiment configuration.
///
/// Items are opaque to the scheduler: it only needs them to act as map and
/// set keys (duplicate suppression, reverse routing), to serialize whole
/// into queue checkpoints, and to render a runnable command once a job name
/// is assigned. Executing that command must eventually publish exactly one
/// `result` message carrying the same name.
pub trait Item:
    Clone + Eq + Hash + Debug + Send + Serialize + DeserializeOwned + 'static
{
    /// Render the command tokens for a run dispatched under `name`.
    fn build_command(&self, name: &JobName) -> Vec<String>;
}
