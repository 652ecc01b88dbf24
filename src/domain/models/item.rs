//! Generic command-line experiment configuration.

use serde::{Deserialize, Serialize};

use crate::domain::models::JobName;
use crate::domain::ports::Item;

/// An experiment configuration: a fixed program prefix plus an ordered
/// parameter list.
///
/// `build_command` renders `program… <name> key value key value…`. Parameter
/// order is declaration order, so two items holding the same pairs in a
/// different order are distinct configurations.
///
/// # Examples
///
/// ```
/// use gridforge::domain::models::{CommandItem, JobName};
/// use gridforge::domain::ports::Item;
///
/// let item = CommandItem::new(["python", "train.py"])
///     .with_param("nTrain", "400")
///     .with_param("l2p", "1e-8");
///
/// let command = item.build_command(&JobName::new("sweep-0"));
/// assert_eq!(
///     command,
///     vec!["python", "train.py", "sweep-0", "nTrain", "400", "l2p", "1e-8"]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandItem {
    /// Leading command tokens (binary plus fixed arguments).
    pub program: Vec<String>,
    /// Ordered parameter pairs appended after the run name.
    #[serde(default)]
    pub params: Vec<(String, String)>,
}

impl CommandItem {
    /// A configuration with no parameters yet.
    pub fn new(program: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into_iter().map(Into::into).collect(),
            params: Vec::new(),
        }
    }

    /// Returns a copy with `key` set to `value`, replacing an existing pair
    /// in place (order preserved) or appending a new one.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if let Some(pair) = self.params.iter_mut().find(|(k, _)| *k == key) {
            pair.1 = value;
        } else {
            self.params.push((key, value));
        }
        self
    }

    /// Looks up the value for `key`, if present.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl Item for CommandItem {
    fn build_command(&self, name: &JobName) -> Vec<String> {
        let mut command = self.program.clone();
        command.push(name.to_string());
        for (key, value) in &self.params {
            command.push(key.clone());
            command.push(value.clone());
        }
        command
    }
}
