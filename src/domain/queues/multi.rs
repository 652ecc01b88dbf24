//! Named round-robin multiplexer over sub-queues.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{JobName, Outcome};
use crate::domain::ports::Item;
use crate::domain::queues::{Queue, QueueControl};

/// Fair multiplexer over named sub-queues.
///
/// `pop` scans at most one full rotation starting at an internal cursor;
/// every scanned slot advances the cursor by exactly one position whether or
/// not it yields an item, so a sub-queue that was empty last round is not
/// starved this round. The owning queue of every popped item is recorded so
/// later observations can be routed back.
pub struct MultiQueue<I> {
    queues: Vec<(String, Box<dyn Queue<I>>)>,
    owners: HashMap<I, String>,
    cursor: usize,
    stopped: HashSet<String>,
    all_stopped: bool,
}

#[derive(Serialize, Deserialize)]
struct MultiState<I> {
    cursor: usize,
    all_stopped: bool,
    stopped: Vec<String>,
    owners: Vec<(I, String)>,
    queues: Vec<(String, serde_json::Value)>,
}

impl<I: Item> MultiQueue<I> {
    /// Creates an empty multiplexer.
    pub fn new() -> Self {
        Self {
            queues: Vec::new(),
            owners: HashMap::new(),
            cursor: 0,
            stopped: HashSet::new(),
            all_stopped: false,
        }
    }

    /// Registers a named sub-queue; duplicate names are rejected.
    pub fn add_queue(
        &mut self,
        name: impl Into<String>,
        queue: impl Queue<I> + 'static,
    ) -> DomainResult<()> {
        let name = name.into();
        if self.queues.iter().any(|(n, _)| *n == name) {
            return Err(DomainError::QueueExists(name));
        }
        self.queues.push((name, Box::new(queue)));
        Ok(())
    }

    /// Registered sub-queue names, in registration order.
    pub fn queue_names(&self) -> Vec<&str> {
        self.queues.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn log_queues(&self) {
        info!(
            queues = self.queues.len(),
            all_stopped = self.all_stopped,
            "queue roster"
        );
        for (name, _) in &self.queues {
            info!(
                queue = %name,
                stopped = self.stopped.contains(name.as_str()),
                "registered queue"
            );
        }
    }

    fn route_control(&mut self, text: &str) {
        let Some((name, rest)) = text.split_once(' ') else {
            warn!(message = text, "ignoring unrecognized queue control message");
            return;
        };
        if !self.queues.iter().any(|(n, _)| n == name) {
            warn!(queue = name, "control message for unknown queue");
            return;
        }
        match rest.trim() {
            "stop" => {
                self.stopped.insert(name.to_string());
                info!(queue = name, "queue stopped");
            }
            "start" => {
                self.stopped.remove(name);
                info!(queue = name, "queue started");
            }
            other => {
                let Some((_, queue)) = self.queues.iter_mut().find(|(n, _)| n == name) else {
                    return;
                };
                match queue.control() {
                    Some(control) => control.message(other),
                    None => {
                        warn!(queue = name, message = other, "queue has no control capability");
                    }
                }
            }
        }
    }
}

impl<I: Item> Default for MultiQueue<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Item> Queue<I> for MultiQueue<I> {
    fn pop(&mut self) -> DomainResult<Option<I>> {
        if self.all_stopped || self.queues.is_empty() {
            return Ok(None);
        }
        for _ in 0..self.queues.len() {
            let slot = self.cursor % self.queues.len();
            self.cursor = (self.cursor + 1) % self.queues.len();
            let (name, queue) = &mut self.queues[slot];
            if self.stopped.contains(name.as_str()) {
                continue;
            }
            if let Some(item) = queue.pop()? {
                self.owners.insert(item.clone(), name.clone());
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    fn observe(&mut self, outcome: Outcome, name: &JobName, item: &I) -> DomainResult<()> {
        let Some(owner) = self.owners.get(item) else {
            return Err(DomainError::UnroutedItem(name.to_string()));
        };
        let Some((_, queue)) = self.queues.iter_mut().find(|(n, _)| n == owner) else {
            return Err(DomainError::QueueNotFound(owner.clone()));
        };
        queue.observe(outcome, name, item)
    }

    fn control(&mut self) -> Option<&mut dyn QueueControl> {
        Some(self)
    }

    fn snapshot(&self) -> DomainResult<serde_json::Value> {
        let mut queues = Vec::with_capacity(self.queues.len());
        for (name, queue) in &self.queues {
            queues.push((name.clone(), queue.snapshot()?));
        }
        Ok(serde_json::to_value(MultiState {
            cursor: self.cursor,
            all_stopped: self.all_stopped,
            stopped: self.stopped.iter().cloned().collect::<Vec<_>>(),
            owners: self
                .owners
                .iter()
                .map(|(item, owner)| (item.clone(), owner.clone()))
                .collect::<Vec<_>>(),
            queues,
        })?)
    }

    fn restore(&mut self, state: serde_json::Value) -> DomainResult<()> {
        let state: MultiState<I> = serde_json::from_value(state)?;
        for (name, sub_state) in state.queues {
            let Some((_, queue)) = self.queues.iter_mut().find(|(n, _)| *n == name) else {
                return Err(DomainError::QueueNotFound(name));
            };
            queue.restore(sub_state)?;
        }
        self.cursor = state.cursor;
        self.all_stopped = state.all_stopped;
        self.stopped = state.stopped.into_iter().collect();
        self.owners = state.owners.into_iter().collect();
        Ok(())
    }
}

impl<I: Item> QueueControl for MultiQueue<I> {
    fn message(&mut self, text: &str) {
        match text.trim() {
            "list" | "info" => self.log_queues(),
            "help" => info!(
                "queue control: list | info | help | stop | start | \
                 <queue> stop | <queue> start | <queue> <message>"
            ),
            "stop" => {
                self.all_stopped = true;
                info!("all queues stopped");
            }
            "start" => {
                self.all_stopped = false;
                info!("all queues started");
            }
            other => self.route_control(other),
        }
    }
}
