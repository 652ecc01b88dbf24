//! Fixed, strictly ordered work list.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::{JobName, Outcome};
use crate::domain::ports::Item;
use crate::domain::queues::Queue;

/// Strict FIFO queue over a fixed set of items.
///
/// Outcomes are accepted and discarded, and an exhausted queue keeps
/// yielding nothing. This is the workhorse for predetermined sweeps.
///
/// # Examples
///
/// ```
/// use gridforge::domain::models::CommandItem;
/// use gridforge::domain::queues::{ExplicitQueue, Queue};
///
/// let mut queue = ExplicitQueue::new();
/// queue.add(CommandItem::new(["run"]).with_param("n", "1"));
/// queue.add(CommandItem::new(["run"]).with_param("n", "2"));
///
/// let first = queue.pop().unwrap().unwrap();
/// assert_eq!(first.param("n"), Some("1"));
/// ```
#[derive(Debug, Clone)]
pub struct ExplicitQueue<I> {
    items: VecDeque<I>,
}

#[derive(Serialize, Deserialize)]
struct ExplicitState<I> {
    items: Vec<I>,
}

impl<I: Item> ExplicitQueue<I> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Creates a queue holding `items` in iteration order.
    pub fn from_items(items: impl IntoIterator<Item = I>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Appends one item at the back.
    pub fn add(&mut self, item: I) {
        self.items.push_back(item);
    }

    /// Number of items still waiting.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is left to pop.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<I: Item> Default for ExplicitQueue<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Item> Queue<I> for ExplicitQueue<I> {
    fn pop(&mut self) -> DomainResult<Option<I>> {
        Ok(self.items.pop_front())
    }

    fn observe(&mut self, _outcome: Outcome, _name: &JobName, _item: &I) -> DomainResult<()> {
        Ok(())
    }

    fn snapshot(&self) -> DomainResult<serde_json::Value> {
        Ok(serde_json::to_value(ExplicitState {
            items: self.items.iter().cloned().collect::<Vec<_>>(),
        })?)
    }

    fn restore(&mut self, state: serde_json::Value) -> DomainResult<()> {
        let state: ExplicitState<I> = serde_json::from_value(state)?;
        self.items = state.items.into();
        Ok(())
    }
}
