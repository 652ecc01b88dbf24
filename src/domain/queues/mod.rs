//! The queue family: fixed, adaptive and multiplexed item sources.
//!
//! All variants share one object-safe contract: `pop` yields the next item
//! to dispatch (or nothing this cycle), `observe` feeds outcomes back, and
//! `snapshot`/`restore` checkpoint the full scheduling state. Termination is
//! the engine's decision; an empty pop never means "exhausted forever" on
//! its own.

pub mod explicit;
pub mod multi;
pub mod mutator;

pub use explicit::ExplicitQueue;
pub use multi::MultiQueue;
pub use mutator::MutatorQueue;

use crate::domain::errors::DomainResult;
use crate::domain::models::{JobName, Outcome};
use crate::domain::ports::Item;

/// Optional control-message capability of a queue.
///
/// Control text arrives over the result channel (`messageQ …`); it is never
/// fatal, unknown or malformed text is logged and dropped.
pub trait QueueControl {
    /// Apply one control message.
    fn message(&mut self, text: &str);
}

/// Uniform contract over every queue variant.
pub trait Queue<I: Item>: Send {
    /// Next item to dispatch, or `None` when nothing is available this
    /// cycle.
    fn pop(&mut self) -> DomainResult<Option<I>>;

    /// Record the outcome observed for `item` under job `name`.
    fn observe(&mut self, outcome: Outcome, name: &JobName, item: &I) -> DomainResult<()>;

    /// The control capability, for queues that have one.
    fn control(&mut self) -> Option<&mut dyn QueueControl> {
        None
    }

    /// Serialize the full scheduling state.
    fn snapshot(&self) -> DomainResult<serde_json::Value>;

    /// Restore scheduling state captured by [`Queue::snapshot`].
    ///
    /// Injected collaborators (mutators) are code, not state; they survive
    /// a restore untouched.
    fn restore(&mut self, state: serde_json::Value) -> DomainResult<()>;
}
