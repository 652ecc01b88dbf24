//! Port traits: the seams between the scheduling core and the outside.

pub mod item;
pub mod job_tracker;
pub mod message_channel;
pub mod mutator;

pub use item::Item;
pub use job_tracker::JobTracker;
pub use message_channel::MessageChannel;
pub use mutator::Mutator;
