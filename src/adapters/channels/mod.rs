//! Message channel implementations.

pub mod memory;
pub mod redis;

pub use memory::{InMemoryChannel, InMemorySender};
pub use self::redis::RedisChannel;
