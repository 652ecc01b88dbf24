//! Core data types shared across the engine, queues and adapters.

pub mod config;
pub mod item;
pub mod job;
pub mod message;
pub mod outcome;

pub use config::{
    ChannelConfig, Config, EngineConfig, LoggingConfig, QueueConfig, TrackerConfig,
};
pub use item::CommandItem;
pub use job::{JobName, LiveJobs};
pub use message::ChannelMessage;
pub use outcome::Outcome;
