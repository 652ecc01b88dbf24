//! Gridforge - Adaptive Experiment Scheduler
//!
//! Gridforge drives large parameter sweeps on batch clusters. A queue hands
//! out experiment configurations, a job tracker submits them and watches
//! their liveness, and finished runs report scores back over a message
//! channel. The adaptive queue variant resamples high-scoring
//! configurations and mutates them, turning a fixed sweep into a guided
//! search.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): queue family, port traits and core types
//! - **Adapters Layer** (`adapters`): cluster backends and message channels
//! - **Service Layer** (`services`): the engine loop and the results log
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use gridforge::domain::queues::{ExplicitQueue, Queue};
//! use gridforge::services::JobEngine;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Build a queue, a tracker and a channel, then run the engine
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    ChannelConfig, ChannelMessage, CommandItem, Config, EngineConfig, JobName, LiveJobs,
    LoggingConfig, Outcome, QueueConfig, TrackerConfig,
};
pub use domain::ports::{Item, JobTracker, MessageChannel, Mutator};
pub use domain::queues::{ExplicitQueue, MultiQueue, MutatorQueue, Queue, QueueControl};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{EngineEvent, EngineSettings, EngineStats, JobEngine, ResultsLog};
