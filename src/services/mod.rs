//! Service layer orchestrating queues, trackers and channels.

pub mod job_engine;
pub mod results_log;

pub use job_engine::{EngineEvent, EngineSettings, EngineStats, JobEngine};
pub use results_log::ResultsLog;
