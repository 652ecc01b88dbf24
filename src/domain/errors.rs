//! Domain errors for the gridforge scheduling engine.

use thiserror::Error;

/// Domain-level errors that can occur while scheduling and tracking jobs.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Unknown job name: {0}")]
    UnknownJob(String),

    #[error("Duplicate result reported by job {name}: item already has a recorded score")]
    DuplicateOutcome { name: String },

    #[error("Queue already registered: {0}")]
    QueueExists(String),

    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    #[error("No owning queue recorded for item observed via job {0}")]
    UnroutedItem(String),

    #[error("Cannot pop from a mutator queue with no observations and nothing waiting")]
    UnseededQueue,

    #[error("Malformed {kind} message: {reason}")]
    MalformedMessage { kind: String, reason: String },

    #[error("Unexpected scheduler listing: {0}")]
    SchedulerParse(String),

    #[error("Failed to spawn job {name}: {reason}")]
    SpawnFailed { name: String, reason: String },

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<redis::RedisError> for DomainError {
    fn from(err: redis::RedisError) -> Self {
        DomainError::ChannelError(err.to_string())
    }
}

impl From<quick_xml::DeError> for DomainError {
    fn from(err: quick_xml::DeError) -> Self {
        DomainError::SchedulerParse(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::IoError(err.to_string())
    }
}
