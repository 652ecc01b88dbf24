//! Domain layer: queue family, port traits and core data types.

pub mod errors;
pub mod models;
pub mod ports;
pub mod queues;

pub use errors::{DomainError, DomainResult};
