//! Logging infrastructure built on tracing.

pub mod logger;

pub use logger::LoggerImpl;
