//! Job tracker implementations.

pub mod local;
pub mod mock;
pub mod sge;

pub use local::LocalJobTracker;
pub use mock::MockJobTracker;
pub use sge::SgeJobTracker;
