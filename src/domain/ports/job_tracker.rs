//! Port for batch-compute backends.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{JobName, LiveJobs};

/// Capability abstraction over a batch-compute backend.
///
/// The backend's job listing is eventually consistent and is used only as a
/// liveness signal; completion is always observed via the result channel,
/// never inferred from the listing.
#[async_trait]
pub trait JobTracker: Send + Sync {
    /// Backend identifier used in logs.
    fn name(&self) -> &'static str;

    /// Whether the backend will accept another submission right now.
    ///
    /// Degrades to `false` when the underlying status query fails; the
    /// engine treats that as "no capacity this cycle" and keeps polling.
    async fn can_submit_more_jobs(&self) -> bool;

    /// Names of jobs currently executing.
    async fn jobs_running(&self) -> DomainResult<Vec<JobName>>;

    /// Names of jobs accepted by the backend but not yet executing.
    async fn jobs_queued(&self) -> DomainResult<Vec<JobName>>;

    /// Combined liveness snapshot.
    ///
    /// Backends that can answer both lists from a single status query
    /// override this; the default composes the two separate calls.
    async fn live_jobs(&self) -> DomainResult<LiveJobs> {
        Ok(LiveJobs {
            running: self.jobs_running().await?,
            queued: self.jobs_queued().await?,
        })
    }

    /// Hand `command` to the backend under `name`.
    ///
    /// Returns once the job is accepted; it does not wait for execution.
    async fn spawn(&self, name: &JobName, command: &[String]) -> DomainResult<()>;

    /// Completion hook for backends that cannot observe job exit on their
    /// own. The engine calls it for every processed result; the default is
    /// a no-op.
    async fn mark_done(&self, _name: &JobName) -> DomainResult<()> {
        Ok(())
    }
}
