//! Port for the result/control message transport.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Injected pub/sub transport carrying result and control messages.
///
/// Receives are bounded: the engine never blocks indefinitely on the
/// channel, it asks for "one message within `wait`" each iteration.
#[async_trait]
pub trait MessageChannel: Send {
    /// Transport identifier used in logs.
    fn name(&self) -> &'static str;

    /// Wait up to `wait` for the next message; `None` on timeout.
    async fn recv(&mut self, wait: Duration) -> DomainResult<Option<String>>;

    /// Publish one payload to every subscriber.
    async fn publish(&mut self, payload: &str) -> DomainResult<()>;
}
