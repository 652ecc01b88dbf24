//! In-process loopback channel.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::MessageChannel;

/// In-process message channel; publishes loop straight back to the
/// receiver.
///
/// Used by tests and single-process simulations. The paired
/// [`InMemorySender`] injects messages from outside the engine, playing the
/// role a finished cluster job plays in production.
pub struct InMemoryChannel {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

/// Cloneable injection handle paired with an [`InMemoryChannel`].
#[derive(Clone)]
pub struct InMemorySender {
    tx: mpsc::UnboundedSender<String>,
}

impl InMemoryChannel {
    /// Creates a channel plus its injection handle.
    pub fn new() -> (Self, InMemorySender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self { tx: tx.clone(), rx },
            InMemorySender { tx },
        )
    }
}

impl InMemorySender {
    /// Queues one payload for the engine.
    pub fn send(&self, payload: impl Into<String>) -> DomainResult<()> {
        self.tx
            .send(payload.into())
            .map_err(|_| DomainError::ChannelError("channel receiver dropped".to_string()))
    }
}

#[async_trait]
impl MessageChannel for InMemoryChannel {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn recv(&mut self, wait: Duration) -> DomainResult<Option<String>> {
        match tokio::time::timeout(wait, self.rx.recv()).await {
            Ok(message) => Ok(message),
            Err(_) => Ok(None),
        }
    }

    async fn publish(&mut self, payload: &str) -> DomainResult<()> {
        self.tx
            .send(payload.to_string())
            .map_err(|_| DomainError::ChannelError("channel receiver dropped".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_loops_back_to_recv() {
        let (mut channel, _sender) = InMemoryChannel::new();
        channel.publish("result 0.5\ta\tb").await.unwrap();

        let received = channel.recv(Duration::from_millis(50)).await.unwrap();
        assert_eq!(received.as_deref(), Some("result 0.5\ta\tb"));
    }

    #[tokio::test]
    async fn test_recv_times_out_with_none() {
        let (mut channel, _sender) = InMemoryChannel::new();
        let received = channel.recv(Duration::from_millis(10)).await.unwrap();
        assert_eq!(received, None);
    }

    #[tokio::test]
    async fn test_sender_injects_messages() {
        let (mut channel, sender) = InMemoryChannel::new();
        sender.send("messageQ stop").unwrap();

        let received = channel.recv(Duration::from_millis(50)).await.unwrap();
        assert_eq!(received.as_deref(), Some("messageQ stop"));
    }
}
