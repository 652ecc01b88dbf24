//! Redis pub/sub transport.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::{MultiplexedConnection, PubSubStream};
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ChannelConfig;
use crate::domain::ports::MessageChannel;

/// Redis pub/sub message channel.
///
/// Subscribes at connect time; `recv` pulls from the subscription stream
/// with a bounded wait, `publish` goes through a separate multiplexed
/// connection so the subscriber socket stays dedicated to the stream.
pub struct RedisChannel {
    stream: PubSubStream,
    conn: MultiplexedConnection,
    channel: String,
}

impl RedisChannel {
    /// Connects and subscribes to the configured channel.
    pub async fn connect(config: &ChannelConfig) -> DomainResult<Self> {
        let client = redis::Client::open(config.url())?;
        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.subscribe(&config.channel).await?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!(
            channel = %config.channel,
            host = %config.host,
            port = config.port,
            "subscribed to result channel"
        );
        Ok(Self {
            stream: pubsub.into_on_message(),
            conn,
            channel: config.channel.clone(),
        })
    }
}

#[async_trait]
impl MessageChannel for RedisChannel {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn recv(&mut self, wait: Duration) -> DomainResult<Option<String>> {
        match tokio::time::timeout(wait, self.stream.next()).await {
            Ok(Some(message)) => {
                let payload: String = message.get_payload()?;
                debug!(bytes = payload.len(), "channel message received");
                Ok(Some(payload))
            }
            Ok(None) => Err(DomainError::ChannelError(
                "subscription stream closed".to_string(),
            )),
            Err(_) => Ok(None),
        }
    }

    async fn publish(&mut self, payload: &str) -> DomainResult<()> {
        let _: () = self.conn.publish(&self.channel, payload).await?;
        Ok(())
    }
}
