//! NATS message queue implementation

use crate::messaging::config::NatsConfig;
use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::traits::{MessageConsumer, MessageProducer, MessageStream};
use async_nats::Client;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

async fn connect(config: &NatsConfig) -> MessagingResult<Client> {
    async_nats::ConnectOptions::new()
        .name(&config.connection_name)
        .connect(config.servers[0].as_str())
        .await
        .map_err(|e| MessagingError::ConnectionFailed(format!("NATS connection failed: {}", e)))
}

/// NATS producer
pub struct NatsProducer {
    client: Arc<Client>,
}

impl NatsProducer {
    /// Create a new NATS producer
    pub async fn new(config: NatsConfig) -> MessagingResult<Self> {
        let client = connect(&config).await?;
        Ok(Self {
            client: Arc::new(client),
        })
    }
}

#[async_trait]
impl MessageProducer for NatsProducer {
    async fn publish<T: Serialize + Send + Sync>(
        &self,
        topic: &str,
        message: &T,
    ) -> MessagingResult<()> {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(topic.to_string(), payload.into())
            .await
            .map_err(|e| MessagingError::PublishFailed(format!("NATS publish failed: {}", e)))?;

        Ok(())
    }

    async fn close(&self) -> MessagingResult<()> {
        // NATS client closes automatically on drop
        Ok(())
    }
}

/// NATS consumer
pub struct NatsConsumer {
    client: Arc<Client>,
}

impl NatsConsumer {
    /// Create a new NATS consumer
    pub async fn new(config: NatsConfig) -> MessagingResult<Self> {
        let client = connect(&config).await?;
        Ok(Self {
            client: Arc::new(client),
        })
    }
}

#[async_trait]
impl MessageConsumer for NatsConsumer {
    async fn subscribe<T: DeserializeOwned + Send + Sync + 'static>(
        &self,
        topic: &str,
    ) -> MessagingResult<Box<dyn MessageStream<T>>> {
        let subscriber = self
            .client
            .subscribe(topic.to_string())
            .await
            .map_err(|e| MessagingError::SubscribeFailed(format!("NATS subscribe failed: {}", e)))?;

        Ok(Box::new(NatsMessageStream::new(subscriber)))
    }

    async fn close(&self) -> MessagingResult<()> {
        Ok(())
    }
}

/// NATS message stream
pub struct NatsMessageStream<T> {
    subscriber: async_nats::Subscriber,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> NatsMessageStream<T> {
    fn new(subscriber: async_nats::Subscriber) -> Self {
        Self {
            subscriber,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<T: DeserializeOwned + Send + Sync> MessageStream<T> for NatsMessageStream<T> {
    async fn next(&mut self) -> MessagingResult<Option<T>> {
        match self.subscriber.next().await {
            Some(msg) => {
                let payload: T = serde_json::from_slice(&msg.payload)?;
                Ok(Some(payload))
            }
            None => Ok(None),
        }
    }

    async fn ack(&mut self) -> MessagingResult<()> {
        // NATS core doesn't require explicit acks (use JetStream for that)
        Ok(())
    }

    async fn nack(&mut self) -> MessagingResult<()> {
        // NATS core doesn't support nack (use JetStream for that)
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::config::NatsConfig;

    #[test]
    fn test_nats_config() {
        let config = NatsConfig::default();
        assert!(!config.servers.is_empty());
        assert_eq!(config.connection_name, "commerce-search");
    }
}
