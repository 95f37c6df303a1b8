//! Messaging trait abstractions

use crate::messaging::error::MessagingResult;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Message producer trait
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Publish a message to a topic
    async fn publish<T: Serialize + Send + Sync>(
        &self,
        topic: &str,
        message: &T,
    ) -> MessagingResult<()>;

    /// Close the producer connection
    async fn close(&self) -> MessagingResult<()>;
}

/// Message consumer trait
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Subscribe to a topic and receive messages
    async fn subscribe<T: DeserializeOwned + Send + Sync + 'static>(
        &self,
        topic: &str,
    ) -> MessagingResult<Box<dyn MessageStream<T>>>;

    /// Close the consumer connection
    async fn close(&self) -> MessagingResult<()>;
}

/// Message stream trait for consuming messages
#[async_trait]
pub trait MessageStream<T: DeserializeOwned>: Send + Sync {
    /// Get the next message from the stream; `None` when the stream closed
    async fn next(&mut self) -> MessagingResult<Option<T>>;

    /// Acknowledge message processing
    async fn ack(&mut self) -> MessagingResult<()>;

    /// Negative acknowledge (requeue message, where the backend supports it)
    async fn nack(&mut self) -> MessagingResult<()>;
}
