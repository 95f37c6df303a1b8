//! In-memory message broker.
//!
//! Per-topic FIFO queues behind the same producer/consumer traits as the
//! NATS backend. Used by tests and local development. Unlike NATS core it
//! models transport-side redelivery: a nacked message goes back to the
//! front of its queue until the delivery budget is spent, then moves to
//! the dead-letter topic.

use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::traits::{MessageConsumer, MessageProducer, MessageStream};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct Pending {
    payload: Vec<u8>,
    deliveries: u32,
}

#[derive(Debug)]
struct BrokerInner {
    topics: Mutex<HashMap<String, VecDeque<Pending>>>,
    max_deliveries: u32,
    dlq_topic: String,
    closed: AtomicBool,
}

/// Shared in-process broker; clone handles via [`InMemoryBroker::producer`]
/// and [`InMemoryBroker::consumer`].
#[derive(Debug, Clone)]
pub struct InMemoryBroker {
    inner: Arc<BrokerInner>,
}

impl InMemoryBroker {
    pub fn new(max_deliveries: u32, dlq_topic: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                topics: Mutex::new(HashMap::new()),
                max_deliveries,
                dlq_topic: dlq_topic.into(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn producer(&self) -> InMemoryProducer {
        InMemoryProducer {
            inner: self.inner.clone(),
        }
    }

    pub fn consumer(&self) -> InMemoryConsumer {
        InMemoryConsumer {
            inner: self.inner.clone(),
        }
    }

    /// Close the broker; open streams drain and then end.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }

    /// Number of messages currently queued on a topic.
    pub async fn queued(&self, topic: &str) -> usize {
        let topics = self.inner.topics.lock().await;
        topics.get(topic).map(VecDeque::len).unwrap_or(0)
    }

    /// Decode the queued payloads of a topic, oldest first.
    pub async fn payloads(&self, topic: &str) -> Vec<serde_json::Value> {
        let topics = self.inner.topics.lock().await;
        topics
            .get(topic)
            .map(|queue| {
                queue
                    .iter()
                    .filter_map(|p| serde_json::from_slice(&p.payload).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Producer handle for the in-memory broker
#[derive(Debug, Clone)]
pub struct InMemoryProducer {
    inner: Arc<BrokerInner>,
}

#[async_trait]
impl MessageProducer for InMemoryProducer {
    async fn publish<T: Serialize + Send + Sync>(
        &self,
        topic: &str,
        message: &T,
    ) -> MessagingResult<()> {
        let payload = serde_json::to_vec(message)?;
        let mut topics = self.inner.topics.lock().await;
        topics.entry(topic.to_string()).or_default().push_back(Pending {
            payload,
            deliveries: 0,
        });
        Ok(())
    }

    async fn close(&self) -> MessagingResult<()> {
        Ok(())
    }
}

/// Consumer handle for the in-memory broker
#[derive(Debug, Clone)]
pub struct InMemoryConsumer {
    inner: Arc<BrokerInner>,
}

#[async_trait]
impl MessageConsumer for InMemoryConsumer {
    async fn subscribe<T: DeserializeOwned + Send + Sync + 'static>(
        &self,
        topic: &str,
    ) -> MessagingResult<Box<dyn MessageStream<T>>> {
        Ok(Box::new(InMemoryMessageStream {
            inner: self.inner.clone(),
            topic: topic.to_string(),
            in_flight: None,
            _phantom: std::marker::PhantomData,
        }))
    }

    async fn close(&self) -> MessagingResult<()> {
        Ok(())
    }
}

/// In-memory message stream
pub struct InMemoryMessageStream<T> {
    inner: Arc<BrokerInner>,
    topic: String,
    in_flight: Option<Pending>,
    _phantom: std::marker::PhantomData<T>,
}

#[async_trait]
impl<T: DeserializeOwned + Send + Sync> MessageStream<T> for InMemoryMessageStream<T> {
    async fn next(&mut self) -> MessagingResult<Option<T>> {
        loop {
            {
                let mut topics = self.inner.topics.lock().await;
                if let Some(mut pending) = topics
                    .get_mut(&self.topic)
                    .and_then(|queue| queue.pop_front())
                {
                    pending.deliveries += 1;
                    let message = serde_json::from_slice(&pending.payload)
                        .map_err(|e| MessagingError::ConsumeFailed(e.to_string()));
                    self.in_flight = Some(pending);
                    return message.map(Some);
                }
            }

            if self.inner.closed.load(Ordering::SeqCst) {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn ack(&mut self) -> MessagingResult<()> {
        self.in_flight = None;
        Ok(())
    }

    async fn nack(&mut self) -> MessagingResult<()> {
        if let Some(pending) = self.in_flight.take() {
            let mut topics = self.inner.topics.lock().await;
            if pending.deliveries >= self.inner.max_deliveries {
                topics
                    .entry(self.inner.dlq_topic.clone())
                    .or_default()
                    .push_back(pending);
            } else {
                topics
                    .entry(self.topic.clone())
                    .or_default()
                    .push_front(pending);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_consume_round_trip() {
        let broker = InMemoryBroker::new(3, "dlq");
        let producer = broker.producer();
        let consumer = broker.consumer();

        producer
            .publish("events", &json!({"n": 1}))
            .await
            .unwrap();

        let mut stream = consumer.subscribe::<serde_json::Value>("events").await.unwrap();
        let message = stream.next().await.unwrap().unwrap();
        assert_eq!(message["n"], 1);
        stream.ack().await.unwrap();

        assert_eq!(broker.queued("events").await, 0);
    }

    #[tokio::test]
    async fn test_nack_redelivers() {
        let broker = InMemoryBroker::new(3, "dlq");
        broker
            .producer()
            .publish("events", &json!({"n": 1}))
            .await
            .unwrap();

        let mut stream = broker
            .consumer()
            .subscribe::<serde_json::Value>("events")
            .await
            .unwrap();

        stream.next().await.unwrap().unwrap();
        stream.nack().await.unwrap();
        assert_eq!(broker.queued("events").await, 1);

        // Still consumable after the nack
        let redelivered = stream.next().await.unwrap().unwrap();
        assert_eq!(redelivered["n"], 1);
    }

    #[tokio::test]
    async fn test_nack_beyond_budget_dead_letters() {
        let broker = InMemoryBroker::new(2, "dlq");
        broker
            .producer()
            .publish("events", &json!({"n": 1}))
            .await
            .unwrap();

        let mut stream = broker
            .consumer()
            .subscribe::<serde_json::Value>("events")
            .await
            .unwrap();

        for _ in 0..2 {
            stream.next().await.unwrap().unwrap();
            stream.nack().await.unwrap();
        }

        assert_eq!(broker.queued("events").await, 0);
        assert_eq!(broker.queued("dlq").await, 1);
    }

    #[tokio::test]
    async fn test_closed_stream_ends() {
        let broker = InMemoryBroker::new(3, "dlq");
        broker.close();

        let mut stream = broker
            .consumer()
            .subscribe::<serde_json::Value>("events")
            .await
            .unwrap();
        assert!(stream.next().await.unwrap().is_none());
    }
}
