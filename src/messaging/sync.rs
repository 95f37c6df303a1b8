//! Event-driven index synchronizer.
//!
//! Consumes product domain events and applies them to the search index.
//! Per message: `Received → Dispatched → Applied` on success, or
//! `Received → Dispatched → Failed → Retried* → Applied | DeadLettered`.
//! Duplicate and replayed deliveries converge because create/update are a
//! single idempotent upsert and delete tolerates absent ids.

use crate::messaging::config::MessagingConfig;
use crate::messaging::error::MessagingResult;
use crate::messaging::events::ProductEvent;
use crate::messaging::metrics::MESSAGING_METRICS;
use crate::messaging::traits::{MessageConsumer, MessageProducer, MessageStream};
use crate::search::{ProductIndexer, SearchError, SearchResult};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Applies the event stream to the product index.
pub struct IndexSynchronizer<P: MessageProducer> {
    /// Write surface of the index
    indexer: Arc<dyn ProductIndexer>,

    /// Producer used to dead-letter poison messages
    dlq: Arc<P>,

    /// Configuration
    config: MessagingConfig,
}

impl<P: MessageProducer> IndexSynchronizer<P> {
    pub fn new(indexer: Arc<dyn ProductIndexer>, dlq: Arc<P>, config: MessagingConfig) -> Self {
        Self {
            indexer,
            dlq,
            config,
        }
    }

    /// Consume the events topic until the stream closes.
    pub async fn run<C: MessageConsumer>(&self, consumer: &C) -> MessagingResult<()> {
        let mut stream = consumer
            .subscribe::<serde_json::Value>(&self.config.events_topic)
            .await?;

        tracing::info!(
            topic = %self.config.events_topic,
            dlq = %self.config.dlq_topic,
            "Index synchronizer consuming"
        );

        loop {
            match stream.next().await {
                Ok(Some(raw)) => self.handle_message(raw, stream.as_mut()).await,
                Ok(None) => {
                    tracing::info!("Event stream closed, synchronizer stopping");
                    return Ok(());
                }
                Err(e) => {
                    // Not valid JSON at all; nothing to replay, keep going.
                    tracing::warn!(error = %e, "Failed to read message from event stream");
                }
            }
        }
    }

    async fn handle_message(
        &self,
        raw: serde_json::Value,
        stream: &mut dyn MessageStream<serde_json::Value>,
    ) {
        match ProductEvent::decode(&raw) {
            Ok(event) => match self.apply_with_retry(&event).await {
                Ok(()) => {
                    let _ = stream.ack().await;
                }
                Err(e) => {
                    self.dead_letter(&raw, &event, &e).await;
                    let _ = stream.ack().await;
                }
            },
            Err(e) => {
                // Unknown event kinds are a data/versioning issue, not a
                // system fault; they must never block the queue.
                let kind = raw
                    .get("type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("<missing>");
                tracing::warn!(
                    event_type = kind,
                    error = %e,
                    "Dropping message with unknown event shape"
                );
                if self.config.enable_metrics {
                    MESSAGING_METRICS.unknown_events.inc();
                }
                let _ = stream.ack().await;
            }
        }
    }

    async fn apply_with_retry(&self, event: &ProductEvent) -> SearchResult<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let start = Instant::now();

            match self.apply(event).await {
                Ok(()) => {
                    if self.config.enable_metrics {
                        MESSAGING_METRICS
                            .events_applied
                            .with_label_values(&[event.kind()])
                            .inc();
                        MESSAGING_METRICS
                            .apply_latency
                            .with_label_values(&[event.kind()])
                            .observe(start.elapsed().as_secs_f64());
                    }
                    return Ok(());
                }
                Err(e) => {
                    if self.config.enable_metrics {
                        MESSAGING_METRICS
                            .apply_failures
                            .with_label_values(&[event.kind()])
                            .inc();
                    }
                    if attempt >= self.config.max_delivery_attempts {
                        return Err(e);
                    }
                    tracing::warn!(
                        event_type = event.kind(),
                        product_id = %event.entity_id(),
                        attempt,
                        error = %e,
                        "Index write failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(self.config.retry_backoff_ms)).await;
                }
            }
        }
    }

    async fn apply(&self, event: &ProductEvent) -> SearchResult<()> {
        match event {
            ProductEvent::ProductCreated { product } | ProductEvent::ProductUpdated { product } => {
                self.indexer.upsert(product).await?;
                tracing::info!(
                    product_id = %product.id,
                    event_type = event.kind(),
                    "Product indexed"
                );
                Ok(())
            }
            ProductEvent::ProductDeleted { id } => {
                self.indexer.delete(*id).await?;
                tracing::info!(product_id = %id, "Product removed from index");
                Ok(())
            }
        }
    }

    /// Publish the original message unmodified to the dead-letter topic.
    async fn dead_letter(&self, raw: &serde_json::Value, event: &ProductEvent, err: &SearchError) {
        tracing::error!(
            event_type = event.kind(),
            product_id = %event.entity_id(),
            error = %err,
            dlq = %self.config.dlq_topic,
            "Retry budget exhausted, dead-lettering message"
        );

        if let Err(e) = self.dlq.publish(&self.config.dlq_topic, raw).await {
            tracing::error!(error = %e, "Failed to publish to dead-letter topic");
        } else if self.config.enable_metrics {
            MESSAGING_METRICS.events_dead_lettered.inc();
        }
    }
}
