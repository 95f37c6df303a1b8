//! Event transport and the index synchronizer.
//!
//! Catalog changes arrive as typed domain events over a durable
//! publish/subscribe channel with at-least-once delivery. The transport is
//! abstracted behind [`MessageProducer`] / [`MessageConsumer`] /
//! [`MessageStream`] with two backends:
//!
//! - NATS ([`nats`]) for deployment;
//! - an in-memory broker ([`memory`]) for tests and local development,
//!   which also models transport-side redelivery and dead-lettering.
//!
//! The [`IndexSynchronizer`] consumes `product_created` /
//! `product_updated` / `product_deleted` events and applies them to the
//! index as idempotent upserts and deletes. Unknown event shapes are logged
//! and dropped; an event whose index write keeps failing is retried up to
//! the configured budget and then published unmodified to the dead-letter
//! topic so one poison message never blocks the queue.

mod config;
mod error;
mod events;
mod memory;
mod metrics;
mod nats;
mod sync;
mod traits;

pub use config::{MessagingBackend, MessagingConfig, NatsConfig};
pub use error::{MessagingError, MessagingResult};
pub use events::ProductEvent;
pub use memory::{InMemoryBroker, InMemoryConsumer, InMemoryProducer};
pub use metrics::{init_messaging_metrics, MESSAGING_METRICS};
pub use nats::{NatsConsumer, NatsProducer};
pub use sync::IndexSynchronizer;
pub use traits::{MessageConsumer, MessageProducer, MessageStream};
