//! Messaging configuration

use serde::{Deserialize, Serialize};

/// Messaging backend type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessagingBackend {
    /// NATS - lightweight, high-performance messaging
    #[default]
    Nats,
    /// In-process broker for tests and local development
    InMemory,
}

/// NATS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    /// NATS server URLs
    pub servers: Vec<String>,

    /// Connection name
    pub connection_name: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            connection_name: "commerce-search".to_string(),
        }
    }
}

/// Main messaging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Enable the event consumer
    pub enabled: bool,

    /// Backend to use
    pub backend: MessagingBackend,

    /// NATS configuration
    #[serde(default)]
    pub nats: NatsConfig,

    /// Topic carrying product domain events
    pub events_topic: String,

    /// Dead letter topic for messages that exhaust the retry budget
    pub dlq_topic: String,

    /// Delivery attempts per message before dead-lettering
    pub max_delivery_attempts: u32,

    /// Backoff between retry attempts in milliseconds
    pub retry_backoff_ms: u64,

    /// Enable Prometheus metrics
    pub enable_metrics: bool,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: MessagingBackend::Nats,
            nats: NatsConfig::default(),
            events_topic: "products.events".to_string(),
            dlq_topic: "products.events.dlq".to_string(),
            max_delivery_attempts: 3,
            retry_backoff_ms: 500,
            enable_metrics: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messaging_config_defaults() {
        let config = MessagingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.backend, MessagingBackend::Nats);
        assert_eq!(config.events_topic, "products.events");
        assert_eq!(config.dlq_topic, "products.events.dlq");
        assert_eq!(config.max_delivery_attempts, 3);
    }

    #[test]
    fn test_nats_config_defaults() {
        let config = NatsConfig::default();
        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.servers[0], "nats://localhost:4222");
        assert_eq!(config.connection_name, "commerce-search");
    }
}
