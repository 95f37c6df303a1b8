//! Product domain event types

use crate::messaging::error::{MessagingError, MessagingResult};
use crate::models::Product;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog domain event, discriminated by the `type` field on the wire:
/// `product_created`, `product_updated`, or `product_deleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    /// A product was added to the catalog
    ProductCreated { product: Product },

    /// A product changed
    ProductUpdated { product: Product },

    /// A product was removed
    ProductDeleted { id: Uuid },
}

impl ProductEvent {
    /// Wire discriminator of this event
    pub fn kind(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated { .. } => "product_created",
            ProductEvent::ProductUpdated { .. } => "product_updated",
            ProductEvent::ProductDeleted { .. } => "product_deleted",
        }
    }

    /// Id of the product the event is about
    pub fn entity_id(&self) -> Uuid {
        match self {
            ProductEvent::ProductCreated { product }
            | ProductEvent::ProductUpdated { product } => product.id,
            ProductEvent::ProductDeleted { id } => *id,
        }
    }

    /// Decode a raw payload. Unmapped discriminators and malformed bodies
    /// come back as [`MessagingError::InvalidMessage`] so the consumer can
    /// drop them without treating them as transport failures.
    pub fn decode(raw: &serde_json::Value) -> MessagingResult<Self> {
        serde_json::from_value(raw.clone())
            .map_err(|e| MessagingError::InvalidMessage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product_json() -> serde_json::Value {
        json!({
            "id": "7f2c1f44-9a5e-4a2e-8a4e-0d7d7f1f2a3b",
            "name": "Red Running Shoes",
            "description": "Lightweight road shoes",
            "price": 99.99,
            "brand": "Nike",
            "category": "Shoes"
        })
    }

    #[test]
    fn test_decode_created() {
        let raw = json!({"type": "product_created", "product": product_json()});
        let event = ProductEvent::decode(&raw).unwrap();

        assert_eq!(event.kind(), "product_created");
        match event {
            ProductEvent::ProductCreated { product } => {
                assert_eq!(product.name, "Red Running Shoes");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_updated() {
        let raw = json!({"type": "product_updated", "product": product_json()});
        let event = ProductEvent::decode(&raw).unwrap();
        assert_eq!(event.kind(), "product_updated");
    }

    #[test]
    fn test_decode_deleted() {
        let raw = json!({
            "type": "product_deleted",
            "id": "7f2c1f44-9a5e-4a2e-8a4e-0d7d7f1f2a3b"
        });
        let event = ProductEvent::decode(&raw).unwrap();

        assert_eq!(event.kind(), "product_deleted");
        assert_eq!(
            event.entity_id().to_string(),
            "7f2c1f44-9a5e-4a2e-8a4e-0d7d7f1f2a3b"
        );
    }

    #[test]
    fn test_unknown_discriminator_rejected() {
        let raw = json!({"type": "product_archived", "id": "x"});
        assert!(matches!(
            ProductEvent::decode(&raw),
            Err(MessagingError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_malformed_body_rejected() {
        let raw = json!({"type": "product_deleted"});
        assert!(ProductEvent::decode(&raw).is_err());
    }

    #[test]
    fn test_round_trip() {
        let event = ProductEvent::ProductDeleted { id: Uuid::new_v4() };
        let raw = serde_json::to_value(&event).unwrap();
        assert_eq!(raw["type"], "product_deleted");
        assert_eq!(ProductEvent::decode(&raw).unwrap(), event);
    }
}
