//! Catalog domain types shared by the event and index layers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog product as carried by domain events and projected into the
/// search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identity, the document key in the index
    pub id: Uuid,

    /// Display name, full-text searchable
    pub name: String,

    /// Optional long description, full-text searchable
    pub description: Option<String>,

    /// Price in the catalog currency
    pub price: f64,

    /// Brand, exact-match facetable
    pub brand: String,

    /// Category, exact-match facetable
    pub category: String,
}
