//! Search document structures and the index schema

use crate::models::Product;
use serde::{Deserialize, Serialize};
use tantivy::schema::*;
use tantivy::TantivyDocument;
use uuid::Uuid;

/// Trait for documents that can be indexed and searched
pub trait SearchDocument {
    /// Convert to Tantivy document
    fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument;

    /// Get document ID
    fn document_id(&self) -> String;
}

/// Product document for search indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDocument {
    /// Product ID, the document key
    pub id: Uuid,

    /// Product name
    pub name: String,

    /// Product description
    pub description: Option<String>,

    /// Brand (keyword)
    pub brand: String,

    /// Category (keyword)
    pub category: String,

    /// Price
    pub price: f64,
}

impl From<&Product> for ProductDocument {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            brand: product.brand.clone(),
            category: product.category.clone(),
            price: product.price,
        }
    }
}

impl From<Product> for ProductDocument {
    fn from(product: Product) -> Self {
        Self::from(&product)
    }
}

impl SearchDocument for ProductDocument {
    fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument {
        let mut doc = TantivyDocument::new();

        // ID field
        if let Ok(field) = schema.get_field("id") {
            doc.add_text(field, self.id.to_string());
        }

        // Name field (indexed and stored)
        if let Ok(field) = schema.get_field("name") {
            doc.add_text(field, &self.name);
        }

        // Description field (indexed and stored)
        if let Some(ref description) = self.description {
            if let Ok(field) = schema.get_field("description") {
                doc.add_text(field, description);
            }
        }

        // Brand: raw keyword for filtering plus facet twin for aggregation
        if let Ok(field) = schema.get_field("brand") {
            doc.add_text(field, &self.brand);
        }
        if let Ok(field) = schema.get_field("brand_facet") {
            doc.add_facet(field, Facet::from(&format!("/brand/{}", self.brand)));
        }

        // Category: raw keyword plus facet twin
        if let Ok(field) = schema.get_field("category") {
            doc.add_text(field, &self.category);
        }
        if let Ok(field) = schema.get_field("category_facet") {
            doc.add_facet(field, Facet::from(&format!("/category/{}", self.category)));
        }

        // Price
        if let Ok(field) = schema.get_field("price") {
            doc.add_f64(field, self.price);
        }

        doc
    }

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}

/// Build the search schema for products.
///
/// `brand` and `category` exist twice: a raw keyword field used for exact
/// filters and hit mapping, and a facet field feeding the term aggregations
/// (the keyword/raw split of the index mapping).
pub fn build_product_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    // ID - stored, indexed as raw string; the delete/upsert key
    schema_builder.add_text_field("id", STRING | STORED);

    // Name - full-text indexed, stored
    schema_builder.add_text_field("name", TEXT | STORED);

    // Description - full-text indexed, stored
    schema_builder.add_text_field("description", TEXT | STORED);

    // Brand - raw keyword for exact-match filtering
    schema_builder.add_text_field("brand", STRING | STORED);

    // Category - raw keyword
    schema_builder.add_text_field("category", STRING | STORED);

    // Facet twins for term aggregations
    schema_builder.add_facet_field("brand_facet", INDEXED);
    schema_builder.add_facet_field("category_facet", INDEXED);

    // Price - numeric fast field for range filters and sorting
    schema_builder.add_f64_field("price", INDEXED | STORED | FAST);

    schema_builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Red Running Shoes".to_string(),
            description: Some("Lightweight road shoes".to_string()),
            price: 99.99,
            brand: "Nike".to_string(),
            category: "Shoes".to_string(),
        }
    }

    #[test]
    fn test_product_to_document() {
        let product = sample_product();
        let doc = ProductDocument::from(&product);

        assert_eq!(doc.name, "Red Running Shoes");
        assert_eq!(doc.brand, "Nike");
        assert_eq!(doc.document_id(), product.id.to_string());
    }

    #[test]
    fn test_schema_building() {
        let schema = build_product_schema();
        assert!(schema.get_field("id").is_ok());
        assert!(schema.get_field("name").is_ok());
        assert!(schema.get_field("description").is_ok());
        assert!(schema.get_field("brand").is_ok());
        assert!(schema.get_field("category").is_ok());
        assert!(schema.get_field("brand_facet").is_ok());
        assert!(schema.get_field("category_facet").is_ok());
        assert!(schema.get_field("price").is_ok());
    }

    #[test]
    fn test_document_without_description() {
        let mut product = sample_product();
        product.description = None;

        let schema = build_product_schema();
        let doc = ProductDocument::from(&product).to_tantivy_doc(&schema);

        let description = schema.get_field("description").unwrap();
        assert!(doc.get_first(description).is_none());
    }
}
