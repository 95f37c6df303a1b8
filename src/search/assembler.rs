//! Result assembly: raw hits and aggregation buckets to the response page.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::search::query::PageRequest;

/// Fixed facet order in every response, independent of what the index
/// returned.
pub const FACET_ORDER: [&str; 2] = ["brand", "category"];

/// A single search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductHit {
    /// Product ID
    pub id: Uuid,

    /// Product name
    pub name: String,

    /// Product description
    pub description: Option<String>,

    /// Brand
    pub brand: String,

    /// Category
    pub category: String,

    /// Price
    pub price: f64,

    /// Highlighted fragments per field (empty without a text query)
    pub highlights: HashMap<String, Vec<String>>,
}

/// One bucket of a facet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
}

/// A field-level breakdown of result counts by distinct value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facet {
    pub name: String,
    pub values: Vec<FacetValue>,
}

/// Search response with results, pagination, and facets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Page content
    pub content: Vec<ProductHit>,

    /// Zero-based page number
    pub page: usize,

    /// Requested page size
    pub size: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Exact total number of matching documents
    pub total_elements: u64,

    /// Facets, always brand then category
    pub facets: Vec<Facet>,
}

/// Assemble the response page from mapped hits, the exact total, and the
/// facet buckets keyed by facet name.
///
/// A facet whose aggregation is missing degrades to an empty value list
/// rather than failing the search. Bucket order within a facet is preserved
/// as collected (descending count).
pub fn assemble(
    hits: Vec<ProductHit>,
    total_elements: u64,
    mut facet_buckets: HashMap<String, Vec<FacetValue>>,
    page: &PageRequest,
) -> SearchResponse {
    let total_pages = if page.size > 0 {
        (total_elements as usize).div_ceil(page.size)
    } else {
        1
    };

    let facets = FACET_ORDER
        .iter()
        .map(|name| Facet {
            name: (*name).to_string(),
            values: facet_buckets.remove(*name).unwrap_or_default(),
        })
        .collect();

    SearchResponse {
        content: hits,
        page: page.page,
        size: page.size,
        total_pages,
        total_elements,
        facets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::query::SortSpec;

    fn page(page: usize, size: usize) -> PageRequest {
        PageRequest {
            page,
            size,
            sort: SortSpec::default(),
        }
    }

    #[test]
    fn test_pagination_arithmetic() {
        let response = assemble(vec![], 41, HashMap::new(), &page(0, 20));
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.total_elements, 41);

        let response = assemble(vec![], 40, HashMap::new(), &page(0, 20));
        assert_eq!(response.total_pages, 2);

        let response = assemble(vec![], 0, HashMap::new(), &page(0, 20));
        assert_eq!(response.total_pages, 0);
    }

    #[test]
    fn test_zero_size_yields_single_page() {
        let response = assemble(vec![], 7, HashMap::new(), &page(0, 0));
        assert_eq!(response.total_pages, 1);
    }

    #[test]
    fn test_facet_order_is_fixed() {
        let mut buckets = HashMap::new();
        buckets.insert(
            "category".to_string(),
            vec![FacetValue {
                value: "Shoes".to_string(),
                count: 3,
            }],
        );
        buckets.insert(
            "brand".to_string(),
            vec![FacetValue {
                value: "Nike".to_string(),
                count: 2,
            }],
        );

        let response = assemble(vec![], 3, buckets, &page(0, 10));
        assert_eq!(response.facets[0].name, "brand");
        assert_eq!(response.facets[1].name, "category");
    }

    #[test]
    fn test_missing_aggregation_degrades_to_empty() {
        let response = assemble(vec![], 0, HashMap::new(), &page(0, 10));
        assert_eq!(response.facets.len(), 2);
        assert!(response.facets.iter().all(|f| f.values.is_empty()));
    }

    #[test]
    fn test_bucket_order_preserved() {
        let mut buckets = HashMap::new();
        buckets.insert(
            "brand".to_string(),
            vec![
                FacetValue {
                    value: "Nike".to_string(),
                    count: 5,
                },
                FacetValue {
                    value: "Adidas".to_string(),
                    count: 2,
                },
            ],
        );

        let response = assemble(vec![], 7, buckets, &page(0, 10));
        assert_eq!(response.facets[0].values[0].value, "Nike");
        assert_eq!(response.facets[0].values[1].value, "Adidas");
    }

    #[test]
    fn test_wire_field_names() {
        let response = assemble(vec![], 1, HashMap::new(), &page(0, 10));
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("content").is_some());
        assert!(json.get("totalPages").is_some());
        assert!(json.get("totalElements").is_some());
        assert!(json.get("facets").is_some());
    }
}
