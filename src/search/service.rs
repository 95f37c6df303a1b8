//! Main search service implementation

use crate::models::Product;
use crate::search::assembler::{assemble, FacetValue, ProductHit, SearchResponse};
use crate::search::config::SearchConfig;
use crate::search::document::ProductDocument;
use crate::search::error::{SearchError, SearchResult};
use crate::search::highlight::highlight_field;
use crate::search::index::{IndexManager, IndexStats};
use crate::search::query::{
    FacetRequest, IndexQuery, PageRequest, QueryCompiler, SearchRequest, SortField, SortOrder,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tantivy::collector::{Count, FacetCollector, TopDocs};
use tantivy::query::Query;
use tantivy::schema::{Schema, Value};
use tantivy::{DocAddress, Order, Searcher, TantivyDocument};
use uuid::Uuid;

/// Write surface of the index, consumed by the event synchronizer.
#[async_trait]
pub trait ProductIndexer: Send + Sync {
    /// Insert or replace the document for this product
    async fn upsert(&self, product: &Product) -> SearchResult<()>;

    /// Remove the document for this id; absent ids succeed
    async fn delete(&self, id: Uuid) -> SearchResult<()>;
}

/// Main search service
pub struct SearchService {
    /// Index manager
    index: Arc<IndexManager>,

    /// Query compiler
    compiler: QueryCompiler,

    /// Configuration
    config: SearchConfig,
}

impl SearchService {
    /// Create a new search service
    pub async fn new(config: SearchConfig) -> SearchResult<Self> {
        let index = Arc::new(IndexManager::new(config.clone()).await?);
        let compiler = QueryCompiler::new(&config);

        Ok(Self {
            index,
            compiler,
            config,
        })
    }

    /// Execute a search: compile the request, run it against the index,
    /// and assemble the response page.
    pub async fn search(
        &self,
        request: &SearchRequest,
        page: &PageRequest,
    ) -> SearchResult<SearchResponse> {
        let compiled = self.compiler.compile(request, page);
        let query = self.index.to_query(&compiled)?;
        let searcher = self.index.reader().searcher();

        let addresses = self.collect_page(&searcher, &*query, &compiled)?;

        let total_elements = searcher
            .search(&*query, &Count)
            .map_err(|e| SearchError::SearchFailed(format!("Count failed: {}", e)))?
            as u64;

        let schema = self.index.schema();
        let mut hits = Vec::with_capacity(addresses.len());
        for address in addresses {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| SearchError::SearchFailed(format!("Failed to retrieve doc: {}", e)))?;
            hits.push(self.doc_to_hit(&doc, schema, &compiled)?);
        }

        let facet_buckets = self.compute_facets(&searcher, &*query, &compiled.facets)?;

        Ok(assemble(hits, total_elements, facet_buckets, page))
    }

    /// Get index statistics
    pub async fn stats(&self) -> SearchResult<IndexStats> {
        self.index.stats().await
    }

    /// Collect the document addresses of the requested page in the
    /// requested order.
    fn collect_page(
        &self,
        searcher: &Searcher,
        query: &dyn Query,
        compiled: &IndexQuery,
    ) -> SearchResult<Vec<DocAddress>> {
        let page = &compiled.page;
        if page.size == 0 {
            return Ok(Vec::new());
        }

        let limit = page.size.min(self.config.max_results);
        let offset = page.offset();

        let addresses = match page.sort.field {
            SortField::Price => {
                let order = match page.sort.order {
                    SortOrder::Ascending => Order::Asc,
                    SortOrder::Descending => Order::Desc,
                };
                let collector = TopDocs::with_limit(limit)
                    .and_offset(offset)
                    .order_by_fast_field::<f64>("price", order);
                searcher
                    .search(query, &collector)
                    .map_err(|e| SearchError::SearchFailed(format!("Search failed: {}", e)))?
                    .into_iter()
                    .map(|(_price, address)| address)
                    .collect()
            }
            // Relevance is always best-first; the direction token is
            // meaningless here and ignored.
            SortField::Relevance => {
                let collector = TopDocs::with_limit(limit).and_offset(offset);
                searcher
                    .search(query, &collector)
                    .map_err(|e| SearchError::SearchFailed(format!("Search failed: {}", e)))?
                    .into_iter()
                    .map(|(_score, address)| address)
                    .collect()
            }
        };

        Ok(addresses)
    }

    /// Convert a stored document into a response hit, attaching highlight
    /// fragments when a text clause was compiled.
    fn doc_to_hit(
        &self,
        doc: &TantivyDocument,
        schema: &Schema,
        compiled: &IndexQuery,
    ) -> SearchResult<ProductHit> {
        let id_raw = self
            .get_field_value(doc, schema, "id")
            .ok_or_else(|| SearchError::SearchFailed("document missing id".to_string()))?;
        let id = Uuid::parse_str(&id_raw)
            .map_err(|e| SearchError::SearchFailed(format!("invalid document id: {}", e)))?;

        let name = self.get_field_value(doc, schema, "name").unwrap_or_default();
        let description = self.get_field_value(doc, schema, "description");
        let brand = self
            .get_field_value(doc, schema, "brand")
            .unwrap_or_default();
        let category = self
            .get_field_value(doc, schema, "category")
            .unwrap_or_default();
        let price = self.get_f64_value(doc, schema, "price").unwrap_or_default();

        let mut highlights: HashMap<String, Vec<String>> = HashMap::new();
        if let Some(text) = &compiled.text {
            let terms: Vec<String> = text.terms.iter().map(|t| t.text.clone()).collect();
            for field in &compiled.highlight.fields {
                let stored = match field.as_str() {
                    "name" => Some(name.as_str()),
                    "description" => description.as_deref(),
                    _ => None,
                };
                if let Some(stored) = stored {
                    if let Some(fragment) = highlight_field(stored, &terms, &compiled.highlight) {
                        highlights.insert(field.clone(), vec![fragment]);
                    }
                }
            }
        }

        Ok(ProductHit {
            id,
            name,
            description,
            brand,
            category,
            price,
            highlights,
        })
    }

    /// Get text field value from document
    fn get_field_value(
        &self,
        doc: &TantivyDocument,
        schema: &Schema,
        field_name: &str,
    ) -> Option<String> {
        schema.get_field(field_name).ok().and_then(|field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        })
    }

    /// Get numeric field value from document
    fn get_f64_value(&self, doc: &TantivyDocument, schema: &Schema, field_name: &str) -> Option<f64> {
        schema
            .get_field(field_name)
            .ok()
            .and_then(|field| doc.get_first(field).and_then(|v| v.as_f64()))
    }

    /// Run the facet aggregations over the same query the page was
    /// collected with, so buckets narrow together with the result set.
    fn compute_facets(
        &self,
        searcher: &Searcher,
        query: &dyn Query,
        requests: &[FacetRequest],
    ) -> SearchResult<HashMap<String, Vec<FacetValue>>> {
        let mut results = HashMap::new();

        for request in requests {
            let mut collector = FacetCollector::for_field(&request.field);
            collector.add_facet(request.path.as_str());

            let facet_counts = searcher.search(query, &collector).map_err(|e| {
                SearchError::SearchFailed(format!("Facet aggregation failed: {}", e))
            })?;

            let mut buckets = Vec::new();
            for (facet, count) in facet_counts.get(request.path.as_str()) {
                let facet_str = facet.to_string();
                let value = facet_str.rsplit('/').next().unwrap_or("");
                if !value.is_empty() {
                    buckets.push(FacetValue {
                        value: value.to_string(),
                        count,
                    });
                }
            }

            // Descending count, value as the deterministic tie-break
            buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
            buckets.truncate(request.size);

            results.insert(request.name.clone(), buckets);
        }

        Ok(results)
    }
}

#[async_trait]
impl ProductIndexer for SearchService {
    async fn upsert(&self, product: &Product) -> SearchResult<()> {
        let document = ProductDocument::from(product);
        self.index.upsert_document(&document).await
    }

    async fn delete(&self, id: Uuid) -> SearchResult<()> {
        self.index.delete_document(&id.to_string()).await
    }
}
