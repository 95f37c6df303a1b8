//! Search index management and query lowering

use crate::search::config::SearchConfig;
use crate::search::document::{build_product_schema, ProductDocument, SearchDocument};
use crate::search::error::{SearchError, SearchResult};
use crate::search::query::{FilterClause, IndexQuery, TextClause};
use serde::{Deserialize, Serialize};
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;
use tantivy::collector::Count;
use tantivy::query::{
    AllQuery, BooleanQuery, BoostQuery, ConstScoreQuery, DisjunctionMaxQuery, FuzzyTermQuery,
    Occur, Query, RangeQuery, TermQuery,
};
use tantivy::schema::{IndexRecordOption, Schema};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Term};
use tokio::sync::RwLock;

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of documents in the index
    pub total_documents: u64,

    /// Number of segments
    pub num_segments: usize,
}

/// Manages the Tantivy search index
pub struct IndexManager {
    /// The Tantivy index
    index: Index,

    /// The schema
    schema: Schema,

    /// Index writer (wrapped in RwLock for thread-safety)
    writer: Arc<RwLock<IndexWriter>>,

    /// Index reader
    reader: IndexReader,

    /// Configuration
    config: SearchConfig,
}

impl IndexManager {
    /// Create a new IndexManager
    pub async fn new(config: SearchConfig) -> SearchResult<Self> {
        // Create index directory if it doesn't exist
        std::fs::create_dir_all(&config.index_path).map_err(|e| {
            SearchError::IndexInitFailed(format!("Failed to create index directory: {}", e))
        })?;

        // Build schema
        let schema = build_product_schema();

        // Open or create index
        let index = if Self::index_exists(&config.index_path) {
            Index::open_in_dir(&config.index_path).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to open existing index: {}", e))
            })?
        } else {
            Index::create_in_dir(&config.index_path, schema.clone()).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to create new index: {}", e))
            })?
        };

        // Create index writer
        let writer = index
            .writer(config.writer_heap_size)
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create writer: {}", e)))?;

        // Create index reader with reload policy
        let reader = index
            .reader_builder()
            .reload_policy(if config.realtime_indexing {
                ReloadPolicy::OnCommitWithDelay
            } else {
                ReloadPolicy::Manual
            })
            .try_into()
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create reader: {}", e)))?;

        Ok(Self {
            index,
            schema,
            writer: Arc::new(RwLock::new(writer)),
            reader,
            config,
        })
    }

    /// Check if an index exists at the given path
    fn index_exists(path: &Path) -> bool {
        path.join("meta.json").exists()
    }

    /// Get the schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Get the index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Get the reader
    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Upsert a product document: any existing document with the same id is
    /// replaced, so replays and duplicate deliveries converge.
    pub async fn upsert_document(&self, document: &ProductDocument) -> SearchResult<()> {
        let tantivy_doc = document.to_tantivy_doc(&self.schema);

        let mut writer = self.writer.write().await;

        // Delete existing document with same ID first
        if let Ok(id_field) = self.schema.get_field("id") {
            let term = Term::from_field_text(id_field, &document.document_id());
            writer.delete_term(term);
        }

        // Add the document
        writer
            .add_document(tantivy_doc)
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to add document: {}", e)))?;

        if self.config.realtime_indexing {
            writer.commit().map_err(|e| {
                SearchError::IndexingFailed(format!("Failed to commit document: {}", e))
            })?;
            self.reader.reload()?;
        }

        Ok(())
    }

    /// Delete a document by ID. Deleting an absent id is not an error.
    pub async fn delete_document(&self, document_id: &str) -> SearchResult<()> {
        let mut writer = self.writer.write().await;

        if let Ok(id_field) = self.schema.get_field("id") {
            let term = Term::from_field_text(id_field, document_id);
            writer.delete_term(term);

            if self.config.realtime_indexing {
                writer.commit().map_err(|e| {
                    SearchError::DeletionFailed(format!("Failed to commit deletion: {}", e))
                })?;
                self.reader.reload()?;
            }
        }

        Ok(())
    }

    /// Commit pending changes
    pub async fn commit(&self) -> SearchResult<()> {
        let mut writer = self.writer.write().await;
        writer
            .commit()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit: {}", e)))?;
        self.reader.reload()?;
        Ok(())
    }

    /// Get index statistics
    pub async fn stats(&self) -> SearchResult<IndexStats> {
        let searcher = self.reader.searcher();

        let total_documents = searcher
            .search(&AllQuery, &Count)
            .map_err(|e| SearchError::SearchFailed(format!("Failed to count documents: {}", e)))?
            as u64;

        let num_segments = searcher.segment_readers().len();

        Ok(IndexStats {
            total_documents,
            num_segments,
        })
    }

    /// Lower a compiled [`IndexQuery`] onto tantivy's query tree.
    ///
    /// The text clause is the only scored clause; filters are wrapped so
    /// they match without contributing to the score. With neither text nor
    /// filters this is a plain match-all, and with filters but no text the
    /// match-all anchor keeps every matching document at score 1.
    pub fn to_query(&self, compiled: &IndexQuery) -> SearchResult<Box<dyn Query>> {
        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        match &compiled.text {
            Some(text) => subqueries.push((Occur::Must, self.text_query(text)?)),
            None => {
                if !compiled.filters.is_empty() {
                    subqueries.push((Occur::Must, Box::new(AllQuery)));
                }
            }
        }

        for filter in &compiled.filters {
            let inner = self.filter_query(filter)?;
            subqueries.push((Occur::Must, Box::new(ConstScoreQuery::new(inner, 0.0))));
        }

        if subqueries.is_empty() {
            Ok(Box::new(AllQuery))
        } else {
            Ok(Box::new(BooleanQuery::from(subqueries)))
        }
    }

    /// The scored multi-field text clause: AND between terms, each term
    /// scored by its best field (dis-max), name boosted over description,
    /// fuzziness per the compiled edit-distance tier.
    fn text_query(&self, clause: &TextClause) -> SearchResult<Box<dyn Query>> {
        let mut term_queries: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        for term in &clause.terms {
            let mut per_field: Vec<Box<dyn Query>> = Vec::new();

            for boosted in &clause.fields {
                let field = self.schema.get_field(&boosted.field)?;
                let tantivy_term = Term::from_field_text(field, &term.text);

                let field_query: Box<dyn Query> = if term.max_distance == 0 {
                    Box::new(TermQuery::new(tantivy_term, IndexRecordOption::WithFreqs))
                } else {
                    Box::new(FuzzyTermQuery::new(tantivy_term, term.max_distance, true))
                };

                per_field.push(if boosted.boost != 1.0 {
                    Box::new(BoostQuery::new(field_query, boosted.boost))
                } else {
                    field_query
                });
            }

            term_queries.push((Occur::Must, Box::new(DisjunctionMaxQuery::new(per_field))));
        }

        Ok(Box::new(BooleanQuery::from(term_queries)))
    }

    fn filter_query(&self, filter: &FilterClause) -> SearchResult<Box<dyn Query>> {
        match filter {
            FilterClause::TermsIn { field, values } => {
                let keyword_field = self.schema.get_field(field)?;
                let value_queries: Vec<Box<dyn Query>> = values
                    .iter()
                    .map(|value| {
                        Box::new(TermQuery::new(
                            Term::from_field_text(keyword_field, value),
                            IndexRecordOption::Basic,
                        )) as Box<dyn Query>
                    })
                    .collect();
                Ok(Box::new(DisjunctionMaxQuery::new(value_queries)))
            }
            FilterClause::PriceRange { from, to } => {
                let lower = from.map(Bound::Included).unwrap_or(Bound::Unbounded);
                let upper = to.map(Bound::Included).unwrap_or(Bound::Unbounded);
                Ok(Box::new(RangeQuery::new_f64_bounds(
                    "price".to_string(),
                    lower,
                    upper,
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::query::{PageRequest, QueryCompiler, SearchRequest};
    use tempfile::TempDir;

    async fn test_manager() -> (IndexManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        (IndexManager::new(config).await.unwrap(), temp_dir)
    }

    #[tokio::test]
    async fn test_index_creation() {
        let (_manager, _dir) = test_manager().await;
    }

    #[tokio::test]
    async fn test_empty_index_stats() {
        let (manager, _dir) = test_manager().await;
        let stats = manager.stats().await.unwrap();
        assert_eq!(stats.total_documents, 0);
    }

    #[tokio::test]
    async fn test_lowering_builds_queries() {
        let (manager, _dir) = test_manager().await;
        let compiler = QueryCompiler::new(&SearchConfig::default());

        // Match-all
        let compiled = compiler.compile(&SearchRequest::default(), &PageRequest::default());
        assert!(manager.to_query(&compiled).is_ok());

        // Text + filters
        let request = SearchRequest {
            query: Some("red shoes".to_string()),
            brands: Some(["Nike".to_string()].into()),
            price_from: Some(50.0),
            price_to: Some(150.0),
            ..Default::default()
        };
        let compiled = compiler.compile(&request, &PageRequest::default());
        assert!(manager.to_query(&compiled).is_ok());
    }
}
