//! Full-text product search backed by a tantivy index.
//!
//! The module is split along the query pipeline:
//!
//! ```text
//! SearchRequest ──► QueryCompiler ──► IndexQuery ──► IndexManager ──► raw hits
//!                                                                        │
//!                       SearchResponse ◄── assembler ◄──────────────────┘
//! ```
//!
//! - [`query`] compiles a [`SearchRequest`] into a pure [`IndexQuery`] value:
//!   one scored text clause (boosted, fuzzy, AND between tokens), unscored
//!   term/range filters, two facet aggregation requests, and the highlight
//!   directives.
//! - [`index`] owns the tantivy schema, writer, and reader and lowers the
//!   compiled query onto tantivy's query tree.
//! - [`assembler`] turns raw hits, the exact hit count, and facet buckets
//!   into the paginated response.
//! - [`service`] ties the pipeline together and exposes the upsert/delete
//!   surface the index synchronizer writes through.

mod assembler;
mod config;
mod document;
mod error;
mod highlight;
mod index;
mod query;
mod service;

pub use assembler::{assemble, Facet, FacetValue, ProductHit, SearchResponse, FACET_ORDER};
pub use config::{SearchConfig, SearchConfigBuilder};
pub use document::{build_product_schema, ProductDocument, SearchDocument};
pub use error::{SearchError, SearchResult};
pub use index::{IndexManager, IndexStats};
pub use query::{
    BoostedField, FacetRequest, FilterClause, FuzzyTerm, HighlightSpec, IndexQuery, PageRequest,
    QueryCompiler, SearchRequest, SortField, SortOrder, SortSpec, TextClause,
};
pub use service::{ProductIndexer, SearchService};
