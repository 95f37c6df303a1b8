//! Search request types and the query compiler.
//!
//! [`QueryCompiler::compile`] is pure: it maps a [`SearchRequest`] plus a
//! [`PageRequest`] to an [`IndexQuery`] value without touching the index,
//! so the query-construction policy is unit-testable on its own. Lowering
//! onto tantivy happens in the index layer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::search::config::SearchConfig;
use crate::search::error::{SearchError, SearchResult};

/// Sort order for search results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Field to sort by
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortField {
    /// Order by the price fast field
    Price,
    /// Order by text relevance (best match first)
    Relevance,
}

/// A parsed sort specification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::Price,
            order: SortOrder::Ascending,
        }
    }
}

impl SortSpec {
    /// Parse the wire form `"field,direction"` (direction optional,
    /// defaulting to ascending). Unknown fields or directions are
    /// validation errors, not silent fallbacks.
    pub fn parse(raw: &str) -> SearchResult<Self> {
        let mut parts = raw.splitn(2, ',');
        let field = match parts.next().map(str::trim) {
            Some("price") => SortField::Price,
            Some("relevance") | Some("_score") => SortField::Relevance,
            Some(other) => {
                return Err(SearchError::InvalidSort(format!(
                    "unknown sort field '{other}'"
                )))
            }
            None => SortField::Price,
        };

        let order = match parts.next().map(str::trim) {
            None | Some("") => SortOrder::Ascending,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => SortOrder::Ascending,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => SortOrder::Descending,
            Some(other) => {
                return Err(SearchError::InvalidSort(format!(
                    "unknown sort direction '{other}'"
                )))
            }
        };

        Ok(Self { field, order })
    }
}

/// Pagination and ordering for one search call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageRequest {
    /// Zero-based page number
    pub page: usize,

    /// Page size
    pub size: usize,

    /// Sort specification
    pub sort: SortSpec,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 20,
            sort: SortSpec::default(),
        }
    }
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        self.page * self.size
    }
}

/// A structured product search request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query across name and description
    pub query: Option<String>,

    /// Restrict to these brands (OR within the set)
    pub brands: Option<BTreeSet<String>>,

    /// Restrict to these categories (OR within the set)
    pub categories: Option<BTreeSet<String>>,

    /// Inclusive lower price bound
    pub price_from: Option<f64>,

    /// Inclusive upper price bound
    pub price_to: Option<f64>,
}

impl SearchRequest {
    /// The text query with blank strings treated as absent
    pub fn text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// One query token with its fuzzy edit-distance budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyTerm {
    pub text: String,
    pub max_distance: u8,
}

/// A searchable field and its score boost
#[derive(Debug, Clone, PartialEq)]
pub struct BoostedField {
    pub field: String,
    pub boost: f32,
}

/// The scored full-text clause: every term must match (AND semantics),
/// each term scored by its best field (dis-max across the boosted fields).
#[derive(Debug, Clone, PartialEq)]
pub struct TextClause {
    pub terms: Vec<FuzzyTerm>,
    pub fields: Vec<BoostedField>,
}

/// An unscored filter clause
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// Keyword field value must be one of the given values
    TermsIn { field: String, values: Vec<String> },

    /// Price within the (half-)open interval
    PriceRange {
        from: Option<f64>,
        to: Option<f64>,
    },
}

/// A term aggregation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetRequest {
    /// Facet name in the response
    pub name: String,

    /// Facet field in the index
    pub field: String,

    /// Facet path prefix the buckets live under
    pub path: String,

    /// Maximum number of buckets
    pub size: usize,
}

/// Highlight directives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpec {
    pub fields: Vec<String>,
    pub pre_tag: String,
    pub post_tag: String,
}

/// The compiled index query: a pure value describing exactly what the
/// index layer should execute.
#[derive(Debug, Clone)]
pub struct IndexQuery {
    pub text: Option<TextClause>,
    pub filters: Vec<FilterClause>,
    pub facets: Vec<FacetRequest>,
    pub highlight: HighlightSpec,
    pub page: PageRequest,
}

/// Compiles search requests into index queries
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    name_boost: f32,
    facet_size: usize,
    highlight_pre_tag: String,
    highlight_post_tag: String,
}

impl QueryCompiler {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            name_boost: config.name_boost,
            facet_size: config.facet_size,
            highlight_pre_tag: config.highlight_pre_tag.clone(),
            highlight_post_tag: config.highlight_post_tag.clone(),
        }
    }

    /// Compile a request into an [`IndexQuery`].
    pub fn compile(&self, request: &SearchRequest, page: &PageRequest) -> IndexQuery {
        let text = request.text().map(|q| self.text_clause(q));

        let mut filters = Vec::new();
        if let Some(brands) = request.brands.as_ref().filter(|b| !b.is_empty()) {
            filters.push(FilterClause::TermsIn {
                field: "brand".to_string(),
                values: brands.iter().cloned().collect(),
            });
        }
        if let Some(categories) = request.categories.as_ref().filter(|c| !c.is_empty()) {
            filters.push(FilterClause::TermsIn {
                field: "category".to_string(),
                values: categories.iter().cloned().collect(),
            });
        }
        if request.price_from.is_some() || request.price_to.is_some() {
            filters.push(FilterClause::PriceRange {
                from: request.price_from,
                to: request.price_to,
            });
        }

        // Facets always run, over the same filtered+scored query, so the
        // buckets narrow together with the result set.
        let facets = vec![
            FacetRequest {
                name: "brand".to_string(),
                field: "brand_facet".to_string(),
                path: "/brand".to_string(),
                size: self.facet_size,
            },
            FacetRequest {
                name: "category".to_string(),
                field: "category_facet".to_string(),
                path: "/category".to_string(),
                size: self.facet_size,
            },
        ];

        let highlight = HighlightSpec {
            fields: vec!["name".to_string(), "description".to_string()],
            pre_tag: self.highlight_pre_tag.clone(),
            post_tag: self.highlight_post_tag.clone(),
        };

        IndexQuery {
            text,
            filters,
            facets,
            highlight,
            page: page.clone(),
        }
    }

    fn text_clause(&self, query: &str) -> TextClause {
        let terms = tokenize(query)
            .into_iter()
            .map(|token| {
                let max_distance = auto_fuzzy_distance(&token);
                FuzzyTerm {
                    text: token,
                    max_distance,
                }
            })
            .collect();

        TextClause {
            terms,
            fields: vec![
                BoostedField {
                    field: "name".to_string(),
                    boost: self.name_boost,
                },
                BoostedField {
                    field: "description".to_string(),
                    boost: 1.0,
                },
            ],
        }
    }
}

/// Split a query the way the default analyzer does: alphanumeric runs,
/// lowercased.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Automatic fuzziness tier keyed to term length: very short terms must
/// match exactly, mid-length terms allow one edit, longer terms two.
fn auto_fuzzy_distance(term: &str) -> u8 {
    match term.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiler() -> QueryCompiler {
        QueryCompiler::new(&SearchConfig::default())
    }

    #[test]
    fn test_empty_request_compiles_to_match_all() {
        let compiled = compiler().compile(&SearchRequest::default(), &PageRequest::default());

        assert!(compiled.text.is_none());
        assert!(compiled.filters.is_empty());
        assert_eq!(compiled.facets.len(), 2);
        assert_eq!(compiled.page.sort, SortSpec::default());
    }

    #[test]
    fn test_blank_query_treated_as_absent() {
        let request = SearchRequest {
            query: Some("   ".to_string()),
            ..Default::default()
        };

        let compiled = compiler().compile(&request, &PageRequest::default());
        assert!(compiled.text.is_none());
    }

    #[test]
    fn test_text_clause_boosts_and_tokens() {
        let request = SearchRequest {
            query: Some("Red Shoes".to_string()),
            ..Default::default()
        };

        let compiled = compiler().compile(&request, &PageRequest::default());
        let text = compiled.text.expect("text clause");

        assert_eq!(
            text.terms.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["red", "shoes"]
        );
        assert_eq!(text.fields[0].field, "name");
        assert_eq!(text.fields[0].boost, 3.0);
        assert_eq!(text.fields[1].field, "description");
        assert_eq!(text.fields[1].boost, 1.0);
    }

    #[test]
    fn test_fuzzy_distance_tiers() {
        let request = SearchRequest {
            query: Some("an table keyboards".to_string()),
            ..Default::default()
        };

        let compiled = compiler().compile(&request, &PageRequest::default());
        let text = compiled.text.unwrap();

        assert_eq!(text.terms[0].max_distance, 0); // "an"
        assert_eq!(text.terms[1].max_distance, 1); // "table"
        assert_eq!(text.terms[2].max_distance, 2); // "keyboards"
    }

    #[test]
    fn test_filters_compile() {
        let request = SearchRequest {
            brands: Some(["Nike".to_string(), "Adidas".to_string()].into()),
            categories: Some(["Shoes".to_string()].into()),
            price_from: Some(50.0),
            price_to: None,
            ..Default::default()
        };

        let compiled = compiler().compile(&request, &PageRequest::default());

        assert_eq!(compiled.filters.len(), 3);
        assert_eq!(
            compiled.filters[0],
            FilterClause::TermsIn {
                field: "brand".to_string(),
                values: vec!["Adidas".to_string(), "Nike".to_string()],
            }
        );
        assert_eq!(
            compiled.filters[2],
            FilterClause::PriceRange {
                from: Some(50.0),
                to: None,
            }
        );
    }

    #[test]
    fn test_empty_filter_sets_omitted() {
        let request = SearchRequest {
            brands: Some(BTreeSet::new()),
            ..Default::default()
        };

        let compiled = compiler().compile(&request, &PageRequest::default());
        assert!(compiled.filters.is_empty());
    }

    #[test]
    fn test_facets_always_requested() {
        let compiled = compiler().compile(&SearchRequest::default(), &PageRequest::default());

        assert_eq!(compiled.facets[0].name, "brand");
        assert_eq!(compiled.facets[0].field, "brand_facet");
        assert_eq!(compiled.facets[0].size, 20);
        assert_eq!(compiled.facets[1].name, "category");
    }

    #[test]
    fn test_highlight_spec() {
        let compiled = compiler().compile(&SearchRequest::default(), &PageRequest::default());

        assert_eq!(compiled.highlight.fields, vec!["name", "description"]);
        assert_eq!(compiled.highlight.pre_tag, "<em>");
        assert_eq!(compiled.highlight.post_tag, "</em>");
    }

    #[test]
    fn test_sort_spec_parse() {
        assert_eq!(
            SortSpec::parse("price,asc").unwrap(),
            SortSpec {
                field: SortField::Price,
                order: SortOrder::Ascending,
            }
        );
        assert_eq!(
            SortSpec::parse("price,DESC").unwrap().order,
            SortOrder::Descending
        );
        assert_eq!(
            SortSpec::parse("relevance").unwrap().field,
            SortField::Relevance
        );
    }

    #[test]
    fn test_sort_spec_parse_rejects_unknown() {
        assert!(matches!(
            SortSpec::parse("price,sideways"),
            Err(SearchError::InvalidSort(_))
        ));
        assert!(matches!(
            SortSpec::parse("popularity,asc"),
            Err(SearchError::InvalidSort(_))
        ));
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Red-Shoes, size 42"), vec!["red", "shoes", "size", "42"]);
        assert!(tokenize("  ,;  ").is_empty());
    }

    #[test]
    fn test_page_offset() {
        let page = PageRequest {
            page: 3,
            size: 10,
            sort: SortSpec::default(),
        };
        assert_eq!(page.offset(), 30);
    }
}
