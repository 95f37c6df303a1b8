//! Search configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Path to the search index directory
    pub index_path: PathBuf,

    /// Index writer heap size in bytes (default: 50MB)
    pub writer_heap_size: usize,

    /// Commit after every write so events become searchable immediately
    pub realtime_indexing: bool,

    /// Maximum search results to return per page
    pub max_results: usize,

    /// Number of buckets per facet aggregation
    pub facet_size: usize,

    /// Boost applied to the name field in the text clause
    pub name_boost: f32,

    /// Opening marker wrapped around highlighted terms
    pub highlight_pre_tag: String,

    /// Closing marker wrapped around highlighted terms
    pub highlight_post_tag: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./data/search_index"),
            writer_heap_size: 50_000_000, // 50MB
            realtime_indexing: true,
            max_results: 1000,
            facet_size: 20,
            name_boost: 3.0,
            highlight_pre_tag: "<em>".to_string(),
            highlight_post_tag: "</em>".to_string(),
        }
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn index_path(mut self, path: PathBuf) -> Self {
        self.config.index_path = path;
        self
    }

    pub fn writer_heap_size(mut self, size: usize) -> Self {
        self.config.writer_heap_size = size;
        self
    }

    pub fn realtime_indexing(mut self, enabled: bool) -> Self {
        self.config.realtime_indexing = enabled;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    pub fn facet_size(mut self, size: usize) -> Self {
        self.config.facet_size = size;
        self
    }

    pub fn highlight_tags(mut self, pre: impl Into<String>, post: impl Into<String>) -> Self {
        self.config.highlight_pre_tag = pre.into();
        self.config.highlight_post_tag = post.into();
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.facet_size, 20);
        assert_eq!(config.name_boost, 3.0);
        assert_eq!(config.highlight_pre_tag, "<em>");
        assert_eq!(config.highlight_post_tag, "</em>");
    }

    #[test]
    fn test_builder() {
        let config = SearchConfigBuilder::new()
            .index_path(PathBuf::from("/tmp/idx"))
            .max_results(50)
            .highlight_tags("<b>", "</b>")
            .build();

        assert_eq!(config.index_path, PathBuf::from("/tmp/idx"));
        assert_eq!(config.max_results, 50);
        assert_eq!(config.highlight_pre_tag, "<b>");
    }
}
