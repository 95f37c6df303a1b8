use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::search::{PageRequest, SearchRequest, SearchResponse, SortSpec};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let stats = state.search.stats().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        indexed_documents: stats.total_documents,
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub indexed_documents: u64,
}

/// Prometheus metrics endpoint
pub async fn metrics() -> Result<String> {
    let encoder = prometheus::TextEncoder::new();
    encoder
        .encode_to_string(&prometheus::gather())
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Product search endpoint
pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    params.validate()?;

    let request = params.to_request();
    let page = params.to_page()?;

    let response = state.search.search(&request, &page).await?;
    Ok(Json(response))
}

/// Wire form of the search request
#[derive(Debug, Deserialize, Validate)]
pub struct SearchParams {
    /// Free-text query
    pub q: Option<String>,

    /// Comma-separated brand filter
    pub brand: Option<String>,

    /// Comma-separated category filter
    pub category: Option<String>,

    #[serde(rename = "priceFrom")]
    pub price_from: Option<f64>,

    #[serde(rename = "priceTo")]
    pub price_to: Option<f64>,

    #[serde(default)]
    pub page: usize,

    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub size: usize,

    /// Sort specification, `field,direction`
    pub sort: Option<String>,
}

fn default_page_size() -> usize {
    20
}

impl SearchParams {
    pub fn to_request(&self) -> SearchRequest {
        SearchRequest {
            query: self.q.clone(),
            brands: split_csv(self.brand.as_deref()),
            categories: split_csv(self.category.as_deref()),
            price_from: self.price_from,
            price_to: self.price_to,
        }
    }

    pub fn to_page(&self) -> Result<PageRequest> {
        let sort = match self.sort.as_deref() {
            Some(raw) => SortSpec::parse(raw)?,
            None => SortSpec::default(),
        };

        Ok(PageRequest {
            page: self.page,
            size: self.size,
            sort,
        })
    }
}

/// Split a comma-separated multi-value parameter into a set.
fn split_csv(raw: Option<&str>) -> Option<BTreeSet<String>> {
    let values: BTreeSet<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}
