use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use ji_core::analytics::Pagination;
use ji_core::{Hit, SearchResponse, Source};
use ji_search::queries;
use serde::{Deserialize, Serialize};

use super::{page_params, parse_source_or};
use crate::error::{ApiError, Context};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub items_per_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub hits: Vec<Hit>,
    pub total: u64,
    pub pagination: Pagination,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResult>, ApiError> {
    let Json(request) = body?;
    // Free-text search covers posts unless news is asked for.
    let source = parse_source_or(request.source.as_deref(), Source::Twitter)?;
    let (page, items_per_page) = page_params(request.page, request.items_per_page)?;

    let body = queries::search_content(
        source,
        request.query.as_deref(),
        &Pagination::new(page, items_per_page, 0),
    );
    let result = state
        .backend
        .search(source.index(), body)
        .await
        .context("Failed to search content")?;

    let total = result.total();
    tracing::debug!("Search {:?} on {} matched {} documents", request.query, source, total);
    Ok(Json(SearchResult {
        hits: result.hits.hits,
        total,
        pagination: Pagination::new(page, items_per_page, total),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsSearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

/// Latest matching news articles, passed through in the engine's own shape.
pub async fn news_search(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewsSearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = body?;
    let result = state
        .backend
        .search(ji_core::NEWS_INDEX, queries::news_search(request.query.as_deref()))
        .await
        .context("Failed to search news")?;
    Ok(Json(result))
}
