use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use ji_core::aggs::{Aggs, Bucket};
use ji_core::{SearchResponse, Source};
use ji_search::queries;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, Context};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TrendingParams {
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TrendingResponse {
    /// Latest twitter digest with its location/hashtag/mention totals.
    Twitter { data: Option<Value> },
    News { trending: Vec<Bucket> },
}

pub fn trending_keywords(response: &SearchResponse) -> Vec<Bucket> {
    let aggs: Aggs<'_> = response.aggs();
    aggs.sub("filtered_trending_keywords").buckets("trending_keywords")
}

pub async fn trending(
    State(state): State<Arc<AppState>>,
    params: Result<Query<TrendingParams>, QueryRejection>,
) -> Result<Json<TrendingResponse>, ApiError> {
    let Query(params) = params?;
    let source = super::parse_source(params.source.as_deref())?;

    let response = match source {
        Source::Twitter => {
            let result = state
                .backend
                .search(Source::Twitter.insight_index(), queries::latest_insight())
                .await
                .context("Failed to fetch trending topics")?;
            let data = result.hits.hits.into_iter().next().map(|hit| hit.source);
            TrendingResponse::Twitter { data }
        }
        Source::News => {
            let result = state
                .backend
                .search(Source::News.index(), queries::trending_news(&state.excluded_topics))
                .await
                .context("Failed to fetch trending topics")?;
            TrendingResponse::News {
                trending: trending_keywords(&result),
            }
        }
    };
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trending_keywords() {
        let response: SearchResponse = serde_json::from_value(json!({
            "hits": {"hits": []},
            "aggregations": {
                "filtered_trending_keywords": {
                    "doc_count": 30,
                    "trending_keywords": {"buckets": [
                        {"key": "banjir", "doc_count": 14},
                        {"key": "macet", "doc_count": 9}
                    ]}
                }
            }
        }))
        .unwrap();
        let keywords = trending_keywords(&response);
        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[0].key, "banjir");
        assert!(trending_keywords(&SearchResponse::default()).is_empty());
    }
}
