use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use ji_core::aggs::Aggs;
use ji_core::analytics::{percentage, Pagination};
use ji_core::{Hit, InsightDocument, SearchResponse, Source};
use ji_search::queries;
use serde::{Deserialize, Serialize};

use super::{page_params, parse_source};
use crate::error::{ApiError, Context};
use crate::AppState;

const INSIGHT_LIMIT: usize = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParams {
    pub source: Option<String>,
    pub page: Option<u64>,
    pub items_per_page: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsStats {
    pub total_articles: u64,
    pub urgent_articles: u64,
    pub government_mentions: u64,
    pub public_sentiment: f64,
    pub regional_impact: u64,
    pub topic_distribution: HashMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterStats {
    pub total_engagements: f64,
    pub citizen_reach: f64,
    pub active_discussions: u64,
    pub public_response: f64,
    pub total_tweets: u64,
    pub avg_engagement_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DashboardStats {
    News(NewsStats),
    Twitter(TwitterStats),
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub data: Vec<Hit>,
    pub total: u64,
    pub insights: HashMap<String, InsightDocument>,
    pub pagination: Pagination,
}

fn positive_count(aggs: &Aggs<'_>) -> f64 {
    aggs.buckets("sentiment_distribution")
        .iter()
        .find(|b| b.key == "Positive")
        .map(|b| b.doc_count as f64)
        .unwrap_or(0.0)
}

pub fn compute_stats(source: Source, stats: &SearchResponse, total: u64) -> DashboardStats {
    let aggs = stats.aggs();
    let positive_share = percentage(positive_count(&aggs), total as f64);
    match source {
        Source::News => DashboardStats::News(NewsStats {
            total_articles: total,
            urgent_articles: aggs.doc_count("urgent_count"),
            government_mentions: aggs.doc_count("government_coverage"),
            public_sentiment: positive_share,
            regional_impact: aggs.doc_count("regional_impact"),
            topic_distribution: aggs
                .buckets("topic_distribution")
                .into_iter()
                .map(|b| (b.key, b.doc_count))
                .collect(),
        }),
        Source::Twitter => {
            let engagements = aggs.value("total_engagements");
            DashboardStats::Twitter(TwitterStats {
                total_engagements: engagements,
                citizen_reach: aggs.value("total_views"),
                active_discussions: aggs.doc_count("active_discussions"),
                public_response: positive_share,
                total_tweets: total,
                avg_engagement_rate: if total > 0 { engagements / total as f64 } else { 0.0 },
            })
        }
    }
}

/// Latest digest for the source, or an empty one dated today.
pub fn latest_insight(response: &SearchResponse) -> InsightDocument {
    response
        .hits
        .hits
        .first()
        .and_then(Hit::parse::<InsightDocument>)
        .unwrap_or_else(|| InsightDocument::empty_for(Utc::now().date_naive()))
        .top_by_urgency(INSIGHT_LIMIT)
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DashboardParams>, QueryRejection>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let Query(params) = params?;
    let source = parse_source(params.source.as_deref())?;
    let (page, items_per_page) = page_params(params.page, params.items_per_page)?;
    let request_page = Pagination::new(page, items_per_page, 0);

    let backend = state.backend.as_ref();
    let (stats, total, content, insight) = futures::try_join!(
        backend.search(source.index(), queries::dashboard_stats(source)),
        backend.count(source.index(), None),
        backend.search(source.index(), queries::dashboard_content(source, &request_page)),
        backend.search(source.insight_index(), queries::latest_insight()),
    )
    .context("Failed to fetch dashboard data")?;

    let mut insights = HashMap::new();
    insights.insert(source.to_string(), latest_insight(&insight));

    Ok(Json(DashboardResponse {
        stats: compute_stats(source, &stats, total),
        data: content.hits.hits,
        total,
        insights,
        pagination: Pagination::new(page, items_per_page, total),
    }))
}
