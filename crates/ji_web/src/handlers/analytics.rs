use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use ji_core::aggs::{bucket_of, Aggs, Bucket};
use ji_core::analytics::{
    calculate_change, capitalize, generate_recommendation, percentage, sentiment_score,
    SentimentCounts, UrgencyLevel,
};
use ji_core::{SearchResponse, CHAT_INDEX, TWITTER_INDEX};
use ji_search::queries::{self, TimeRange, WeekWindows};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, Context};
use crate::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicSummary {
    pub name: String,
    pub count: u64,
    pub urgency: u64,
    pub sentiment: String,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub topics: Vec<TopicSummary>,
}

pub fn chat_topic_summaries(response: &SearchResponse) -> Vec<TopicSummary> {
    response
        .aggs()
        .raw_buckets("topics")
        .iter()
        .map(|raw| {
            let bucket = bucket_of(raw);
            let sub = Aggs::new(Some(raw));
            TopicSummary {
                name: bucket.key,
                count: bucket.doc_count,
                urgency: sub.value("avg_urgency").round() as u64,
                sentiment: sentiment_score(&sub.buckets("sentiment_distribution")),
            }
        })
        .collect()
}

pub async fn topics(State(state): State<Arc<AppState>>) -> Result<Json<TopicsResponse>, ApiError> {
    let response = state
        .backend
        .search(CHAT_INDEX, queries::chat_topics())
        .await
        .context("Failed to fetch topic data")?;
    let topics = chat_topic_summaries(&response);
    if topics.is_empty() {
        tracing::info!("No chat topics in the last week");
    }
    Ok(Json(TopicsResponse { topics }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyChanges {
    pub public_issues: String,
    pub citizen_reach: String,
    pub active_discussions: String,
    pub department_mentions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopIssue {
    pub topic: String,
    pub count: u64,
    pub urgency: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentMetric {
    pub department: String,
    pub mentions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionShare {
    pub region: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterAnalytics {
    pub public_issues_count: u64,
    pub citizen_reach: f64,
    pub active_discussions: u64,
    pub total_tweets: u64,
    pub critical_topics_count: usize,
    pub department_mentions_count: u64,
    pub weekly_changes: WeeklyChanges,
    pub sentiment_trends: Vec<SentimentCounts>,
    pub top_issues: Vec<TopIssue>,
    pub department_metrics: Vec<DepartmentMetric>,
    pub regional_distribution: Vec<RegionShare>,
    /// Share of positive posts this week against all posts, one decimal.
    pub public_sentiment: String,
}

fn department_total(aggs: &Aggs<'_>) -> u64 {
    aggs.keyed_buckets("dept_mentions").iter().map(|b| b.doc_count).sum()
}

fn critical_topics(aggs: &Aggs<'_>) -> Vec<TopIssue> {
    let mut issues: Vec<TopIssue> = aggs
        .raw_buckets("critical_topics")
        .iter()
        .filter_map(|raw| {
            let sub = Aggs::new(Some(raw));
            let count = sub.doc_count("high_urgency_count");
            (count > 0).then(|| TopIssue {
                topic: bucket_of(raw).key,
                count,
                urgency: sub.value("avg_urgency").round() as u64,
            })
        })
        .collect();
    issues.sort_by(|a, b| b.count.cmp(&a.count));
    issues
}

fn sentiment_trends(aggs: &Aggs<'_>) -> Vec<SentimentCounts> {
    aggs.raw_buckets("sentiment_trends")
        .iter()
        .map(|raw| {
            let day = bucket_of(raw);
            SentimentCounts::from_buckets(day.key, &Aggs::new(Some(raw)).buckets("sentiments"))
        })
        .collect()
}

/// Reshapes the current and previous week aggregations into the analytics
/// payload. `total_tweets` is the unfiltered document count of the index.
pub fn twitter_analytics_from(
    current: &SearchResponse,
    previous: &SearchResponse,
    total_tweets: u64,
) -> TwitterAnalytics {
    let now = current.aggs();
    let before = previous.aggs();

    let public_issues = now.doc_count("high_urgency_total");
    let reach = now.value("unique_users");
    let engagement = now.value("total_engagement");
    let dept_now = department_total(&now);
    let dept_before = department_total(&before);

    let top_issues = critical_topics(&now);

    let mut department_metrics: Vec<DepartmentMetric> = now
        .keyed_buckets("dept_mentions")
        .into_iter()
        .filter(|b| b.doc_count > 0)
        .map(|b| DepartmentMetric {
            department: capitalize(&b.key),
            mentions: b.doc_count,
        })
        .collect();
    department_metrics.sort_by(|a, b| b.mentions.cmp(&a.mentions));

    let mut regional_distribution: Vec<RegionShare> = now
        .buckets("regional_distribution")
        .into_iter()
        .map(|b| RegionShare {
            region: b.key,
            value: b.doc_count,
        })
        .collect();
    regional_distribution.sort_by(|a, b| b.value.cmp(&a.value));

    let positive = now
        .buckets("sentiment_distribution")
        .iter()
        .find(|b| b.key.eq_ignore_ascii_case("positive"))
        .map(|b| b.doc_count)
        .unwrap_or(0);

    TwitterAnalytics {
        public_issues_count: public_issues,
        citizen_reach: reach,
        active_discussions: engagement.round() as u64,
        total_tweets,
        critical_topics_count: top_issues.len(),
        department_mentions_count: dept_now,
        weekly_changes: WeeklyChanges {
            public_issues: calculate_change(
                public_issues as f64,
                before.doc_count("high_urgency_count") as f64,
            ),
            citizen_reach: calculate_change(reach, before.value("unique_users")),
            active_discussions: calculate_change(engagement, before.value("total_engagement")),
            department_mentions: calculate_change(dept_now as f64, dept_before as f64),
        },
        sentiment_trends: sentiment_trends(&now),
        top_issues,
        department_metrics,
        regional_distribution,
        public_sentiment: format!("{:.1}", percentage(positive as f64, total_tweets as f64)),
    }
}

pub async fn twitter_analytics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TwitterAnalytics>, ApiError> {
    let windows = WeekWindows::ending_at(Utc::now());
    let backend = state.backend.as_ref();
    let (current, previous, total) = futures::try_join!(
        backend.search(TWITTER_INDEX, queries::twitter_current_week(&windows)),
        backend.search(TWITTER_INDEX, queries::twitter_previous_week(&windows)),
        backend.count(TWITTER_INDEX, None),
    )
    .context("Failed to fetch analytics data")?;

    Ok(Json(twitter_analytics_from(&current, &previous, total)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedParams {
    pub time_range: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub topic: String,
    pub region: Option<String>,
    pub sentiment: String,
    pub urgency_level: UrgencyLevel,
    pub recommendation: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedTwitterResponse {
    pub time_range: &'static str,
    pub region: String,
    pub sentiment_distribution: Option<Value>,
    pub sentiment_trends: Option<Value>,
    pub urgency_distribution: Option<Value>,
    pub top_posts: Option<Value>,
    pub keywords: Option<Value>,
    pub hashtags: Option<Value>,
    pub regional_sentiment: Option<Value>,
    pub engagement_trends: Option<Value>,
    pub audience_distribution: Option<Value>,
    pub recommendations: Vec<Recommendation>,
}

/// One recommendation per critical topic, addressed to the region with the
/// most critical posts and that region's dominant sentiment.
pub fn recommendations(aggs: &Aggs<'_>) -> Vec<Recommendation> {
    aggs.sub("critical_issues")
        .raw_buckets("by_topic")
        .iter()
        .map(|raw| {
            let topic = bucket_of(raw).key;
            let top_region = Aggs::new(Some(raw)).raw_buckets("by_region").first();
            let region: Option<Bucket> = top_region.map(bucket_of);
            let sentiment = top_region
                .and_then(|r| Aggs::new(Some(r)).buckets("sentiment_analysis").into_iter().next())
                .map(|b| b.key)
                .unwrap_or_else(|| "neutral".to_string());
            let region = region.map(|b| b.key);
            Recommendation {
                recommendation: generate_recommendation(
                    &topic,
                    region.as_deref().unwrap_or("all regions"),
                    &sentiment,
                ),
                topic,
                region,
                sentiment,
                urgency_level: UrgencyLevel::High,
            }
        })
        .collect()
}

pub async fn enhanced_twitter(
    State(state): State<Arc<AppState>>,
    params: Result<Query<EnhancedParams>, QueryRejection>,
) -> Result<Json<EnhancedTwitterResponse>, ApiError> {
    let Query(params) = params?;
    let range: TimeRange = params
        .time_range
        .as_deref()
        .unwrap_or_default()
        .parse()
        .unwrap_or_default();
    let region = params.region.unwrap_or_else(|| "all".to_string());
    let region_filter = (region != "all").then_some(region.as_str());

    let result = state
        .backend
        .search(TWITTER_INDEX, queries::enhanced_twitter(range, region_filter))
        .await
        .context("Failed to fetch enhanced analytics data")?;

    let aggs = result.aggs();
    let raw = |name: &str| aggs.get(name).cloned();
    Ok(Json(EnhancedTwitterResponse {
        time_range: range.as_str(),
        sentiment_distribution: raw("sentiment_distribution"),
        sentiment_trends: raw("sentiment_trends"),
        urgency_distribution: raw("urgency_distribution"),
        top_posts: raw("top_posts"),
        keywords: raw("keyword_analysis"),
        hashtags: raw("hashtag_analysis"),
        regional_sentiment: raw("regional_sentiment"),
        engagement_trends: raw("engagement_trends"),
        audience_distribution: raw("audience_distribution"),
        recommendations: recommendations(&aggs),
        region,
    }))
}
