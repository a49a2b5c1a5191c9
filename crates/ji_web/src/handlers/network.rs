use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use ji_core::analytics::{classify_relation, clean_term, with_marker, NodeKind, Relation};
use ji_core::network::{build_network, GraphEdge, GraphNode};
use ji_core::{PostDigest, SocialPost, TWITTER_INDEX};
use ji_inference::summarize_best_effort;
use ji_search::queries::{self, ALL_REGIONS, DEFAULT_NETWORK_REGION, RELATED_POST_LIMIT};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Context};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NetworkParams {
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkMeta {
    pub region: String,
    pub total_nodes: usize,
    pub total_edges: usize,
}

#[derive(Debug, Serialize)]
pub struct NetworkResponse {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub meta: NetworkMeta,
}

pub async fn network(
    State(state): State<Arc<AppState>>,
    params: Result<Query<NetworkParams>, QueryRejection>,
) -> Result<Json<NetworkResponse>, ApiError> {
    let Query(params) = params?;
    let region = params
        .region
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_NETWORK_REGION.to_string());
    let region_filter = (region != ALL_REGIONS).then_some(region.as_str());

    let result = state
        .backend
        .search(TWITTER_INDEX, queries::network_posts(region_filter))
        .await
        .context("Failed to fetch network data")?;

    let posts: Vec<SocialPost> = result.sources();
    let graph = build_network(&posts);
    tracing::debug!(
        "network for {}: {} posts, {} nodes, {} edges",
        region,
        posts.len(),
        graph.nodes.len(),
        graph.edges.len()
    );

    Ok(Json(NetworkResponse {
        meta: NetworkMeta {
            region,
            total_nodes: graph.nodes.len(),
            total_edges: graph.edges.len(),
        },
        nodes: graph.nodes,
        edges: graph.edges,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct UserTweetsParams {
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedTweet {
    pub username: String,
    pub full_text: String,
    pub created_at: Option<String>,
    pub topic_classification: String,
    pub sentiment: String,
    pub urgency_level: f64,
    pub target_audience: Vec<String>,
    pub link_post: Option<String>,
    pub mentions: Vec<String>,
    pub hastags: Vec<String>,
    pub relation_type: Relation,
}

impl RelatedTweet {
    fn from_post(post: SocialPost, kind: NodeKind, clean: &str) -> Self {
        let relation_type = classify_relation(kind, clean, &post.username, &post.mentions);
        Self {
            mentions: post.mentions.iter().map(|m| with_marker('@', m)).collect(),
            hastags: post.hashtags.iter().map(|h| with_marker('#', h)).collect(),
            topic_classification: post
                .topic_classification
                .unwrap_or_else(|| "Unclassified".to_string()),
            sentiment: post.sentiment.unwrap_or_else(|| "Neutral".to_string()),
            username: post.username,
            full_text: post.full_text,
            created_at: post.created_at,
            urgency_level: post.urgency_level,
            target_audience: post.target_audience,
            link_post: post.link_post,
            relation_type,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelationBreakdown {
    pub as_author: usize,
    pub as_mentioned: usize,
    pub in_hashtag: usize,
}

impl RelationBreakdown {
    pub fn of(tweets: &[RelatedTweet]) -> Self {
        let count = |relation: Relation| tweets.iter().filter(|t| t.relation_type == relation).count();
        Self {
            as_author: count(Relation::Author),
            as_mentioned: count(Relation::Mentioned),
            in_hashtag: count(Relation::Hashtag),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserTweetsMeta {
    pub total: u64,
    pub query_term: String,
    pub clean_query_term: String,
    pub node_type: NodeKind,
    pub breakdown: RelationBreakdown,
}

#[derive(Debug, Serialize)]
pub struct UserTweetsResponse {
    pub tweets: Vec<RelatedTweet>,
    pub meta: UserTweetsMeta,
}

/// Latest posts related to a graph node: hashtag queries match the hashtag,
/// everything else matches the author or a mention.
pub async fn user_tweets(
    State(state): State<Arc<AppState>>,
    params: Result<Query<UserTweetsParams>, QueryRejection>,
) -> Result<Json<UserTweetsResponse>, ApiError> {
    let Query(params) = params?;
    let term = params.username.unwrap_or_default();
    if term.is_empty() {
        return Err(ApiError::BadRequest("Username is required".to_string()));
    }
    let clean = clean_term(&term);
    let kind = NodeKind::detect(&term);

    let body = match kind {
        NodeKind::Hashtag => queries::posts_with_hashtag(&term),
        NodeKind::User | NodeKind::UserOrMention => queries::posts_by_or_mentioning(&clean, &term),
    };
    let result = state
        .backend
        .search(TWITTER_INDEX, body)
        .await
        .context("Failed to fetch related tweets")?;

    let total = if result.hits.hits.is_empty() { 0 } else { result.total() };
    let tweets: Vec<RelatedTweet> = result
        .sources::<SocialPost>()
        .into_iter()
        .map(|post| RelatedTweet::from_post(post, kind, &clean))
        .collect();

    Ok(Json(UserTweetsResponse {
        meta: UserTweetsMeta {
            total,
            query_term: term,
            clean_query_term: clean,
            node_type: kind,
            breakdown: RelationBreakdown::of(&tweets),
        },
        tweets,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub tweets: Vec<SocialPost>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: Option<String>,
}

/// The most urgent posts first, at most `limit` of them.
pub fn most_urgent(mut posts: Vec<SocialPost>, limit: usize) -> Vec<PostDigest> {
    posts.sort_by(|a, b| b.urgency_level.total_cmp(&a.urgency_level));
    posts.iter().take(limit).map(PostDigest::from_post).collect()
}

pub async fn summarize_posts(
    State(state): State<Arc<AppState>>,
    request: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let Json(request) = request?;
    let Some(summarizer) = state.summarizer.as_deref() else {
        return Ok(Json(SummaryResponse { summary: None }));
    };
    let digests = most_urgent(request.tweets, RELATED_POST_LIMIT as usize);
    let summary = summarize_best_effort(summarizer, &digests, state.summary_timeout).await;
    Ok(Json(SummaryResponse { summary }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(username: &str, urgency: f64, mentions: &[&str]) -> SocialPost {
        SocialPost {
            username: username.to_string(),
            full_text: format!("post by {}", username),
            urgency_level: urgency,
            mentions: mentions.iter().map(|m| m.to_string()).collect(),
            hashtags: vec!["banjir".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_related_tweet_markers_and_relation() {
        let tweet = RelatedTweet::from_post(post("warga", 40.0, &["dkijakarta"]), NodeKind::UserOrMention, "dkijakarta");
        assert_eq!(tweet.mentions, vec!["@dkijakarta"]);
        assert_eq!(tweet.hastags, vec!["#banjir"]);
        assert_eq!(tweet.relation_type, Relation::Mentioned);
        assert_eq!(tweet.topic_classification, "Unclassified");
        assert_eq!(tweet.sentiment, "Neutral");
    }

    #[test]
    fn test_breakdown_counts_relations() {
        let tweets = vec![
            RelatedTweet::from_post(post("warga", 0.0, &[]), NodeKind::User, "warga"),
            RelatedTweet::from_post(post("lain", 0.0, &["warga"]), NodeKind::User, "warga"),
            RelatedTweet::from_post(post("lain", 0.0, &[]), NodeKind::User, "warga"),
        ];
        let breakdown = RelationBreakdown::of(&tweets);
        assert_eq!(breakdown.as_author, 1);
        assert_eq!(breakdown.as_mentioned, 1);
        assert_eq!(breakdown.in_hashtag, 0);
    }

    #[test]
    fn test_most_urgent_orders_and_limits() {
        let posts = vec![post("a", 10.0, &[]), post("b", 90.0, &[]), post("c", 50.0, &[])];
        let digests = most_urgent(posts, 2);
        assert_eq!(digests.len(), 2);
        assert_eq!(digests[0].full_text, "post by b");
        assert_eq!(digests[1].full_text, "post by c");
        assert!(digests[0].contextual_content.starts_with("Tweet ini dari b"));
    }
}
