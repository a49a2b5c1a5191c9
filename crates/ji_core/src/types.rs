use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const NEWS_INDEX: &str = "news_jakarta";
pub const TWITTER_INDEX: &str = "twitter_jakarta";
pub const CHAT_INDEX: &str = "chat_interactions";
pub const NEWS_INSIGHT_INDEX: &str = "insight_news_jakarta";
pub const TWITTER_INSIGHT_INDEX: &str = "insight_twitter_jakarta";

/// Which document family a dashboard facet reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    News,
    Twitter,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::News => "news",
            Source::Twitter => "twitter",
        }
    }

    pub fn index(&self) -> &'static str {
        match self {
            Source::News => NEWS_INDEX,
            Source::Twitter => TWITTER_INDEX,
        }
    }

    pub fn insight_index(&self) -> &'static str {
        match self {
            Source::News => NEWS_INSIGHT_INDEX,
            Source::Twitter => TWITTER_INSIGHT_INDEX,
        }
    }

    pub fn sort_field(&self) -> &'static str {
        match self {
            Source::News => "publish_at",
            Source::Twitter => "date",
        }
    }

    /// Fields returned for search result listings.
    pub fn search_fields(&self) -> &'static [&'static str] {
        match self {
            Source::News => &[
                "title",
                "url",
                "image_url",
                "content",
                "description",
                "publish_at",
                "sentiment",
                "topic_classification",
                "urgency_level",
                "target_audience",
                "affected_region",
            ],
            Source::Twitter => &[
                "id",
                "full_text",
                "link_post",
                "link_image_url",
                "username",
                "name",
                "date",
                "time",
                "sentiment",
                "topic_classification",
                "urgency_level",
                "target_audience",
                "affected_region",
                "favorite_count",
                "retweet_count",
                "reply_count",
                "views_count",
            ],
        }
    }

    /// Fields returned for the dashboard feed; a superset of the search fields.
    pub fn dashboard_fields(&self) -> Vec<&'static str> {
        let mut fields = self.search_fields().to_vec();
        fields.push("contextual_keywords");
        if *self == Source::News {
            fields.push("creator");
        }
        fields
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "news" => Ok(Source::News),
            "twitter" => Ok(Source::Twitter),
            other => Err(crate::Error::InvalidRequest(format!("unknown source: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub publish_at: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub topic_classification: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub urgency_level: f64,
    #[serde(default, deserialize_with = "one_or_many")]
    pub target_audience: Vec<String>,
    #[serde(default)]
    pub affected_region: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub contextual_keywords: Vec<String>,
    #[serde(default)]
    pub creator: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialPost {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_text: String,
    #[serde(default)]
    pub link_post: Option<String>,
    #[serde(default)]
    pub link_image_url: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub topic_classification: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub urgency_level: f64,
    #[serde(default, deserialize_with = "one_or_many")]
    pub target_audience: Vec<String>,
    #[serde(default)]
    pub affected_region: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub favorite_count: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub retweet_count: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub reply_count: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub views_count: f64,
    #[serde(default, deserialize_with = "one_or_many")]
    pub contextual_keywords: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub mentions: Vec<String>,
    /// Stored upstream under the misspelled `hastags` field.
    #[serde(default, rename = "hastags", alias = "hashtags", deserialize_with = "one_or_many")]
    pub hashtags: Vec<String>,
}

impl SocialPost {
    pub fn engagements(&self) -> f64 {
        self.favorite_count + self.retweet_count + self.reply_count
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatLog {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bot_response: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub response_time_ms: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InsightItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub main_issue: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub problem: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestion: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub urgency_score: f64,
}

/// Daily digest produced upstream. Twitter digests carry extra name/total lists,
/// kept verbatim in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub insight: Vec<InsightItem>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl InsightDocument {
    pub fn empty_for(date: chrono::NaiveDate) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            insight: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Keeps the `limit` most urgent items, most urgent first.
    pub fn top_by_urgency(mut self, limit: usize) -> Self {
        self.insight
            .sort_by(|a, b| b.urgency_score.total_cmp(&a.urgency_score));
        self.insight.truncate(limit);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Hits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl SearchResponse {
    pub fn total(&self) -> u64 {
        self.hits.total.as_ref().map(Total::value).unwrap_or(0)
    }

    /// Deserializes every hit's `_source`, skipping documents that don't fit `T`.
    pub fn sources<T: serde::de::DeserializeOwned>(&self) -> Vec<T> {
        self.hits.hits.iter().filter_map(Hit::parse).collect()
    }

    pub fn aggs(&self) -> crate::aggs::Aggs<'_> {
        crate::aggs::Aggs::new(self.aggregations.as_ref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Total>,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// Engines report totals either as a bare number or as `{ value, relation }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Total {
    Count(u64),
    Object {
        value: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relation: Option<String>,
    },
}

impl Total {
    pub fn value(&self) -> u64 {
        match self {
            Total::Count(n) => *n,
            Total::Object { value, .. } => *value,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_score", default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Value>,
}

impl Hit {
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        match serde_json::from_value(self.source.clone()) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::debug!("Skipping hit {:?}: {}", self.id, e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountResponse {
    pub count: u64,
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Reads an explicit `null` as the type's default, like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if s.is_empty() => Vec::new(),
        Some(Value::String(s)) => vec![s],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_total_accepts_both_shapes() {
        let bare: SearchResponse = serde_json::from_value(json!({"hits": {"total": 7, "hits": []}})).unwrap();
        assert_eq!(bare.total(), 7);

        let object: SearchResponse = serde_json::from_value(json!({
            "took": 3,
            "hits": {"total": {"value": 42, "relation": "eq"}, "hits": []}
        }))
        .unwrap();
        assert_eq!(object.total(), 42);
        assert_eq!(object.extra.get("took"), Some(&json!(3)));
    }

    #[test]
    fn test_social_post_is_lenient() {
        let post: SocialPost = serde_json::from_value(json!({
            "username": "warga_jkt",
            "favorite_count": "12",
            "retweet_count": 3,
            "reply_count": null,
            "hastags": ["#banjir", "#jakarta"],
            "mentions": "@dkijakarta"
        }))
        .unwrap();
        assert_eq!(post.favorite_count, 12.0);
        assert_eq!(post.reply_count, 0.0);
        assert_eq!(post.engagements(), 15.0);
        assert_eq!(post.hashtags, vec!["#banjir", "#jakarta"]);
        assert_eq!(post.mentions, vec!["@dkijakarta"]);
    }

    #[test]
    fn test_null_text_fields_keep_the_document() {
        let response: SearchResponse = serde_json::from_value(json!({
            "hits": {"hits": [
                {"_id": "1", "_source": {"message_text": "halo", "bot_response": "hai"}},
                {"_id": "2", "_source": {"message_text": "jalan rusak", "bot_response": null}}
            ]}
        }))
        .unwrap();
        let logs: Vec<ChatLog> = response.sources();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].bot_response, "");

        let post: SocialPost =
            serde_json::from_value(json!({"full_text": null, "username": null, "hastags": null})).unwrap();
        assert!(post.full_text.is_empty());
        assert!(post.username.is_empty());

        let article: NewsArticle = serde_json::from_value(json!({"title": null, "content": null})).unwrap();
        assert!(article.title.is_empty());

        let doc: InsightDocument = serde_json::from_value(json!({
            "date": null,
            "insight": [{"topic": null, "main_issue": "banjir", "problem": null, "suggestion": null}]
        }))
        .unwrap();
        assert_eq!(doc.insight[0].main_issue, "banjir");
        let empty: InsightDocument = serde_json::from_value(json!({"date": "2024-11-20", "insight": null})).unwrap();
        assert!(empty.insight.is_empty());
    }

    #[test]
    fn test_insight_top_by_urgency() {
        let doc: InsightDocument = serde_json::from_value(json!({
            "date": "2024-11-20",
            "insight": [
                {"topic": "a", "urgency_score": 10},
                {"topic": "b", "urgency_score": 90},
                {"topic": "c", "urgency_score": 50}
            ],
            "total_hashtags": [{"name": "#banjir", "total": 4}]
        }))
        .unwrap();
        let top = doc.top_by_urgency(2);
        let topics: Vec<_> = top.insight.iter().map(|i| i.topic.as_str()).collect();
        assert_eq!(topics, vec!["b", "c"]);
        assert!(top.extra.contains_key("total_hashtags"));
    }

    #[test]
    fn test_source_parsing_and_fields() {
        assert_eq!("Twitter".parse::<Source>().unwrap(), Source::Twitter);
        assert!("tiktok".parse::<Source>().is_err());
        assert_eq!(Source::News.sort_field(), "publish_at");
        assert!(Source::News.dashboard_fields().contains(&"creator"));
        assert!(!Source::Twitter.dashboard_fields().contains(&"creator"));
    }
}
