//! Engine-native request bodies, one builder per dashboard facet.

use std::str::FromStr;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use ji_core::analytics::{Pagination, HIGH_URGENCY, MEDIUM_URGENCY, URGENT_ARTICLE};
use ji_core::Source;
use serde_json::{json, Value};

pub const GOVERNMENT_TOPIC: &str = "Government and Public Policy";
pub const PROVINCE_REGION: &str = "DKI Jakarta";
pub const ALL_REGIONS: &str = "All Data";
pub const DEFAULT_NETWORK_REGION: &str = "Jakarta Pusat";
pub const NETWORK_POST_LIMIT: u64 = 10_000;
pub const CHAT_LOG_LIMIT: u64 = 100;
pub const RELATED_POST_LIMIT: u64 = 20;

/// Department keywords counted in twitter analytics, keyed by bucket name.
pub const DEPARTMENTS: [(&str, &str); 6] = [
    ("pemprov", "Pemprov"),
    ("dinas", "Dinas"),
    ("dprd", "DPRD"),
    ("walikota", "Walikota"),
    ("gubernur", "Gubernur"),
    ("pemerintah", "Pemerintah"),
];

fn sort_desc(field: &str) -> Value {
    json!([{ field: "desc" }])
}

fn multi_match_or_all(query: Option<&str>, match_clause: impl FnOnce(&str) -> Value) -> Value {
    match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => match_clause(q),
        None => json!({ "match_all": {} }),
    }
}

pub fn dashboard_stats(source: Source) -> Value {
    let (engagement_field, views_field, replies_field) = match source {
        Source::Twitter => ("favorite_count", "views_count", "reply_count"),
        Source::News => ("_score", "_score", "_score"),
    };
    json!({
        "size": 0,
        "aggs": {
            "urgent_count": { "filter": { "range": { "urgency_level": { "gte": URGENT_ARTICLE } } } },
            "government_coverage": {
                "filter": { "term": { "topic_classification.keyword": GOVERNMENT_TOPIC } }
            },
            "sentiment_distribution": { "terms": { "field": "sentiment.keyword" } },
            "total_engagements": { "sum": { "field": engagement_field } },
            "total_views": { "sum": { "field": views_field } },
            "active_discussions": { "filter": { "range": { replies_field: { "gt": 0 } } } },
            "regional_impact": { "filter": { "term": { "affected_region.keyword": PROVINCE_REGION } } },
            "topic_distribution": { "terms": { "field": "topic_classification.keyword", "size": 20 } }
        }
    })
}

pub fn dashboard_content(source: Source, pagination: &Pagination) -> Value {
    json!({
        "size": pagination.items_per_page,
        "from": pagination.from(),
        "sort": sort_desc(source.sort_field()),
        "_source": source.dashboard_fields(),
    })
}

pub fn latest_insight() -> Value {
    json!({
        "size": 1,
        "sort": [{ "date": { "order": "desc" } }]
    })
}

pub fn trending_news(excluded_topics: &str) -> Value {
    let mut must_not = Vec::new();
    if !excluded_topics.trim().is_empty() {
        must_not.push(json!({
            "multi_match": {
                "query": excluded_topics,
                "fields": ["content", "title", "description"],
                "operator": "or"
            }
        }));
    }
    json!({
        "size": 0,
        "query": {
            "bool": {
                "must": [{ "range": { "publish_at": { "gte": "now-7d/d", "lte": "now" } } }],
                "must_not": must_not
            }
        },
        "aggs": {
            "filtered_trending_keywords": {
                "filter": { "range": { "urgency_level": { "gt": 0 } } },
                "aggs": {
                    "trending_keywords": {
                        "terms": { "field": "contextual_keywords.keyword", "size": 10 }
                    }
                }
            }
        }
    })
}

pub fn search_content(source: Source, query: Option<&str>, pagination: &Pagination) -> Value {
    let query = multi_match_or_all(query, |q| {
        json!({
            "multi_match": {
                "query": q,
                "fields": ["content", "title", "description", "full_text"],
                "type": "best_fields",
                "operator": "and",
                "minimum_should_match": "75%"
            }
        })
    });
    json!({
        "size": pagination.items_per_page,
        "from": pagination.from(),
        "_source": source.search_fields(),
        "query": query,
        "sort": sort_desc(source.sort_field()),
    })
}

pub fn news_search(query: Option<&str>) -> Value {
    let query = multi_match_or_all(query, |q| {
        json!({ "multi_match": { "query": q, "fields": ["content", "title", "description"] } })
    });
    json!({
        "size": 10,
        "sort": sort_desc("publish_at"),
        "_source": [
            "title",
            "url",
            "image_url",
            "content",
            "publish_at",
            "topic_classification",
            "sentiment",
            "urgency_level",
            "target_audience",
            "affected_region"
        ],
        "query": query,
    })
}

pub fn last_24h() -> Value {
    json!({ "range": { "timestamp": { "gte": "now-24h" } } })
}

pub fn active_chat_users() -> Value {
    json!({
        "size": 0,
        "query": last_24h(),
        "aggs": { "unique_users": { "cardinality": { "field": "user_id" } } }
    })
}

pub fn avg_response_time() -> Value {
    json!({
        "size": 0,
        "aggs": { "avg_response_time": { "avg": { "field": "response_time_ms" } } }
    })
}

/// Interactions where the bot produced a reply.
pub fn answered_interactions() -> Value {
    json!({ "bool": { "must_not": { "term": { "bot_response": "" } } } })
}

pub fn chat_logs(search: Option<&str>) -> Value {
    let clause = multi_match_or_all(search, |q| {
        json!({ "multi_match": { "query": q, "fields": ["message_text", "bot_response", "user_id"] } })
    });
    json!({
        "query": { "bool": { "must": [clause] } },
        "sort": [{ "timestamp": { "order": "desc" } }],
        "size": CHAT_LOG_LIMIT
    })
}

pub fn chat_topics() -> Value {
    json!({
        "size": 0,
        "query": { "range": { "timestamp": { "gte": "now-7d/d" } } },
        "aggs": {
            "topics": {
                "terms": { "field": "topic_classification.keyword", "size": 9 },
                "aggs": {
                    "avg_urgency": { "avg": { "field": "urgency_level" } },
                    "sentiment_distribution": { "terms": { "field": "sentiment.keyword" } }
                }
            }
        }
    })
}

fn department_filters() -> Value {
    let filters: serde_json::Map<String, Value> = DEPARTMENTS
        .iter()
        .map(|(key, phrase)| {
            (
                key.to_string(),
                json!({ "match_phrase": { "contextual_keywords": phrase } }),
            )
        })
        .collect();
    json!({ "filters": { "filters": filters } })
}

const ENGAGEMENT_SCRIPT: &str = "doc['favorite_count'].value + doc['retweet_count'].value + doc['reply_count'].value + doc['views_count'].value";

/// Half-open `[from, to)` week windows ending at `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindows {
    pub now: DateTime<Utc>,
    pub last_week: DateTime<Utc>,
    pub previous_week: DateTime<Utc>,
}

impl WeekWindows {
    pub fn ending_at(now: DateTime<Utc>) -> Self {
        let last_week = now - Duration::days(7);
        Self {
            now,
            last_week,
            previous_week: last_week - Duration::days(7),
        }
    }
}

fn date_range(from: DateTime<Utc>, to: DateTime<Utc>) -> Value {
    json!({
        "range": {
            "date": {
                "gte": from.to_rfc3339_opts(SecondsFormat::Millis, true),
                "lt": to.to_rfc3339_opts(SecondsFormat::Millis, true)
            }
        }
    })
}

pub fn twitter_current_week(windows: &WeekWindows) -> Value {
    json!({
        "size": 0,
        "query": date_range(windows.last_week, windows.now),
        "aggs": {
            "total_engagement": { "sum": { "script": { "source": ENGAGEMENT_SCRIPT } } },
            "unique_users": { "cardinality": { "field": "username.keyword" } },
            "sentiment_distribution": { "terms": { "field": "sentiment.keyword", "size": 3 } },
            "critical_topics": {
                "terms": { "field": "topic_classification.keyword", "size": 10 },
                "aggs": {
                    "high_urgency_count": {
                        "filter": { "range": { "urgency_level": { "gte": HIGH_URGENCY } } }
                    },
                    "avg_urgency": { "avg": { "field": "urgency_level" } }
                }
            },
            "dept_mentions": department_filters(),
            "sentiment_trends": {
                "date_histogram": {
                    "field": "date",
                    "calendar_interval": "day",
                    "format": "yyyy-MM-dd"
                },
                "aggs": {
                    "sentiments": { "terms": { "field": "sentiment.keyword", "size": 3 } }
                }
            },
            "regional_distribution": { "terms": { "field": "affected_region.keyword", "size": 6 } },
            "high_urgency_total": {
                "filter": { "range": { "urgency_level": { "gte": HIGH_URGENCY } } }
            }
        }
    })
}

pub fn twitter_previous_week(windows: &WeekWindows) -> Value {
    json!({
        "size": 0,
        "query": date_range(windows.previous_week, windows.last_week),
        "aggs": {
            "total_engagement": { "sum": { "script": { "source": ENGAGEMENT_SCRIPT } } },
            "unique_users": { "cardinality": { "field": "username.keyword" } },
            "high_urgency_count": {
                "filter": { "range": { "urgency_level": { "gte": HIGH_URGENCY } } }
            },
            "dept_mentions": department_filters()
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Daily => "daily",
            TimeRange::Weekly => "weekly",
            TimeRange::Monthly => "monthly",
        }
    }

    fn date_range(&self) -> Value {
        match self {
            TimeRange::Daily => json!({ "gte": "now-24h", "lt": "now" }),
            TimeRange::Weekly => json!({ "gte": "now-7d/d", "lt": "now/d" }),
            TimeRange::Monthly => json!({ "gte": "now-30d/d", "lt": "now/d" }),
        }
    }

    fn interval(&self) -> &'static str {
        match self {
            TimeRange::Monthly => "day",
            _ => "hour",
        }
    }
}

impl FromStr for TimeRange {
    type Err = std::convert::Infallible;

    /// Unknown values fall back to the daily window.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "weekly" => TimeRange::Weekly,
            "monthly" => TimeRange::Monthly,
            _ => TimeRange::Daily,
        })
    }
}

pub fn enhanced_twitter(range: TimeRange, region: Option<&str>) -> Value {
    let mut must = vec![json!({ "range": { "date": range.date_range() } })];
    if let Some(region) = region {
        must.push(json!({ "term": { "affected_region.keyword": region } }));
    }
    let interval = range.interval();
    json!({
        "size": 0,
        "query": { "bool": { "must": must } },
        "aggs": {
            "sentiment_distribution": { "terms": { "field": "sentiment.keyword" } },
            "sentiment_trends": {
                "date_histogram": { "field": "date", "calendar_interval": interval },
                "aggs": { "sentiments": { "terms": { "field": "sentiment.keyword" } } }
            },
            "urgency_distribution": {
                "range": {
                    "field": "urgency_level",
                    "ranges": [
                        { "to": MEDIUM_URGENCY, "key": "Low" },
                        { "from": MEDIUM_URGENCY, "to": HIGH_URGENCY, "key": "Medium" },
                        { "from": HIGH_URGENCY, "key": "High" }
                    ]
                },
                "aggs": {
                    "top_topics": { "terms": { "field": "topic_classification.keyword", "size": 3 } }
                }
            },
            "top_posts": {
                "top_hits": {
                    "size": 10,
                    "sort": [
                        { "views_count": { "order": "desc" } },
                        { "favorite_count": { "order": "desc" } }
                    ],
                    "_source": {
                        "includes": [
                            "full_text",
                            "views_count",
                            "favorite_count",
                            "retweet_count",
                            "sentiment",
                            "urgency_level",
                            "affected_region",
                            "link_post"
                        ]
                    }
                }
            },
            "keyword_analysis": { "terms": { "field": "contextual_keywords.keyword", "size": 50 } },
            "hashtag_analysis": { "terms": { "field": "hastags.keyword", "size": 30 } },
            "regional_sentiment": {
                "terms": { "field": "affected_region.keyword" },
                "aggs": { "sentiment_breakdown": { "terms": { "field": "sentiment.keyword" } } }
            },
            "engagement_trends": {
                "date_histogram": { "field": "date", "calendar_interval": interval },
                "aggs": {
                    "avg_views": { "avg": { "field": "views_count" } },
                    "avg_favorites": { "avg": { "field": "favorite_count" } },
                    "avg_retweets": { "avg": { "field": "retweet_count" } },
                    "avg_replies": { "avg": { "field": "reply_count" } }
                }
            },
            "audience_distribution": { "terms": { "field": "target_audience.keyword", "size": 10 } },
            "critical_issues": {
                "filter": {
                    "bool": { "must": [{ "range": { "urgency_level": { "gte": HIGH_URGENCY } } }] }
                },
                "aggs": {
                    "by_topic": {
                        "terms": { "field": "topic_classification.keyword", "size": 5 },
                        "aggs": {
                            "by_region": {
                                "terms": { "field": "affected_region.keyword" },
                                "aggs": {
                                    "sentiment_analysis": { "terms": { "field": "sentiment.keyword" } }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Posts carrying both hashtags and mentions, optionally limited to one region.
pub fn network_posts(region: Option<&str>) -> Value {
    let must: Vec<Value> = region
        .map(|r| vec![json!({ "match": { "affected_region.keyword": r } })])
        .unwrap_or_default();
    json!({
        "size": NETWORK_POST_LIMIT,
        "query": {
            "bool": {
                "must": must,
                "filter": [
                    { "exists": { "field": "hastags" } },
                    { "exists": { "field": "mentions" } }
                ]
            }
        },
        "sort": sort_desc("date"),
    })
}

pub fn posts_with_hashtag(hashtag: &str) -> Value {
    json!({
        "query": { "match": { "hastags": hashtag } },
        "sort": [{ "date": { "order": "desc" } }],
        "size": RELATED_POST_LIMIT
    })
}

pub fn posts_by_or_mentioning(clean_username: &str, original: &str) -> Value {
    json!({
        "query": {
            "bool": {
                "should": [
                    { "match": { "username": clean_username } },
                    { "match": { "mentions": original } }
                ],
                "minimum_should_match": 1
            }
        },
        "sort": [{ "date": { "order": "desc" } }],
        "size": RELATED_POST_LIMIT
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_search_content_falls_back_to_match_all() {
        let pagination = Pagination::new(2, 10, 0);
        let body = search_content(Source::News, Some("   "), &pagination);
        assert_eq!(body["query"], json!({ "match_all": {} }));
        assert_eq!(body["from"], json!(10));
        assert_eq!(body["sort"], json!([{ "publish_at": "desc" }]));

        let body = search_content(Source::Twitter, Some("banjir"), &pagination);
        assert_eq!(body["query"]["multi_match"]["query"], json!("banjir"));
        assert_eq!(body["query"]["multi_match"]["operator"], json!("and"));
        assert_eq!(body["sort"], json!([{ "date": "desc" }]));
    }

    #[test]
    fn test_dashboard_stats_fields_follow_source() {
        let twitter = dashboard_stats(Source::Twitter);
        assert_eq!(twitter["aggs"]["total_views"]["sum"]["field"], json!("views_count"));
        assert!(twitter["aggs"]["active_discussions"]["filter"]["range"]["reply_count"].is_object());

        let news = dashboard_stats(Source::News);
        assert_eq!(news["aggs"]["total_views"]["sum"]["field"], json!("_score"));
        assert_eq!(news["aggs"]["urgent_count"]["filter"]["range"]["urgency_level"]["gte"], json!(80.0));
    }

    #[test]
    fn test_trending_news_excludes_configured_topics() {
        let body = trending_news("israel gaza palestina");
        let must_not = body["query"]["bool"]["must_not"].as_array().unwrap();
        assert_eq!(must_not.len(), 1);
        assert_eq!(must_not[0]["multi_match"]["query"], json!("israel gaza palestina"));

        let body = trending_news("");
        assert!(body["query"]["bool"]["must_not"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_week_windows() {
        let now = Utc.with_ymd_and_hms(2024, 11, 20, 12, 0, 0).unwrap();
        let windows = WeekWindows::ending_at(now);
        let current = twitter_current_week(&windows);
        assert_eq!(current["query"]["range"]["date"]["gte"], json!("2024-11-13T12:00:00.000Z"));
        assert_eq!(current["query"]["range"]["date"]["lt"], json!("2024-11-20T12:00:00.000Z"));

        let previous = twitter_previous_week(&windows);
        assert_eq!(previous["query"]["range"]["date"]["gte"], json!("2024-11-06T12:00:00.000Z"));
        let filters = previous["aggs"]["dept_mentions"]["filters"]["filters"].as_object().unwrap();
        assert_eq!(filters.len(), DEPARTMENTS.len());
        assert_eq!(filters["dprd"]["match_phrase"]["contextual_keywords"], json!("DPRD"));
    }

    #[test]
    fn test_enhanced_twitter_time_ranges() {
        assert_eq!("weekly".parse::<TimeRange>().unwrap(), TimeRange::Weekly);
        assert_eq!("fortnightly".parse::<TimeRange>().unwrap(), TimeRange::Daily);

        let monthly = enhanced_twitter(TimeRange::Monthly, Some("Jakarta Barat"));
        let must = monthly["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(must[0]["range"]["date"]["gte"], json!("now-30d/d"));
        assert_eq!(monthly["aggs"]["sentiment_trends"]["date_histogram"]["calendar_interval"], json!("day"));

        let daily = enhanced_twitter(TimeRange::Daily, None);
        assert_eq!(daily["query"]["bool"]["must"].as_array().unwrap().len(), 1);
        assert_eq!(daily["aggs"]["engagement_trends"]["date_histogram"]["calendar_interval"], json!("hour"));
    }

    #[test]
    fn test_network_posts_region_filter() {
        assert!(network_posts(None)["query"]["bool"]["must"].as_array().unwrap().is_empty());
        let body = network_posts(Some("Jakarta Pusat"));
        assert_eq!(
            body["query"]["bool"]["must"][0]["match"]["affected_region.keyword"],
            json!("Jakarta Pusat")
        );
        assert_eq!(body["size"], json!(NETWORK_POST_LIMIT));
    }
}
