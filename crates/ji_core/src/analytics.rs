//! Arithmetic over already-aggregated buckets.

use serde::{Deserialize, Serialize};

use crate::aggs::Bucket;

pub const HIGH_URGENCY: f64 = 70.0;
pub const MEDIUM_URGENCY: f64 = 30.0;
pub const URGENT_ARTICLE: f64 = 80.0;

/// Week-over-week change as a percentage string with one decimal, or `"N/A"`
/// when there is no previous value to compare against.
pub fn calculate_change(current: f64, previous: f64) -> String {
    if previous == 0.0 {
        return "N/A".to_string();
    }
    let change = ((current - previous) / previous) * 100.0;
    format!("{:.1}", change)
}

fn sentiment_weight(label: &str) -> f64 {
    match label {
        "Positive" => 100.0,
        "Neutral" => 50.0,
        _ => 0.0,
    }
}

/// Weighted sentiment score in [0, 100] with two decimals, `"0"` for no data.
pub fn sentiment_score(buckets: &[Bucket]) -> String {
    let (score, count) = buckets.iter().fold((0.0, 0u64), |(score, count), b| {
        (score + sentiment_weight(&b.key) * b.doc_count as f64, count + b.doc_count)
    });
    if count == 0 {
        return "0".to_string();
    }
    format!("{:.2}", score / count as f64)
}

pub fn total_pages(total: u64, items_per_page: u64) -> u64 {
    if items_per_page == 0 {
        return 0;
    }
    total.div_ceil(items_per_page)
}

pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
}

impl UrgencyLevel {
    pub fn of(score: f64) -> Self {
        if score >= HIGH_URGENCY {
            UrgencyLevel::High
        } else if score >= MEDIUM_URGENCY {
            UrgencyLevel::Medium
        } else {
            UrgencyLevel::Low
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(rename = "currentPage")]
    pub current_page: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
    #[serde(rename = "itemsPerPage")]
    pub items_per_page: u64,
}

impl Pagination {
    pub fn new(current_page: u64, items_per_page: u64, total: u64) -> Self {
        Self {
            current_page,
            total_pages: total_pages(total, items_per_page),
            items_per_page,
        }
    }

    /// Zero-based document offset of the current page.
    pub fn from(&self) -> u64 {
        self.current_page.saturating_sub(1) * self.items_per_page
    }
}

/// Per-day sentiment counts for trend charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub date: String,
    pub positive: u64,
    pub negative: u64,
    pub neutral: u64,
}

impl SentimentCounts {
    pub fn from_buckets(date: impl Into<String>, buckets: &[Bucket]) -> Self {
        let mut counts = Self {
            date: date.into(),
            ..Default::default()
        };
        for bucket in buckets {
            match bucket.key.to_lowercase().as_str() {
                "positive" => counts.positive = bucket.doc_count,
                "negative" => counts.negative = bucket.doc_count,
                "neutral" => counts.neutral = bucket.doc_count,
                _ => {}
            }
        }
        counts
    }
}

pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const NEGATIVE_ACTIONS: [&str; 4] = [
    "Increase public communication",
    "Schedule community meetings",
    "Develop action plans",
    "Allocate emergency resources",
];

const NEUTRAL_ACTIONS: [&str; 4] = [
    "Monitor situation closely",
    "Gather public feedback",
    "Prepare contingency plans",
    "Enhance public awareness",
];

const POSITIVE_ACTIONS: [&str; 4] = [
    "Maintain current approach",
    "Share success stories",
    "Build on positive momentum",
    "Expand successful programs",
];

/// Suggested follow-up for a high-urgency topic. The action is chosen from the
/// sentiment's table by a stable hash of topic and region, so repeated calls
/// agree.
pub fn generate_recommendation(topic: &str, region: &str, sentiment: &str) -> String {
    let actions = match sentiment.to_lowercase().as_str() {
        "negative" => &NEGATIVE_ACTIONS,
        "positive" => &POSITIVE_ACTIONS,
        _ => &NEUTRAL_ACTIONS,
    };
    let seed = topic
        .bytes()
        .chain(region.bytes())
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    let action = actions[seed % actions.len()];
    format!("{} regarding {} in {}.", action, topic, region)
}

/// How a queried network node relates to the posts returned for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "user/mention")]
    UserOrMention,
    #[serde(rename = "hashtag")]
    Hashtag,
    #[serde(rename = "user")]
    User,
}

impl NodeKind {
    pub fn detect(term: &str) -> Self {
        if term.starts_with('@') {
            NodeKind::UserOrMention
        } else if term.starts_with('#') {
            NodeKind::Hashtag
        } else {
            NodeKind::User
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Author,
    Mentioned,
    Hashtag,
    Unknown,
}

/// Strips the `@`/`#` markers from a node label.
pub fn clean_term(term: &str) -> String {
    term.chars().filter(|c| *c != '@' && *c != '#').collect()
}

pub fn classify_relation(kind: NodeKind, clean: &str, username: &str, mentions: &[String]) -> Relation {
    if kind == NodeKind::Hashtag {
        Relation::Hashtag
    } else if clean == username {
        Relation::Author
    } else if mentions.iter().any(|m| m == clean) {
        Relation::Mentioned
    } else {
        Relation::Unknown
    }
}

/// Normalizes a tag to carry exactly one leading marker.
pub fn with_marker(marker: char, value: &str) -> String {
    let stripped = value.replacen(marker, "", 1);
    format!("{}{}", marker, stripped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(key: &str, doc_count: u64) -> Bucket {
        Bucket {
            key: key.to_string(),
            doc_count,
        }
    }

    #[test]
    fn test_calculate_change() {
        assert_eq!(calculate_change(0.0, 40.0), "-100.0");
        assert_eq!(calculate_change(150.0, 100.0), "50.0");
        assert_eq!(calculate_change(1.0, 3.0), "-66.7");
        assert_eq!(calculate_change(12.0, 0.0), "N/A");
        assert_eq!(calculate_change(0.0, 0.0), "N/A");
    }

    #[test]
    fn test_sentiment_score() {
        assert_eq!(sentiment_score(&[bucket("Positive", 10), bucket("Negative", 10)]), "50.00");
        assert_eq!(sentiment_score(&[bucket("Neutral", 3)]), "50.00");
        assert_eq!(sentiment_score(&[bucket("Positive", 2), bucket("Neutral", 1)]), "83.33");
        assert_eq!(sentiment_score(&[bucket("Mixed", 4)]), "0.00");
        assert_eq!(sentiment_score(&[]), "0");
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(95, 20), 5);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn test_pagination_offset() {
        let p = Pagination::new(3, 10, 45);
        assert_eq!(p.from(), 20);
        assert_eq!(p.total_pages, 5);
        assert_eq!(Pagination::new(0, 10, 0).from(), 0);
    }

    #[test]
    fn test_urgency_levels() {
        assert_eq!(UrgencyLevel::of(10.0), UrgencyLevel::Low);
        assert_eq!(UrgencyLevel::of(30.0), UrgencyLevel::Medium);
        assert_eq!(UrgencyLevel::of(69.9), UrgencyLevel::Medium);
        assert_eq!(UrgencyLevel::of(70.0), UrgencyLevel::High);
    }

    #[test]
    fn test_sentiment_counts_ignore_unknown_labels() {
        let counts = SentimentCounts::from_buckets(
            "2024-11-20",
            &[bucket("Positive", 4), bucket("negative", 2), bucket("Sarcastic", 9)],
        );
        assert_eq!(counts.positive, 4);
        assert_eq!(counts.negative, 2);
        assert_eq!(counts.neutral, 0);
    }

    #[test]
    fn test_recommendation_is_stable() {
        let first = generate_recommendation("Flooding", "Jakarta Utara", "Negative");
        let second = generate_recommendation("Flooding", "Jakarta Utara", "Negative");
        assert_eq!(first, second);
        assert!(first.ends_with("regarding Flooding in Jakarta Utara."));
        assert!(NEGATIVE_ACTIONS.iter().any(|a| first.starts_with(a)));

        let unknown = generate_recommendation("Traffic", "Jakarta Barat", "mixed");
        assert!(NEUTRAL_ACTIONS.iter().any(|a| unknown.starts_with(a)));
    }

    #[test]
    fn test_relation_classification() {
        assert_eq!(NodeKind::detect("@dkijakarta"), NodeKind::UserOrMention);
        assert_eq!(NodeKind::detect("#banjir"), NodeKind::Hashtag);
        assert_eq!(NodeKind::detect("warga"), NodeKind::User);
        assert_eq!(clean_term("@dki#jakarta"), "dkijakarta");

        let mentions = vec!["dkijakarta".to_string()];
        assert_eq!(classify_relation(NodeKind::User, "warga", "warga", &mentions), Relation::Author);
        assert_eq!(
            classify_relation(NodeKind::UserOrMention, "dkijakarta", "warga", &mentions),
            Relation::Mentioned
        );
        assert_eq!(classify_relation(NodeKind::Hashtag, "banjir", "banjir", &[]), Relation::Hashtag);
        assert_eq!(classify_relation(NodeKind::User, "other", "warga", &mentions), Relation::Unknown);
    }

    #[test]
    fn test_markers_and_capitalize() {
        assert_eq!(with_marker('@', "@dkijakarta"), "@dkijakarta");
        assert_eq!(with_marker('#', "banjir"), "#banjir");
        assert_eq!(capitalize("pemprov"), "Pemprov");
        assert_eq!(capitalize(""), "");
    }
}
