use async_trait::async_trait;
use ji_core::{Result, SearchBackend, SearchResponse};
use serde_json::Value;
use tokio::sync::RwLock;

type Matcher = Box<dyn Fn(&Value) -> bool + Send + Sync>;

struct SearchRule {
    index: String,
    matcher: Matcher,
    response: SearchResponse,
}

struct CountRule {
    index: String,
    matcher: Matcher,
    count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    Search { index: String, body: Value },
    Count { index: String, query: Option<Value> },
}

impl RecordedRequest {
    pub fn index(&self) -> &str {
        match self {
            RecordedRequest::Search { index, .. } | RecordedRequest::Count { index, .. } => index,
        }
    }
}

/// Serves canned responses by index and request shape. Without a matching
/// rule it answers with no hits and a zero count. Calls are only kept when
/// built with [`MemoryBackend::recording`].
#[derive(Default)]
pub struct MemoryBackend {
    searches: Vec<SearchRule>,
    counts: Vec<CountRule>,
    recording: bool,
    requests: RwLock<Vec<RecordedRequest>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep every issued request for later inspection.
    pub fn recording(mut self) -> Self {
        self.recording = true;
        self
    }

    async fn record(&self, request: RecordedRequest) {
        if self.recording {
            self.requests.write().await.push(request);
        }
    }

    /// Answer every search on `index` with `response`.
    pub fn with_search(self, index: &str, response: SearchResponse) -> Self {
        self.on_search(index, |_| true, response)
    }

    /// Answer searches on `index` whose body satisfies `matcher`. Rules are
    /// tried in registration order.
    pub fn on_search<F>(mut self, index: &str, matcher: F, response: SearchResponse) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.searches.push(SearchRule {
            index: index.to_string(),
            matcher: Box::new(matcher),
            response,
        });
        self
    }

    pub fn with_count(self, index: &str, count: u64) -> Self {
        self.on_count(index, |_| true, count)
    }

    /// Answer counts on `index` whose query satisfies `matcher`; an absent
    /// query is presented as `null`.
    pub fn on_count<F>(mut self, index: &str, matcher: F, count: u64) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.counts.push(CountRule {
            index: index.to_string(),
            matcher: Box::new(matcher),
            count,
        });
        self
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    pub async fn searches_on(&self, index: &str) -> Vec<Value> {
        self.requests
            .read()
            .await
            .iter()
            .filter_map(|r| match r {
                RecordedRequest::Search { index: i, body } if i == index => Some(body.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn search(&self, index: &str, body: Value) -> Result<SearchResponse> {
        let response = self
            .searches
            .iter()
            .find(|rule| rule.index == index && (rule.matcher)(&body))
            .map(|rule| rule.response.clone())
            .unwrap_or_default();
        self.record(RecordedRequest::Search {
            index: index.to_string(),
            body,
        })
        .await;
        Ok(response)
    }

    async fn count(&self, index: &str, query: Option<Value>) -> Result<u64> {
        let body = query.clone().unwrap_or(Value::Null);
        let count = self
            .counts
            .iter()
            .find(|rule| rule.index == index && (rule.matcher)(&body))
            .map(|rule| rule.count)
            .unwrap_or(0);
        self.record(RecordedRequest::Count {
            index: index.to_string(),
            query,
        })
        .await;
        Ok(count)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(total: u64) -> SearchResponse {
        serde_json::from_value(json!({"hits": {"total": {"value": total}, "hits": []}})).unwrap()
    }

    #[tokio::test]
    async fn test_rules_match_in_order() {
        let backend = MemoryBackend::new()
            .recording()
            .on_search("news_jakarta", |body| body.get("aggs").is_some(), response(1))
            .with_search("news_jakarta", response(2));

        let with_aggs = backend.search("news_jakarta", json!({"aggs": {}})).await.unwrap();
        let plain = backend.search("news_jakarta", json!({"size": 10})).await.unwrap();
        let other = backend.search("twitter_jakarta", json!({})).await.unwrap();

        assert_eq!(with_aggs.total(), 1);
        assert_eq!(plain.total(), 2);
        assert_eq!(other.total(), 0);
        assert_eq!(backend.requests().await.len(), 3);
        assert_eq!(backend.searches_on("news_jakarta").await.len(), 2);
    }

    #[tokio::test]
    async fn test_counts_see_null_for_missing_query() {
        let backend = MemoryBackend::new()
            .on_count("chat_interactions", Value::is_null, 40)
            .with_count("chat_interactions", 7);

        assert_eq!(backend.count("chat_interactions", None).await.unwrap(), 40);
        assert_eq!(
            backend
                .count("chat_interactions", Some(json!({"match_all": {}})))
                .await
                .unwrap(),
            7
        );
        assert_eq!(backend.count("news_jakarta", None).await.unwrap(), 0);
        assert!(backend.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_requests_are_not_kept_by_default() {
        let backend = MemoryBackend::new().with_count("chat_interactions", 3);
        for _ in 0..50 {
            backend.search("chat_interactions", json!({"size": 0})).await.unwrap();
            backend.count("chat_interactions", None).await.unwrap();
        }
        assert!(backend.requests().await.is_empty());
    }
}
