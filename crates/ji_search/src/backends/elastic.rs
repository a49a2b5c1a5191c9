use std::fmt;

use async_trait::async_trait;
use ji_core::config::SearchConfig;
use ji_core::{CountResponse, Error, Result, SearchBackend, SearchResponse};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};

/// Elasticsearch-compatible engine reached over its REST API.
pub struct ElasticBackend {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl fmt::Debug for ElasticBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElasticBackend")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ElasticBackend {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure_tls)
            .build()?;
        if config.insecure_tls {
            tracing::warn!("TLS certificate verification disabled for {}", config.url);
        }
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn endpoint(&self, index: &str, action: &str) -> String {
        format!("{}/{}/{}", self.base_url, index, action)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(username) => request.basic_auth(username, self.password.as_deref()),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&text).ok();
        let reason = body
            .as_ref()
            .and_then(error_reason)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
        Err(Error::Search {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

/// Pulls the most specific reason out of an engine error body.
fn error_reason(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    if let Some(text) = error.as_str() {
        return Some(text.to_string());
    }
    error
        .pointer("/root_cause/0/reason")
        .or_else(|| error.get("reason"))
        .or_else(|| error.get("type"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl SearchBackend for ElasticBackend {
    fn name(&self) -> &str {
        "elasticsearch"
    }

    async fn search(&self, index: &str, body: Value) -> Result<SearchResponse> {
        tracing::debug!("POST {} {}", self.endpoint(index, "_search"), body);
        let request = self
            .client
            .post(self.endpoint(index, "_search"))
            .json(&body);
        let response = Self::check(self.authorize(request).send().await?).await?;
        Ok(response.json::<SearchResponse>().await?)
    }

    async fn count(&self, index: &str, query: Option<Value>) -> Result<u64> {
        let body = match query {
            Some(query) => json!({ "query": query }),
            None => json!({}),
        };
        let request = self
            .client
            .post(self.endpoint(index, "_count"))
            .json(&body);
        let response = Self::check(self.authorize(request).send().await?).await?;
        Ok(response.json::<CountResponse>().await?.count)
    }

    async fn ping(&self) -> Result<()> {
        let request = self.client.get(format!("{}/", self.base_url));
        Self::check(self.authorize(request).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let mut config = SearchConfig::default();
        config.url = "http://localhost:9200/".to_string();
        let backend = ElasticBackend::new(&config).unwrap();
        assert_eq!(
            backend.endpoint("news_jakarta", "_search"),
            "http://localhost:9200/news_jakarta/_search"
        );
    }

    #[test]
    fn test_error_reason_prefers_root_cause() {
        let body = json!({
            "error": {
                "root_cause": [{"type": "index_not_found_exception", "reason": "no such index [tweets]"}],
                "type": "index_not_found_exception",
                "reason": "no such index"
            },
            "status": 404
        });
        assert_eq!(error_reason(&body).as_deref(), Some("no such index [tweets]"));
        assert_eq!(error_reason(&json!({"error": "boom"})).as_deref(), Some("boom"));
        assert_eq!(error_reason(&json!({"ok": true})), None);
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut config = SearchConfig::default();
        config.username = Some("elastic".to_string());
        config.password = Some("changeme".to_string());
        let backend = ElasticBackend::new(&config).unwrap();
        let rendered = format!("{:?}", backend);
        assert!(rendered.contains("elastic"));
        assert!(!rendered.contains("changeme"));
    }
}
