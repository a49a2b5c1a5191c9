use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use ji_core::{Error, PostDigest, Result, Summarizer};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    search_results: &'a [PostDigest],
}

#[derive(Deserialize)]
struct SummarizeResponse {
    #[serde(default)]
    summary: Option<String>,
}

/// External summarization service exposing `POST /summarize/`.
pub struct HttpSummarizer {
    client: Client,
    base_url: String,
}

impl fmt::Debug for HttpSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSummarizer")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpSummarizer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/summarize/", self.base_url)
    }
}

fn parse_summary(body: &str) -> Result<Option<String>> {
    let response: SummarizeResponse = serde_json::from_str(body)?;
    Ok(response.summary.filter(|s| !s.trim().is_empty()))
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn summarize(&self, posts: &[PostDigest]) -> Result<Option<String>> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Accept", "application/json")
            .json(&SummarizeRequest { search_results: posts })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Summarization(format!(
                "summarizer answered {}",
                status
            )));
        }
        parse_summary(&response.text().await?)
    }
}
