use std::time::Duration;

use ji_core::{PostDigest, Summarizer};

pub mod models;

pub use models::create_summarizer;

/// Runs a summarization under `timeout`. Any failure, including the timeout,
/// is logged and turned into no summary.
pub async fn summarize_best_effort(
    summarizer: &dyn Summarizer,
    posts: &[PostDigest],
    timeout: Duration,
) -> Option<String> {
    if posts.is_empty() {
        return None;
    }
    match tokio::time::timeout(timeout, summarizer.summarize(posts)).await {
        Ok(Ok(summary)) => summary,
        Ok(Err(e)) => {
            tracing::warn!("{} summarization failed: {}", summarizer.name(), e);
            None
        }
        Err(_) => {
            tracing::warn!("{} summarization timed out after {:?}", summarizer.name(), timeout);
            None
        }
    }
}

pub mod prelude {
    pub use super::models::{create_summarizer, DummySummarizer, HttpSummarizer};
    pub use super::summarize_best_effort;
    pub use ji_core::{Error, PostDigest, Result, Summarizer};
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ji_core::Result;

    #[derive(Debug)]
    struct SlowSummarizer(Duration);

    #[async_trait]
    impl Summarizer for SlowSummarizer {
        fn name(&self) -> &str {
            "slow"
        }

        async fn summarize(&self, _posts: &[PostDigest]) -> Result<Option<String>> {
            tokio::time::sleep(self.0).await;
            Ok(Some("late".to_string()))
        }
    }

    #[derive(Debug)]
    struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        fn name(&self) -> &str {
            "failing"
        }

        async fn summarize(&self, _posts: &[PostDigest]) -> Result<Option<String>> {
            Err(ji_core::Error::Summarization("service unavailable".to_string()))
        }
    }

    fn digest() -> Vec<PostDigest> {
        vec![PostDigest {
            full_text: "Banjir di Kemang".to_string(),
            contextual_content: "Tweet ini dari warga".to_string(),
        }]
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_no_summary() {
        let slow = SlowSummarizer(Duration::from_secs(10));
        assert_eq!(summarize_best_effort(&slow, &digest(), Duration::from_secs(5)).await, None);

        let quick = SlowSummarizer(Duration::from_millis(10));
        assert_eq!(
            summarize_best_effort(&quick, &digest(), Duration::from_secs(5)).await,
            Some("late".to_string())
        );
    }

    #[tokio::test]
    async fn test_errors_and_empty_input_yield_no_summary() {
        assert_eq!(
            summarize_best_effort(&FailingSummarizer, &digest(), Duration::from_secs(1)).await,
            None
        );
        let quick = SlowSummarizer(Duration::ZERO);
        assert_eq!(summarize_best_effort(&quick, &[], Duration::from_secs(1)).await, None);
    }
}
