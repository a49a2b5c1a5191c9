use std::fmt;

use ji_core::{PostDigest, Result, Summarizer};

const SUMMARY_WORDS: usize = 20;

/// Offline stand-in: the opening words of the first post.
pub struct DummySummarizer;

impl fmt::Debug for DummySummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummySummarizer").finish()
    }
}

impl DummySummarizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummySummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Summarizer for DummySummarizer {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn summarize(&self, posts: &[PostDigest]) -> Result<Option<String>> {
        let words: Vec<&str> = posts
            .iter()
            .flat_map(|p| p.full_text.split_whitespace())
            .take(SUMMARY_WORDS)
            .collect();
        if words.is_empty() {
            return Ok(None);
        }
        Ok(Some(words.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_takes_leading_words() {
        let posts: Vec<PostDigest> = (0..3)
            .map(|i| PostDigest {
                full_text: format!("post {} tentang banjir di Jakarta Utara hari ini sangat parah", i),
                contextual_content: String::new(),
            })
            .collect();
        let summary = DummySummarizer::new().summarize(&posts).await.unwrap().unwrap();
        assert_eq!(summary.split_whitespace().count(), SUMMARY_WORDS);
        assert!(summary.starts_with("post 0 tentang banjir"));

        assert_eq!(DummySummarizer::new().summarize(&[]).await.unwrap(), None);
    }
}
