use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::SocialPost;
use crate::Result;

/// One post as handed to the summarization service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDigest {
    pub full_text: String,
    pub contextual_content: String,
}

impl PostDigest {
    pub fn from_post(post: &SocialPost) -> Self {
        Self {
            full_text: post.full_text.clone(),
            contextual_content: format!(
                "Tweet ini dari {} dengan topik {} dan sentiment {}",
                post.username,
                post.topic_classification.as_deref().unwrap_or("Unclassified"),
                post.sentiment.as_deref().unwrap_or("Neutral"),
            ),
        }
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Summarize a batch of posts. `Ok(None)` means the service had nothing to say.
    async fn summarize(&self, posts: &[PostDigest]) -> Result<Option<String>>;
}
