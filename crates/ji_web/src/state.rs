use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ji_core::config::{Config, DEFAULT_EXCLUDED_TOPICS};
use ji_core::{SearchBackend, Summarizer};

use crate::auth::{CredentialStore, StaticCredentials};

pub struct AppState {
    pub backend: Arc<dyn SearchBackend>,
    pub summarizer: Option<Arc<dyn Summarizer>>,
    pub credentials: Arc<dyn CredentialStore>,
    pub excluded_topics: String,
    pub summary_timeout: Duration,
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    /// State with default settings around the given backend; summaries off.
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            summarizer: None,
            credentials: Arc::new(StaticCredentials::default()),
            excluded_topics: DEFAULT_EXCLUDED_TOPICS.to_string(),
            summary_timeout: Duration::from_secs(5),
            static_dir: None,
        }
    }

    pub fn from_config(
        config: &Config,
        backend: Arc<dyn SearchBackend>,
        summarizer: Option<Arc<dyn Summarizer>>,
    ) -> Self {
        Self {
            backend,
            summarizer,
            credentials: Arc::new(StaticCredentials::new(config.auth.clone())),
            excluded_topics: config.excluded_topics.clone(),
            summary_timeout: config.summarizer.timeout,
            static_dir: config.server.static_dir.clone(),
        }
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }
}
