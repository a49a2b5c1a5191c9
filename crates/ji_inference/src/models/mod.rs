use std::sync::Arc;

use ji_core::config::SummarizerConfig;
use ji_core::{Error, Result, Summarizer};

pub mod dummy;
pub mod http;

pub use dummy::DummySummarizer;
pub use http::HttpSummarizer;

/// Builds the configured summarizer. `http` without a service URL, or `none`,
/// disables summaries.
pub fn create_summarizer(kind: &str, config: &SummarizerConfig) -> Result<Option<Arc<dyn Summarizer>>> {
    match kind {
        "none" => Ok(None),
        "dummy" => Ok(Some(Arc::new(DummySummarizer::new()))),
        "http" => match &config.url {
            Some(url) => Ok(Some(Arc::new(HttpSummarizer::new(url, config.timeout)?))),
            None => {
                tracing::info!("No summarizer URL configured, summaries disabled");
                Ok(None)
            }
        },
        other => Err(Error::Config(format!(
            "unknown summarizer '{}', expected one of: http, dummy, none",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_summarizer() {
        let mut config = SummarizerConfig::default();
        assert!(create_summarizer("none", &config).unwrap().is_none());
        assert!(create_summarizer("http", &config).unwrap().is_none());
        assert_eq!(create_summarizer("dummy", &config).unwrap().unwrap().name(), "Dummy");

        config.url = Some("http://localhost:8000".to_string());
        assert_eq!(create_summarizer("http", &config).unwrap().unwrap().name(), "HTTP");
        assert!(create_summarizer("gpt", &config).is_err());
    }
}
