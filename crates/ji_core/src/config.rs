use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_SEARCH_URL: &str = "http://localhost:9200";
pub const DEFAULT_EXCLUDED_TOPICS: &str = "israel gaza palestina";

#[derive(Clone)]
pub struct SearchConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
    pub insecure_tls: bool,
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_deref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("insecure_tls", &self.insecure_tls)
            .finish()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SEARCH_URL.to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
            insecure_tls: false,
        }
    }
}

impl SearchConfig {
    pub fn with_url(&mut self, url: &str) -> Result<&mut Self> {
        self.url = validate_url(url)?;
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Base URL of the summarization service; `None` disables summaries.
    pub url: Option<String>,
    pub timeout: Duration,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    pub role: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "demo".to_string(),
            password: "demomenyala24".to_string(),
            role: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Prebuilt frontend served behind the page gate.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub search: SearchConfig,
    pub summarizer: SummarizerConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    /// Phrase whose matches are dropped from news trending keywords.
    pub excluded_topics: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            summarizer: SummarizerConfig::default(),
            auth: AuthConfig::default(),
            server: ServerConfig::default(),
            excluded_topics: DEFAULT_EXCLUDED_TOPICS.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup, falling back to defaults for
    /// unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = lookup("JI_ES_URL") {
            config.search.with_url(&url)?;
        }
        config.search.username = lookup("JI_ES_USERNAME");
        config.search.password = lookup("JI_ES_PASSWORD");
        if let Some(secs) = lookup("JI_ES_TIMEOUT_SECS") {
            config.search.timeout = parse_secs("JI_ES_TIMEOUT_SECS", &secs)?;
        }
        if let Some(flag) = lookup("JI_ES_INSECURE_TLS") {
            config.search.insecure_tls = parse_bool("JI_ES_INSECURE_TLS", &flag)?;
        }

        if let Some(url) = lookup("JI_SUMMARIZER_URL") {
            config.summarizer.url = Some(validate_url(&url)?);
        }
        if let Some(secs) = lookup("JI_SUMMARY_TIMEOUT_SECS") {
            config.summarizer.timeout = parse_secs("JI_SUMMARY_TIMEOUT_SECS", &secs)?;
        }

        if let Some(username) = lookup("JI_AUTH_USERNAME") {
            config.auth.username = username;
        }
        if let Some(password) = lookup("JI_AUTH_PASSWORD") {
            config.auth.password = password;
        }
        if let Some(role) = lookup("JI_AUTH_ROLE") {
            config.auth.role = role;
        }

        if let Some(bind) = lookup("JI_BIND") {
            config.server.bind = bind
                .parse()
                .map_err(|e| Error::Config(format!("JI_BIND={}: {}", bind, e)))?;
        }
        config.server.static_dir = lookup("JI_STATIC_DIR").map(PathBuf::from);

        if let Some(excluded) = lookup("JI_EXCLUDED_TOPICS") {
            config.excluded_topics = excluded;
        }

        Ok(config)
    }
}

pub fn validate_url(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{}: {}", raw, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl(format!("{}: unsupported scheme", raw)));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| Error::Config(format!("{}={}: {}", key, value, e)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{}={}: expected a boolean", key, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.search.url, DEFAULT_SEARCH_URL);
        assert_eq!(config.search.timeout, Duration::from_secs(30));
        assert_eq!(config.summarizer.timeout, Duration::from_secs(5));
        assert!(config.summarizer.url.is_none());
        assert_eq!(config.auth.username, "demo");
        assert_eq!(config.server.bind.port(), 3000);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("JI_ES_URL", "https://search.internal:9200/"),
            ("JI_ES_TIMEOUT_SECS", "10"),
            ("JI_ES_INSECURE_TLS", "yes"),
            ("JI_SUMMARIZER_URL", "http://summarizer:8000"),
            ("JI_AUTH_PASSWORD", "s3cret"),
            ("JI_BIND", "127.0.0.1:8080"),
        ]))
        .unwrap();
        assert_eq!(config.search.url, "https://search.internal:9200");
        assert_eq!(config.search.timeout, Duration::from_secs(10));
        assert!(config.search.insecure_tls);
        assert_eq!(config.summarizer.url.as_deref(), Some("http://summarizer:8000"));
        assert_eq!(config.auth.password, "s3cret");
        assert_eq!(config.server.bind.port(), 8080);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_lookup(lookup(&[("JI_ES_URL", "not a url")])).is_err());
        assert!(Config::from_lookup(lookup(&[("JI_ES_URL", "ftp://host")])).is_err());
        assert!(Config::from_lookup(lookup(&[("JI_ES_TIMEOUT_SECS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup(&[("JI_ES_INSECURE_TLS", "maybe")])).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = Config::default();
        config.search.password = Some("hunter2".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("demomenyala24"));
    }
}
