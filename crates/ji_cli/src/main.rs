use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use ji_core::config::{validate_url, Config};
use ji_core::logging::init_logging;
use ji_core::SearchBackend;
use ji_web::AppState;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
struct HumanDuration(Duration);

fn unit_seconds(unit: Option<char>) -> Result<u64, String> {
    match unit {
        None | Some('s') => Ok(1),
        Some('m') => Ok(60),
        Some('h') => Ok(3_600),
        Some('d') => Ok(86_400),
        Some(other) => Err(format!("Invalid duration unit: {}", other)),
    }
}

/// Accepts `<number><unit>` groups such as `90`, `10s`, `1m30s` or `1d 2h`.
/// A trailing bare number counts as seconds.
impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut rest = s.trim();
        if rest.is_empty() {
            return Err("Duration must include a number".to_string());
        }

        let mut total = 0u64;
        while !rest.is_empty() {
            let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            if digits == 0 {
                return Err(format!("Expected a number at '{}'", rest));
            }
            let value: u64 = rest[..digits]
                .parse()
                .map_err(|_| "Invalid number in duration".to_string())?;
            let unit = rest[digits..].chars().next();
            let seconds = value
                .checked_mul(unit_seconds(unit)?)
                .and_then(|secs| total.checked_add(secs))
                .ok_or_else(|| "Duration is too large".to_string())?;
            total = seconds;
            rest = rest[digits + unit.map_or(0, char::len_utf8)..].trim_start();
        }

        Ok(HumanDuration(Duration::from_secs(total)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Jakarta Insight monitoring API", long_about = None)]
pub struct Cli {
    #[arg(long, default_value = "elastic", help = "Search backend: elastic (default) or memory")]
    backend: String,
    #[arg(long, help = "Search engine URL, overrides JI_ES_URL")]
    es_url: Option<String>,
    #[arg(long, default_value = "http", help = "Summarizer: http (default), dummy or none")]
    summarizer: String,
    #[arg(long, help = "Summarization service URL, overrides JI_SUMMARIZER_URL")]
    summarizer_url: Option<String>,
    #[arg(long, help = "Listen address, overrides JI_BIND")]
    bind: Option<SocketAddr>,
    #[arg(long, help = "Prebuilt frontend served behind the login gate")]
    static_dir: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve,
    /// Ping the search backend and exit
    Check {
        #[arg(long, default_value_t = 3)]
        retries: u32,
        /// Per-attempt timeout (e.g. 10s, 1m)
        #[arg(long, default_value = "10s")]
        timeout: HumanDuration,
    },
}

impl Cli {
    /// Environment configuration with command-line overrides applied.
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = Config::from_env().context("Invalid configuration")?;
        if let Some(url) = &self.es_url {
            config.search.with_url(url)?;
        }
        if let Some(url) = &self.summarizer_url {
            config.summarizer.url = Some(validate_url(url)?);
        }
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(dir) = &self.static_dir {
            config.server.static_dir = Some(dir.clone());
        }
        Ok(config)
    }
}

async fn check_backend_with_retry(
    backend: &Arc<dyn SearchBackend>,
    max_retries: u32,
    timeout: Duration,
) -> ji_core::Result<()> {
    let mut retries = 0;
    let mut last_error = None;

    while retries < max_retries {
        match tokio::time::timeout(timeout, backend.ping()).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => last_error = Some(e),
            Err(_) => last_error = Some(ji_core::Error::Timeout(timeout)),
        }
        retries += 1;
        if retries < max_retries {
            info!("Search backend check failed, retrying {}/{}...", retries, max_retries);
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }

    Err(last_error.unwrap_or_else(|| ji_core::Error::Config("no health check attempts were made".to_string())))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    let config = cli.config()?;

    let backend = ji_search::create_backend(&cli.backend, &config.search)?;
    info!("🔎 Search backend: {} ({})", backend.name(), config.search.url);

    match cli.command {
        Commands::Check { retries, timeout } => {
            check_backend_with_retry(&backend, retries, timeout.0)
                .await
                .with_context(|| format!("Search backend at {} is unreachable", config.search.url))?;
            info!("✨ Search backend is reachable");
        }
        Commands::Serve => {
            let summarizer = ji_inference::create_summarizer(&cli.summarizer, &config.summarizer)?;
            match &summarizer {
                Some(s) => info!("🧠 Summarizer: {}", s.name()),
                None => info!("🧠 Summaries disabled"),
            }
            let state = AppState::from_config(&config, backend, summarizer);
            ji_web::serve(state, config.server.bind).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_duration() {
        assert_eq!("10s".parse::<HumanDuration>().unwrap().0, Duration::from_secs(10));
        assert_eq!("1m30s".parse::<HumanDuration>().unwrap().0, Duration::from_secs(90));
        assert_eq!("45".parse::<HumanDuration>().unwrap().0, Duration::from_secs(45));
        assert_eq!("1d 2h".parse::<HumanDuration>().unwrap().0, Duration::from_secs(93_600));
        assert!("".parse::<HumanDuration>().is_err());
        assert!("5x".parse::<HumanDuration>().is_err());
        assert!("s10".parse::<HumanDuration>().is_err());
    }

    #[test]
    fn test_cli_parses_check() {
        let cli = Cli::parse_from(["ji", "--backend", "memory", "check", "--retries", "1"]);
        assert_eq!(cli.backend, "memory");
        match cli.command {
            Commands::Check { retries, timeout } => {
                assert_eq!(retries, 1);
                assert_eq!(timeout.0, Duration::from_secs(10));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_memory_backend() {
        let backend = ji_search::create_backend("memory", &Default::default()).unwrap();
        assert!(check_backend_with_retry(&backend, 1, Duration::from_secs(1)).await.is_ok());
    }
}
