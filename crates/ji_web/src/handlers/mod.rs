use ji_core::Source;

use crate::error::ApiError;

pub mod analytics;
pub mod dashboard;
pub mod engagement;
pub mod health;
pub mod network;
pub mod search;
pub mod trending;

pub use analytics::{enhanced_twitter, topics, twitter_analytics};
pub use dashboard::dashboard;
pub use engagement::{chat_logs, engagement_stats};
pub use health::health;
pub use network::{network, summarize_posts, user_tweets};
pub use search::{news_search, search};
pub use trending::trending;

pub(crate) const DEFAULT_ITEMS_PER_PAGE: u64 = 10;

pub(crate) fn parse_source(raw: Option<&str>) -> Result<Source, ApiError> {
    parse_source_or(raw, Source::default())
}

/// Parses `source`, using `fallback` when it is absent or blank.
pub(crate) fn parse_source_or(raw: Option<&str>, fallback: Source) -> Result<Source, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse().map_err(|e: ji_core::Error| ApiError::BadRequest(e.to_string())),
        None => Ok(fallback),
    }
}

/// Page and page size, both at least one.
pub(crate) fn page_params(page: Option<u64>, items_per_page: Option<u64>) -> Result<(u64, u64), ApiError> {
    let page = page.unwrap_or(1);
    let items_per_page = items_per_page.unwrap_or(DEFAULT_ITEMS_PER_PAGE);
    if page == 0 {
        return Err(ApiError::BadRequest("page must be at least 1".to_string()));
    }
    if items_per_page == 0 {
        return Err(ApiError::BadRequest("itemsPerPage must be at least 1".to_string()));
    }
    Ok((page, items_per_page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        assert_eq!(parse_source(None).unwrap(), Source::News);
        assert_eq!(parse_source(Some("")).unwrap(), Source::News);
        assert_eq!(parse_source(Some("twitter")).unwrap(), Source::Twitter);
        assert!(parse_source(Some("facebook")).is_err());
        assert_eq!(parse_source_or(None, Source::Twitter).unwrap(), Source::Twitter);
        assert_eq!(parse_source_or(Some("news"), Source::Twitter).unwrap(), Source::News);
    }

    #[test]
    fn test_page_params() {
        assert_eq!(page_params(None, None).unwrap(), (1, DEFAULT_ITEMS_PER_PAGE));
        assert_eq!(page_params(Some(3), Some(25)).unwrap(), (3, 25));
        assert!(page_params(Some(0), None).is_err());
        assert!(page_params(None, Some(0)).is_err());
    }
}
