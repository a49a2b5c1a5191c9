use async_trait::async_trait;
use serde_json::Value;

use crate::types::SearchResponse;
use crate::Result;

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Human readable backend name for logs.
    fn name(&self) -> &str;

    /// Run a `_search` request with an engine-native body against `index`.
    async fn search(&self, index: &str, body: Value) -> Result<SearchResponse>;

    /// Count documents in `index`, optionally restricted by a query clause.
    async fn count(&self, index: &str, query: Option<Value>) -> Result<u64>;

    /// Check that the engine is reachable.
    async fn ping(&self) -> Result<()>;
}
