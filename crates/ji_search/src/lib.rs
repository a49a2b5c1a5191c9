use std::sync::Arc;

use ji_core::config::SearchConfig;
use ji_core::{Error, Result, SearchBackend};

pub mod backends;
pub mod queries;

pub use backends::*;

/// Picks a backend by name: `elastic` talks to a live engine, `memory` serves
/// empty (or canned) results for local development.
pub fn create_backend(kind: &str, config: &SearchConfig) -> Result<Arc<dyn SearchBackend>> {
    match kind {
        "elastic" | "elasticsearch" => Ok(Arc::new(ElasticBackend::new(config)?)),
        "memory" => Ok(Arc::new(MemoryBackend::new())),
        other => Err(Error::Config(format!(
            "unknown search backend '{}', expected 'elastic' or 'memory'",
            other
        ))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_backend;
    pub use super::queries;
}
