pub mod aggs;
pub mod analytics;
pub mod config;
pub mod error;
pub mod logging;
pub mod network;
pub mod search;
pub mod summarize;
pub mod types;

pub use error::Error;
pub use error::Result;
pub use search::SearchBackend;
pub use summarize::{PostDigest, Summarizer};
pub use types::*;
