pub mod elastic;
pub mod memory;

pub use elastic::ElasticBackend;
pub use memory::{MemoryBackend, RecordedRequest};
