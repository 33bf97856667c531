//! Execution engine: dispatch, result caching, in-flight deduplication.

pub mod cache;
pub mod dispatcher;
pub mod inflight;

pub use cache::{CacheStats, ResultCache};
pub use dispatcher::{Delivered, Engine};
pub use inflight::InflightMap;
