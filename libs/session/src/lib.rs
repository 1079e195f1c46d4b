//! Thread cache: remembers which Slack thread announces each order.
//!
//! Entries are populated after a successful history search and live for the
//! lifetime of the process.
mod memory;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemoryThreadCache;

/// Shared cache handle used across the pipeline.
pub type SharedThreadCache = Arc<dyn ThreadCache>;

#[async_trait]
pub trait ThreadCache: Send + Sync {
    /// Thread id recorded for `order_number`, if any.
    async fn get(&self, order_number: &str) -> Result<Option<String>>;
    /// Records (or replaces) the thread id for `order_number`.
    async fn set(&self, order_number: &str, thread_ts: &str) -> Result<()>;
}

/// Returns an in-memory thread cache wrapped in an [`Arc`].
pub fn shared_memory_cache() -> SharedThreadCache {
    Arc::new(MemoryThreadCache::new())
}
