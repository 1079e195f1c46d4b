use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::ThreadCache;

/// Process-local cache; never evicts.
#[derive(Default)]
pub struct MemoryThreadCache {
    by_order: DashMap<String, String>,
}

impl MemoryThreadCache {
    pub fn new() -> Self {
        Self {
            by_order: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_order.is_empty()
    }
}

#[async_trait]
impl ThreadCache for MemoryThreadCache {
    async fn get(&self, order_number: &str) -> Result<Option<String>> {
        Ok(self
            .by_order
            .get(order_number)
            .map(|entry| entry.value().clone()))
    }

    async fn set(&self, order_number: &str, thread_ts: &str) -> Result<()> {
        self.by_order
            .insert(order_number.to_string(), thread_ts.to_string());
        Ok(())
    }
}
