//! Per-key result cache shared by concurrent view loads.
//!
//! Keys are an operation name plus its parameters. The last successful
//! fetch for a key wins; errors are never stored. Entries live until the
//! owner calls [`QueryCache::clear`], which the explorer does on every view
//! change.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::Result;

/// `op(param1,param2,...)`
pub fn cache_key(op: &str, params: &[&dyn std::fmt::Display]) -> String {
    let joined: Vec<String> = params.iter().map(|p| p.to_string()).collect();
    format!("{op}({})", joined.join(","))
}

#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        entries.get(key).and_then(|v| v.downcast_ref::<T>()).cloned()
    }

    pub async fn insert<T: Send + Sync + 'static>(&self, key: String, value: T) {
        self.entries.write().await.insert(key, Arc::new(value));
    }

    /// Cached value for `key`, or the result of `fetch` stored under it.
    ///
    /// The lock is not held while `fetch` runs, so two concurrent misses
    /// both fetch and the later one overwrites the earlier.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: String, fetch: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.get::<T>(&key).await {
            log::debug!("cache hit {key}");
            return Ok(hit);
        }
        let value = fetch().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
