use std::{collections::HashMap, sync::Arc};

use log::trace;
use tokio::sync::RwLock;

/// A cache of serialized values, keyed by namespaced strings such as `dishCache::{category_id}`.
///
/// Invalidation is prefix-based: a catalog write deletes every key under its namespace, so the
/// next read repopulates from the database.
#[allow(async_fn_in_trait)]
pub trait CacheStore: Clone + Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    async fn put(&self, key: &str, value: Vec<u8>);

    /// Removes every entry whose key starts with `prefix`. Returns the number of entries removed.
    async fn delete_prefix(&self, prefix: &str) -> usize;
}

/// An in-process [`CacheStore`] over a shared hash map. Clones share the same storage.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().await.get(key).cloned()
    }

    async fn put(&self, key: &str, value: Vec<u8>) {
        self.entries.write().await.insert(key.to_string(), value);
    }

    async fn delete_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        let removed = before - entries.len();
        if removed > 0 {
            trace!("🗃️ Evicted {removed} cache entries under '{prefix}'");
        }
        removed
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn prefix_eviction_is_namespace_scoped() {
        let cache = MemoryCache::new();
        cache.put("dishCache::1", b"a".to_vec()).await;
        cache.put("dishCache::2", b"b".to_vec()).await;
        cache.put("setmealCache::1", b"c".to_vec()).await;
        let removed = cache.delete_prefix("dishCache::").await;
        assert_eq!(removed, 2);
        assert!(cache.get("dishCache::1").await.is_none());
        assert_eq!(cache.get("setmealCache::1").await, Some(b"c".to_vec()));
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let cache = MemoryCache::new();
        let other = cache.clone();
        cache.put("k", b"v".to_vec()).await;
        assert_eq!(other.get("k").await, Some(b"v".to_vec()));
    }
}
