//! Process-local reference provider
//!
//! Keeps a key -> entry map and an inverted tag index behind one lock so a
//! write touches both atomically. Expired entries are purged lazily on read;
//! a background sweeper is available but never started implicitly.

mod entry;
mod index;
mod sweeper;

pub use entry::MemoryEntry;
pub use sweeper::SweeperHandle;

use crate::errors::Result;
use crate::options::SetOptions;
use crate::provider::CacheProvider;
use async_trait::async_trait;
use bytes::Bytes;
use index::TagIndex;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;

/// In-memory `CacheProvider`
#[derive(Clone, Default)]
pub struct InMemoryCache {
    pub(crate) inner: Arc<RwLock<MemoryStore>>,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    entries: HashMap<String, MemoryEntry>,
    tags: TagIndex,
}

impl MemoryStore {
    fn insert(&mut self, key: &str, entry: MemoryEntry) {
        if let Some(previous) = self.entries.get(key) {
            for tag in &previous.tags {
                self.tags.remove(tag, key);
            }
        }
        for tag in &entry.tags {
            self.tags.add(tag, key);
        }
        self.entries.insert(key.to_string(), entry);
    }

    fn remove(&mut self, key: &str) -> Option<MemoryEntry> {
        let entry = self.entries.remove(key)?;
        for tag in &entry.tags {
            self.tags.remove(tag, key);
        }
        Some(entry)
    }

    fn is_live(&self, key: &str, now: Instant) -> Option<bool> {
        self.entries.get(key).map(|entry| !entry.is_expired_at(now))
    }

    pub(crate) fn purge_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live value, deleting it first if it has expired
    fn read_live(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        let store = self.inner.upgradable_read();
        match store.entries.get(key) {
            None => None,
            Some(entry) if !entry.is_expired_at(now) => Some(entry.value.clone()),
            Some(_) => {
                let mut store = RwLockUpgradableReadGuard::upgrade(store);
                store.remove(key);
                tracing::trace!(key, "Purged expired entry on read");
                None
            }
        }
    }

    /// Number of stored entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Drop every entry and tag
    pub fn clear(&self) {
        let mut store = self.inner.write();
        store.entries.clear();
        store.tags.clear();
    }

    /// Eagerly remove expired entries; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        self.inner.write().purge_expired(Instant::now())
    }

    /// Snapshot of the tag index as `(tag, sorted keys)`
    pub fn tags(&self) -> Vec<(String, Vec<String>)> {
        let store = self.inner.read();
        let mut tags: Vec<(String, Vec<String>)> = store
            .tags
            .tags()
            .map(|(tag, keys)| {
                let mut keys: Vec<String> = keys.iter().cloned().collect();
                keys.sort();
                (tag.clone(), keys)
            })
            .collect();
        tags.sort();
        tags
    }

    /// Check both directions of the entry/tag-index correspondence
    pub fn tag_index_consistent(&self) -> bool {
        let store = self.inner.read();
        let forward = store.entries.iter().all(|(key, entry)| {
            entry.tags.iter().all(|tag| store.tags.contains(tag, key))
        });
        let backward = store.tags.tags().all(|(tag, keys)| {
            !keys.is_empty()
                && keys.iter().all(|key| {
                    store
                        .entries
                        .get(key)
                        .is_some_and(|entry| entry.tags.contains(tag))
                })
        });
        forward && backward
    }
}

impl std::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let store = self.inner.read();
        f.debug_struct("InMemoryCache")
            .field("entry_count", &store.entries.len())
            .field("tag_count", &store.tags.len())
            .finish()
    }
}

#[async_trait]
impl CacheProvider for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.read_live(key))
    }

    async fn set(&self, key: &str, value: Bytes, options: SetOptions) -> Result<()> {
        options.validate()?;
        let SetOptions { ttl, mut tags } = options;
        tags.sort();
        tags.dedup();

        let entry = MemoryEntry::new(value, ttl, tags, Instant::now());
        self.inner.write().insert(key, entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.inner.write().remove(key);
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        let live = self.inner.read().is_live(key, now);
        match live {
            Some(true) => Ok(true),
            Some(false) => Ok(self.read_live(key).is_some()),
            None => Ok(false),
        }
    }

    async fn get_keys_by_tag(&self, tags: &[String]) -> Result<Vec<String>> {
        Ok(self.inner.read().tags.keys_for(tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tagged(tags: &[&str]) -> SetOptions {
        SetOptions::new().with_tags(tags.iter().copied())
    }

    fn sorted(mut keys: Vec<String>) -> Vec<String> {
        keys.sort();
        keys
    }

    #[tokio::test]
    async fn test_basic_operations() -> Result<()> {
        let cache = InMemoryCache::new();

        assert_eq!(cache.get("missing").await?, None);
        assert!(!cache.has("missing").await?);

        cache
            .set("key1", Bytes::from_static(b"value1"), SetOptions::new())
            .await?;
        assert_eq!(cache.get("key1").await?, Some(Bytes::from_static(b"value1")));
        assert!(cache.has("key1").await?);

        cache.del("key1").await?;
        assert_eq!(cache.get("key1").await?, None);

        // deleting again is a no-op
        cache.del("key1").await?;
        assert!(cache.is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_cleans_tag_index() -> Result<()> {
        let cache = InMemoryCache::new();
        let options = tagged(&["projects"]).with_ttl(Duration::from_secs(10));
        cache.set("p:1", Bytes::from_static(b"v"), options).await?;

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.has("p:1").await?);
        assert_eq!(cache.get("p:1").await?, Some(Bytes::from_static(b"v")));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("p:1").await?, None);
        assert!(cache
            .get_keys_by_tag(&["projects".to_string()])
            .await?
            .is_empty());
        assert!(cache.tag_index_consistent());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_has_purges_expired() -> Result<()> {
        let cache = InMemoryCache::new();
        let options = tagged(&["a"]).with_ttl(Duration::from_millis(50));
        cache.set("k", Bytes::from_static(b"v"), options).await?;

        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(!cache.has("k").await?);
        assert_eq!(cache.len(), 0);
        assert!(cache.tags().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_retagging_replaces_membership() -> Result<()> {
        let cache = InMemoryCache::new();
        cache.set("k", Bytes::from_static(b"v1"), tagged(&["a"])).await?;
        cache.set("k", Bytes::from_static(b"v2"), tagged(&["b"])).await?;

        assert!(cache.get_keys_by_tag(&["a".to_string()]).await?.is_empty());
        assert_eq!(cache.get_keys_by_tag(&["b".to_string()]).await?, vec!["k"]);
        assert_eq!(cache.get("k").await?, Some(Bytes::from_static(b"v2")));
        assert!(cache.tag_index_consistent());
        Ok(())
    }

    #[tokio::test]
    async fn test_overwrite_without_tags_drops_membership() -> Result<()> {
        let cache = InMemoryCache::new();
        cache.set("k", Bytes::from_static(b"v1"), tagged(&["a"])).await?;
        cache.set("k", Bytes::from_static(b"v2"), SetOptions::new()).await?;

        assert!(cache.get_keys_by_tag(&["a".to_string()]).await?.is_empty());
        assert!(cache.tags().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_keys_by_tag_union() -> Result<()> {
        let cache = InMemoryCache::new();
        cache.set("k1", Bytes::from_static(b"1"), tagged(&["a"])).await?;
        cache.set("k2", Bytes::from_static(b"2"), tagged(&["a", "b"])).await?;
        cache.set("k3", Bytes::from_static(b"3"), tagged(&["c"])).await?;

        let keys = cache
            .get_keys_by_tag(&["a".to_string(), "b".to_string()])
            .await?;
        assert_eq!(sorted(keys), vec!["k1", "k2"]);

        cache.del("k2").await?;
        assert!(cache.get_keys_by_tag(&["b".to_string()]).await?.is_empty());
        assert_eq!(
            cache.tags(),
            vec![
                ("a".to_string(), vec!["k1".to_string()]),
                ("c".to_string(), vec!["k3".to_string()]),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_tags_collapse() -> Result<()> {
        let cache = InMemoryCache::new();
        cache.set("k", Bytes::from_static(b"v"), tagged(&["a", "a"])).await?;
        cache.del("k").await?;
        assert!(cache.tags().is_empty());
        assert!(cache.tag_index_consistent());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() -> Result<()> {
        let cache = InMemoryCache::new();
        let short = tagged(&["t"]).with_ttl(Duration::from_secs(1));
        cache.set("short", Bytes::from_static(b"s"), short).await?;
        cache.set("long", Bytes::from_static(b"l"), tagged(&["t"])).await?;

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_keys_by_tag(&["t".to_string()]).await?, vec!["long"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_rejects_zero_ttl() {
        let cache = InMemoryCache::new();
        let result = cache
            .set("k", Bytes::new(), SetOptions::new().with_ttl(Duration::ZERO))
            .await;
        assert!(result.unwrap_err().is_configuration());
        assert!(cache.is_empty());
    }
}
