//! Shared fixtures for cache integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use coalesce_cache::errors::StorageOp;
use coalesce_cache::{CacheError, CacheProvider, InMemoryCache, Result, SetOptions};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory provider whose operations can be made to fail on demand
#[derive(Debug, Clone, Default)]
pub struct FlakyProvider {
    pub store: InMemoryCache,
    state: Arc<FlakyState>,
}

#[derive(Debug, Default)]
struct FlakyState {
    fail_get: AtomicBool,
    fail_set: AtomicBool,
    fail_tags: AtomicBool,
    fail_del: Mutex<HashSet<String>>,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl FlakyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_get(&self, fail: bool) {
        self.state.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_set(&self, fail: bool) {
        self.state.fail_set.store(fail, Ordering::SeqCst);
    }

    pub fn fail_tags(&self, fail: bool) {
        self.state.fail_tags.store(fail, Ordering::SeqCst);
    }

    pub fn fail_del_for(&self, key: &str) {
        self.state.fail_del.lock().insert(key.to_string());
    }

    pub fn gets(&self) -> usize {
        self.state.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.state.sets.load(Ordering::SeqCst)
    }
}

fn outage(op: StorageOp, key: &str) -> CacheError {
    CacheError::storage(op, key, "backend unavailable")
}

#[async_trait]
impl CacheProvider for FlakyProvider {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.state.gets.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_get.load(Ordering::SeqCst) {
            return Err(outage(StorageOp::Get, key));
        }
        self.store.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes, options: SetOptions) -> Result<()> {
        self.state.sets.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_set.load(Ordering::SeqCst) {
            return Err(outage(StorageOp::Set, key));
        }
        self.store.set(key, value, options).await
    }

    async fn del(&self, key: &str) -> Result<()> {
        if self.state.fail_del.lock().contains(key) {
            return Err(outage(StorageOp::Delete, key));
        }
        self.store.del(key).await
    }

    async fn has(&self, key: &str) -> Result<bool> {
        self.store.has(key).await
    }

    async fn get_keys_by_tag(&self, tags: &[String]) -> Result<Vec<String>> {
        if self.state.fail_tags.load(Ordering::SeqCst) {
            return Err(outage(StorageOp::KeysByTag, ""));
        }
        self.store.get_keys_by_tag(tags).await
    }
}

pub fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
