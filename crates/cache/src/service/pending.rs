//! In-flight computation table for request coalescing
//!
//! Each key maps to at most one shared computation. The caller that inserts
//! an entry (the leader) holds a [`PendingGuard`]; dropping the guard removes
//! the entry whether the computation succeeded, failed, or the leader's
//! future was cancelled. Entries carry a generation id so an older guard can
//! never remove a newer entry installed by `force_refresh`.

use crate::errors::Result;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A recomputation every coalesced caller can await
pub(crate) type SharedComputation = Shared<BoxFuture<'static, Result<Computed>>>;

/// Value produced by one recomputation
///
/// Callers get the value itself back. `encoded` is what was handed to the
/// provider, if anything, and lets a caller expecting a different type
/// for the same key still read it.
#[derive(Clone)]
pub(crate) struct Computed {
    value: Arc<dyn Any + Send + Sync>,
    encoded: Option<Bytes>,
}

impl Computed {
    pub fn new<T: Any + Send + Sync>(value: T, encoded: Option<Bytes>) -> Self {
        Self {
            value: Arc::new(value),
            encoded,
        }
    }

    pub fn value<T: Any>(&self) -> Option<&T> {
        (*self.value).downcast_ref::<T>()
    }

    pub fn encoded(&self) -> Option<&Bytes> {
        self.encoded.as_ref()
    }
}

struct PendingEntry {
    generation: u64,
    computation: SharedComputation,
}

#[derive(Default)]
pub(crate) struct PendingTable {
    entries: Arc<DashMap<String, PendingEntry>>,
    next_generation: AtomicU64,
}

/// Outcome of trying to register a computation
pub(crate) enum Slot {
    /// This caller registered the computation and must drive it
    Leader {
        computation: SharedComputation,
        guard: PendingGuard,
    },
    /// Another caller's computation is already in flight
    Follower(SharedComputation),
}

impl PendingTable {
    /// In-flight computation for `key`, if any
    pub fn get(&self, key: &str) -> Option<SharedComputation> {
        self.entries
            .get(key)
            .map(|entry| entry.computation.clone())
    }

    /// Register `computation` for `key`
    ///
    /// Without `replace`, an existing entry wins and the caller becomes a
    /// follower; check and insert happen under one shard lock.
    pub fn register(&self, key: &str, computation: SharedComputation, replace: bool) -> Slot {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let entry = PendingEntry {
            generation,
            computation: computation.clone(),
        };

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) if !replace => {
                return Slot::Follower(occupied.get().computation.clone());
            }
            Entry::Occupied(mut occupied) => {
                occupied.insert(entry);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
            }
        }

        Slot::Leader {
            computation,
            guard: PendingGuard {
                entries: Arc::clone(&self.entries),
                key: key.to_string(),
                generation,
            },
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for PendingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTable")
            .field("in_flight", &self.entries.len())
            .finish()
    }
}

/// Removes the leader's pending entry when dropped
pub(crate) struct PendingGuard {
    entries: Arc<DashMap<String, PendingEntry>>,
    key: String,
    generation: u64,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let generation = self.generation;
        self.entries
            .remove_if(&self.key, |_, entry| entry.generation == generation);
    }
}
