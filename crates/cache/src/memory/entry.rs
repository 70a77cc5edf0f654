//! In-memory cache entry

use bytes::Bytes;
use std::time::Duration;
use tokio::time::Instant;

/// Stored value plus its expiry and tag membership
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    pub value: Bytes,
    /// `None` means the entry never expires
    pub expires_at: Option<Instant>,
    pub tags: Vec<String>,
}

impl MemoryEntry {
    /// A TTL reaching past the clock's range is treated as no expiry
    pub fn new(value: Bytes, ttl: Option<Duration>, tags: Vec<String>, now: Instant) -> Self {
        Self {
            value,
            expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
            tags,
        }
    }

    /// An entry is dead from its expiry instant onwards
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}
