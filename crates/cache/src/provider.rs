//! Storage contract for cache backends
//!
//! A provider is pure storage: it knows nothing about coalescing or
//! recomputation. Values cross this boundary as opaque bytes so that a
//! provider may live out of process. Every method may suspend.

use crate::errors::Result;
use crate::options::SetOptions;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;
use std::sync::Arc;

/// Pluggable storage backend used by `CacheService`
#[async_trait]
pub trait CacheProvider: Send + Sync + Debug {
    /// Get a live value
    ///
    /// Returns `Ok(None)` if the key doesn't exist or has expired. A missing
    /// key is never an error.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Store or overwrite a value
    ///
    /// `options.tags` replace whatever tags the key carried before.
    async fn set(&self, key: &str, value: Bytes, options: SetOptions) -> Result<()>;

    /// Remove a value and every tag reference to it; no-op when absent
    async fn del(&self, key: &str) -> Result<()>;

    /// True iff `get` would return a value
    async fn has(&self, key: &str) -> Result<bool>;

    /// Union of the keys carrying any of `tags`, without duplicates
    async fn get_keys_by_tag(&self, tags: &[String]) -> Result<Vec<String>>;
}

#[async_trait]
impl<P> CacheProvider for Arc<P>
where
    P: CacheProvider + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Bytes, options: SetOptions) -> Result<()> {
        (**self).set(key, value, options).await
    }

    async fn del(&self, key: &str) -> Result<()> {
        (**self).del(key).await
    }

    async fn has(&self, key: &str) -> Result<bool> {
        (**self).has(key).await
    }

    async fn get_keys_by_tag(&self, tags: &[String]) -> Result<Vec<String>> {
        (**self).get_keys_by_tag(tags).await
    }
}
