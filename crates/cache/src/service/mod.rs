//! Cache-aside orchestration with request coalescing
//!
//! `CacheService` wraps a [`CacheProvider`] and adds what a raw provider
//! cannot: concurrent `with_cache` calls for the same key share a single
//! recomputation, and storage failures degrade to recomputing instead of
//! failing the caller.
//!
//! Coalescing is scoped to one process. Several services in front of a shared
//! external provider may each recompute the same key.

mod invalidation;
mod pending;
mod stats;

pub use invalidation::InvalidationReport;
pub use stats::CacheStatistics;

use crate::config::CacheConfig;
use crate::errors::{CacheError, Result, SerializationOp};
use crate::keys::validate_key;
use crate::memory::{InMemoryCache, SweeperHandle};
use crate::options::{CacheOptions, SetOptions};
use crate::provider::CacheProvider;
use bytes::Bytes;
use futures::FutureExt;
use pending::{Computed, PendingTable, SharedComputation, Slot};
use serde::{de::DeserializeOwned, Serialize};
use stats::ServiceStats;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Single-flight cache-aside front end over a `CacheProvider`
///
/// Cloning is cheap; clones share the provider, the pending table and the
/// statistics. Construct one per process and pass it to whatever needs it.
#[derive(Clone)]
pub struct CacheService {
    pub(crate) inner: Arc<ServiceInner>,
}

pub(crate) struct ServiceInner {
    pub provider: Arc<dyn CacheProvider>,
    pub config: CacheConfig,
    pending: PendingTable,
    pub stats: ServiceStats,
    _sweeper: Option<SweeperHandle>,
}

impl CacheService {
    /// Service over `provider` with default configuration
    pub fn new<P: CacheProvider + 'static>(provider: P) -> Self {
        Self::from_parts(Arc::new(provider), CacheConfig::default(), None)
    }

    /// Service over `provider` with an explicit configuration
    pub fn with_config<P: CacheProvider + 'static>(provider: P, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(Arc::new(provider), config, None))
    }

    /// Service over a fresh `InMemoryCache`
    ///
    /// Starts the expiry sweeper when `config.cleanup_interval` is non-zero,
    /// which requires a tokio runtime. The sweeper stops when the last clone
    /// of the service is dropped.
    pub fn in_memory(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let cache = InMemoryCache::new();
        let sweeper = cache.spawn_sweeper(config.cleanup_interval)?;
        Ok(Self::from_parts(Arc::new(cache), config, sweeper))
    }

    fn from_parts(
        provider: Arc<dyn CacheProvider>,
        config: CacheConfig,
        sweeper: Option<SweeperHandle>,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                provider,
                config,
                pending: PendingTable::default(),
                stats: ServiceStats::default(),
                _sweeper: sweeper,
            }),
        }
    }

    pub fn provider(&self) -> &Arc<dyn CacheProvider> {
        &self.inner.provider
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// True while a recomputation for `key` is registered
    pub fn is_pending(&self, key: &str) -> bool {
        self.inner.pending.contains(key)
    }

    pub fn statistics(&self) -> CacheStatistics {
        self.inner.stats.snapshot(self.inner.pending.len())
    }

    /// Return the cached value for `key`, computing it with `recompute` on a miss
    ///
    /// Overlapping calls for the same key run `recompute` at most once and
    /// all observe its value or its error. The computed value is returned as
    /// produced; only the provider copy goes through serialization. Provider
    /// and encoding failures are logged and treated as a miss (on read) or
    /// ignored (on write). `force_refresh`
    /// skips both the in-flight table and the provider read but still stores
    /// the fresh value.
    #[tracing::instrument(skip_all, fields(key = %key, force_refresh = options.force_refresh))]
    pub async fn with_cache<T, F, Fut, E>(
        &self,
        key: &str,
        recompute: F,
        options: CacheOptions,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
    {
        validate_key(key, self.inner.config.max_key_length)?;
        options.validate()?;

        if !options.force_refresh {
            if let Some(computation) = self.inner.pending.get(key) {
                self.inner.stats.record_coalesced();
                tracing::debug!("Joining in-flight computation");
                return resolve(key, &computation.await?);
            }

            if let Some(value) = self.read_provider(key).await {
                return Ok(value);
            }
        }

        let set_options = options.to_set_options(self.inner.config.default_ttl);
        let computation = self.computation(key, recompute, set_options);

        match self.inner.pending.register(key, computation, options.force_refresh) {
            Slot::Follower(computation) => {
                self.inner.stats.record_coalesced();
                tracing::debug!("Lost registration race, joining in-flight computation");
                resolve(key, &computation.await?)
            }
            Slot::Leader { computation, guard } => {
                let outcome = computation.await;
                drop(guard);
                resolve(key, &outcome?)
            }
        }
    }

    /// Provider read that never fails the caller
    async fn read_provider<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.inner.config.mode.is_readable() {
            return None;
        }

        match self.inner.provider.get(key).await {
            Ok(Some(bytes)) => match decode::<T>(key, &bytes) {
                Ok(value) => {
                    self.inner.stats.record_hit();
                    tracing::debug!("Cache hit");
                    Some(value)
                }
                Err(error) => {
                    self.inner.stats.record_miss();
                    tracing::warn!(error = %error, "Cached value could not be decoded; recomputing");
                    None
                }
            },
            Ok(None) => {
                self.inner.stats.record_miss();
                tracing::debug!("Cache miss");
                None
            }
            Err(error) => {
                self.inner.stats.record_miss();
                self.inner.stats.record_storage_error();
                tracing::warn!(error = %error, "Cache read failed; recomputing");
                None
            }
        }
    }

    /// Build the shared recomputation for `key`; nothing runs until polled
    fn computation<T, F, Fut, E>(
        &self,
        key: &str,
        recompute: F,
        set_options: SetOptions,
    ) -> SharedComputation
    where
        T: Serialize + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let key = key.to_string();

        async move {
            inner.stats.record_recomputation();
            let value = run_recompute(&key, recompute).await.map_err(|error| {
                inner.stats.record_recompute_failure();
                error
            })?;

            if !inner.config.mode.is_writable() {
                return Ok(Computed::new(value, None));
            }

            let encoded = match serde_json::to_vec(&value) {
                Ok(bytes) => Bytes::from(bytes),
                Err(error) => {
                    inner.stats.record_storage_error();
                    let error = CacheError::serialization(&key, SerializationOp::Encode, error);
                    tracing::warn!(key = %key, error = %error, "Value cannot be cached; serving it uncached");
                    return Ok(Computed::new(value, None));
                }
            };

            if let Err(error) = inner.provider.set(&key, encoded.clone(), set_options).await {
                inner.stats.record_storage_error();
                tracing::warn!(key = %key, error = %error, "Cache write failed; serving value uncached");
            }

            Ok::<_, CacheError>(Computed::new(value, Some(encoded)))
        }
        .boxed()
        .shared()
    }
}

/// Run `recompute`, turning panics into errors so they reach every coalesced
/// caller
async fn run_recompute<T, F, Fut, E>(key: &str, recompute: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match AssertUnwindSafe(async move { recompute().await })
        .catch_unwind()
        .await
    {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(CacheError::recompute(key, error)),
        Err(panic) => Err(CacheError::Aborted {
            key: key.to_string(),
            reason: panic_message(panic.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "recompute panicked".to_string()
    }
}

/// The caller's view of a shared computation
///
/// Callers asking for the type that was computed get a clone of the value.
/// A caller expecting another type for the same key falls back to the
/// encoded copy, when there is one.
fn resolve<T: DeserializeOwned + Clone + 'static>(key: &str, computed: &Computed) -> Result<T> {
    if let Some(value) = computed.value::<T>() {
        return Ok(value.clone());
    }
    match computed.encoded() {
        Some(bytes) => decode(key, bytes),
        None => Err(CacheError::configuration(format!(
            "cache key '{key}' is shared by calls returning different types"
        ))),
    }
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| CacheError::serialization(key, SerializationOp::Decode, e))
}

impl std::fmt::Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("provider", &self.inner.provider)
            .field("mode", &self.inner.config.mode)
            .field("pending", &self.inner.pending)
            .finish()
    }
}
