//! Call-site caching for async functions
//!
//! [`CachedFn`] wraps an async function and routes every call through
//! [`CacheService::with_cache`] under a key derived from an owner name, a
//! method name and the call arguments.

use crate::errors::Result;
use crate::keys::CacheKeyBuilder;
use crate::options::CacheOptions;
use crate::service::CacheService;
use crate::errors::CacheError;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

type KeyGenerator<A> = Arc<dyn Fn(&A) -> String + Send + Sync>;

/// An async function whose results are cached per argument value
pub struct CachedFn<A, T, F> {
    service: CacheService,
    keys: CacheKeyBuilder,
    key_generator: Option<KeyGenerator<A>>,
    ttl: Option<Duration>,
    tags: Vec<String>,
    func: F,
    _marker: PhantomData<fn(A) -> T>,
}

impl<A, T, F> CachedFn<A, T, F> {
    /// Wrap `func`; keys take the form `[prefix:]owner:method:args`
    pub fn new(
        service: CacheService,
        owner: impl Into<String>,
        method: impl Into<String>,
        func: F,
    ) -> Self {
        let keys = CacheKeyBuilder::new(owner, method)
            .with_prefix(service.config().key_prefix.clone());
        Self {
            service,
            keys,
            key_generator: None,
            ttl: None,
            tags: Vec::new(),
            func,
            _marker: PhantomData,
        }
    }

    /// Derive the argument segment of the key from `generator` instead of JSON
    pub fn with_key_generator<G>(mut self, generator: G) -> Self
    where
        G: Fn(&A) -> String + Send + Sync + 'static,
    {
        self.key_generator = Some(Arc::new(generator));
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Cache key used for `args`
    pub fn key_for(&self, args: &A) -> Result<String>
    where
        A: Serialize,
    {
        match &self.key_generator {
            Some(generator) => Ok(self.keys.build(&generator(args))),
            None => self.keys.build_from_args(args),
        }
    }
}

impl<A, T, F> CachedFn<A, T, F>
where
    A: Serialize + Clone + Send + 'static,
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Call through the cache
    ///
    /// Failures of the wrapped function are returned as-is. When no usable key
    /// can be derived, or the cache rejects it before running anything, the
    /// failure is logged and the function is called directly instead.
    pub async fn call<Fut, E>(&self, args: A) -> Result<T>
    where
        F: Fn(A) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
    {
        let key = match self.key_for(&args) {
            Ok(key) => key,
            Err(error) => {
                tracing::warn!(error = %error, "Could not derive cache key; calling uncached");
                return self.call_uncached(args).await;
            }
        };

        let options = CacheOptions {
            ttl: self.ttl,
            tags: self.tags.clone(),
            force_refresh: false,
        };
        let func = self.func.clone();
        let fallback_args = args.clone();

        match self.service.with_cache(&key, move || func(args), options).await {
            Err(error) if error.is_configuration() => {
                tracing::warn!(key = %key, error = %error, "Cache error; calling uncached");
                self.call_uncached(fallback_args).await
            }
            result => result,
        }
    }

    async fn call_uncached<Fut, E>(&self, args: A) -> Result<T>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        (self.func)(args)
            .await
            .map_err(|error| CacheError::recompute(self.keys.qualified_name(), error))
    }
}
