//! Best-effort key and tag invalidation

use super::CacheService;
use crate::errors::{CacheError, Result};
use futures::future::join_all;

/// Outcome of an invalidation pass
#[derive(Debug, Clone, Default)]
pub struct InvalidationReport {
    /// Keys whose delete call succeeded (including keys that were absent)
    pub removed: Vec<String>,
    /// Keys whose delete call failed, with the storage error
    pub failures: Vec<(String, CacheError)>,
}

impl InvalidationReport {
    pub fn attempted(&self) -> usize {
        self.removed.len() + self.failures.len()
    }

    /// True when every delete succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl CacheService {
    /// Delete every key from the provider
    ///
    /// All deletes are attempted, concurrently; a failure for one key never
    /// prevents the others.
    #[tracing::instrument(skip_all, fields(count = tracing::field::Empty))]
    pub async fn invalidate<I, S>(&self, keys: I) -> InvalidationReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        keys.sort();
        keys.dedup();
        tracing::Span::current().record("count", keys.len());

        let provider = &self.inner.provider;
        let outcomes = join_all(keys.iter().map(|key| provider.del(key))).await;

        let mut report = InvalidationReport::default();
        for (key, outcome) in keys.into_iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.removed.push(key),
                Err(error) => {
                    self.inner.stats.record_storage_error();
                    tracing::warn!(key = %key, error = %error, "Failed to invalidate cache key");
                    report.failures.push((key, error));
                }
            }
        }

        self.inner.stats.record_invalidated(report.removed.len() as u64);
        tracing::debug!(
            removed = report.removed.len(),
            failed = report.failures.len(),
            "Invalidated cache keys"
        );
        report
    }

    /// Delete every key currently carrying any of `tags`
    ///
    /// Resolution and deletion are separate provider calls: a key tagged
    /// between the two is not guaranteed to be removed. Fails only if the tag
    /// lookup itself fails.
    #[tracing::instrument(skip_all, fields(tags = ?tags))]
    pub async fn invalidate_tags(&self, tags: &[String]) -> Result<InvalidationReport> {
        if tags.is_empty() {
            return Ok(InvalidationReport::default());
        }

        let keys = match self.inner.provider.get_keys_by_tag(tags).await {
            Ok(keys) => keys,
            Err(error) => {
                self.inner.stats.record_storage_error();
                tracing::warn!(error = %error, "Failed to resolve cache tags");
                return Err(error);
            }
        };

        Ok(self.invalidate(keys).await)
    }
}
