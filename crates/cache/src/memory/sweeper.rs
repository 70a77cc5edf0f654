//! Optional background expiry sweeper

use super::InMemoryCache;
use crate::errors::{CacheError, Result};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Owns the sweeper task; aborting on drop
#[derive(Debug)]
pub struct SweeperHandle {
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl InMemoryCache {
    /// Start purging expired entries every `interval`
    ///
    /// Returns `Ok(None)` for a zero interval. Must be called from within a
    /// tokio runtime.
    pub fn spawn_sweeper(&self, interval: Duration) -> Result<Option<SweeperHandle>> {
        if interval.is_zero() {
            return Ok(None);
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            CacheError::configuration(format!("expiry sweeper needs a tokio runtime: {e}"))
        })?;

        // Weak so the sweeper never keeps a dropped cache alive
        let store = std::sync::Arc::downgrade(&self.inner);
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                let purged = store.write().purge_expired(Instant::now());
                if purged > 0 {
                    tracing::debug!(purged, "Expiry sweeper removed entries");
                }
            }
        });

        tracing::info!(interval = ?interval, "Started cache expiry sweeper");
        Ok(Some(SweeperHandle { handle }))
    }
}
