//! Cache-aside layer with request coalescing and tag invalidation
//!
//! This crate provides:
//! - A pluggable async storage contract ([`CacheProvider`])
//! - A process-local reference provider with TTL and tag indexing ([`InMemoryCache`])
//! - A single-flight orchestrator around expensive recomputation ([`CacheService`])
//! - Call-site caching for async functions ([`CachedFn`])
//!
//! ```no_run
//! use coalesce_cache::{CacheConfigLoader, CacheOptions, CacheService};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! coalesce_utils::tracing::init()?;
//!
//! let service = CacheService::in_memory(CacheConfigLoader::load()?)?;
//! let summary: String = service
//!     .with_cache(
//!         "reports:daily",
//!         || async { Ok::<_, std::io::Error>("42 orders".to_string()) },
//!         CacheOptions::new().with_tags(["reports"]),
//!     )
//!     .await?;
//! # let _ = summary;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod keys;
pub mod memoize;
pub mod memory;
pub mod mode;
pub mod options;
pub mod provider;
pub mod service;

pub use config::{CacheConfig, CacheConfigBuilder, CacheConfigLoader, ConfigSource};
pub use errors::{CacheError, RecoveryHint, Result};
pub use keys::{validate_key, CacheKeyBuilder};
pub use memoize::CachedFn;
pub use memory::{InMemoryCache, SweeperHandle};
pub use mode::CacheMode;
pub use options::{CacheOptions, SetOptions};
pub use provider::CacheProvider;
pub use service::{CacheService, CacheStatistics, InvalidationReport};
