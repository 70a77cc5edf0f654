//! Core error types for the cache layer

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Shared, clonable error source.
///
/// Errors produced by a single computation are handed to every caller that
/// coalesced on it, so sources are reference counted rather than boxed.
pub type SharedSource = Arc<dyn StdError + Send + Sync>;

/// Error type for cache operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The caller-supplied recomputation failed
    Recompute {
        key: String,
        #[source]
        source: SharedSource,
    },

    /// A storage provider call failed
    Storage {
        operation: StorageOp,
        key: String,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// Invalid options or configuration
    Configuration {
        message: String,
        recovery_hint: RecoveryHint,
    },

    /// Invalid cache key
    InvalidKey {
        key: String,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// A value could not cross the byte boundary used by providers
    Serialization {
        key: String,
        operation: SerializationOp,
        #[source]
        source: SharedSource,
        recovery_hint: RecoveryHint,
    },

    /// The computation panicked before producing a value
    Aborted { key: String, reason: String },
}

/// Recovery hints for error handling
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryHint {
    /// Retry the operation
    Retry { after: Duration },

    /// Serve without the cache; recompute directly
    UseFallback,

    /// Fix the configuration or call-site options
    UpdateConfiguration,

    /// Verify the storage backend is reachable
    CheckBackend { backend: String },

    /// No automated recovery possible
    Manual { instructions: String },

    /// Operation can be safely ignored
    Ignore,
}

/// Provider operations, used to label storage failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Get,
    Set,
    Delete,
    Has,
    KeysByTag,
}

/// Serialization operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationOp {
    Encode,
    Decode,
}
