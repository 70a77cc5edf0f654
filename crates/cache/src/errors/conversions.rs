//! Error constructors and conversion utilities

use super::types::{CacheError, RecoveryHint, SerializationOp, StorageOp};
use std::sync::Arc;

impl CacheError {
    /// Create a storage error for a provider operation
    #[must_use]
    pub fn storage(operation: StorageOp, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Storage {
            operation,
            key: key.into(),
            reason: reason.into(),
            recovery_hint: RecoveryHint::CheckBackend {
                backend: "cache provider".to_string(),
            },
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            recovery_hint: RecoveryHint::UpdateConfiguration,
        }
    }

    /// Create an invalid key error
    #[must_use]
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Use a non-empty key without NUL bytes".to_string(),
            },
        }
    }

    /// Wrap a failure of the caller-supplied computation
    pub fn recompute(
        key: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Recompute {
            key: key.into(),
            source: Arc::from(source.into()),
        }
    }

    /// Wrap a serde failure for the given key
    pub fn serialization(
        key: impl Into<String>,
        operation: SerializationOp,
        source: serde_json::Error,
    ) -> Self {
        Self::Serialization {
            key: key.into(),
            operation,
            source: Arc::new(source),
            recovery_hint: RecoveryHint::UseFallback,
        }
    }
}

/// Convert serde_json errors to cache errors
impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(String::new(), SerializationOp::Decode, error)
    }
}

/// Configuration files are the only I/O this crate performs
impl From<std::io::Error> for CacheError {
    fn from(error: std::io::Error) -> Self {
        Self::Configuration {
            message: format!("I/O error: {error}"),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Check that the config file is readable".to_string(),
            },
        }
    }
}
