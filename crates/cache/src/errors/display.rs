//! Display implementations for cache errors

use super::types::{CacheError, SerializationOp, StorageOp};
use std::fmt;

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recompute { key, source } => {
                write!(f, "Recomputation for cache key '{key}' failed: {source}")
            }
            Self::Storage {
                operation,
                key,
                reason,
                ..
            } => {
                if key.is_empty() {
                    write!(f, "Cache storage {operation} failed: {reason}")
                } else {
                    write!(f, "Cache storage {operation} failed for key '{key}': {reason}")
                }
            }
            Self::Configuration { message, .. } => {
                write!(f, "Cache configuration error: {message}")
            }
            Self::InvalidKey { key, reason, .. } => {
                write!(f, "Invalid cache key '{key}': {reason}")
            }
            Self::Serialization {
                key,
                operation,
                source,
                ..
            } => write!(f, "Failed to {operation} cache entry '{key}': {source}"),
            Self::Aborted { key, reason } => {
                write!(f, "Computation for cache key '{key}' aborted: {reason}")
            }
        }
    }
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Delete => "delete",
            Self::Has => "has",
            Self::KeysByTag => "keys-by-tag",
        };
        f.write_str(op)
    }
}

impl fmt::Display for SerializationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => f.write_str("encode"),
            Self::Decode => f.write_str("decode"),
        }
    }
}
