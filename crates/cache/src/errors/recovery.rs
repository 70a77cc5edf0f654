//! Recovery and classification utilities for cache errors

use super::types::{CacheError, RecoveryHint};

impl CacheError {
    /// Get the recovery hint for this error
    #[must_use]
    pub fn recovery_hint(&self) -> RecoveryHint {
        match self {
            Self::Storage { recovery_hint, .. }
            | Self::Configuration { recovery_hint, .. }
            | Self::InvalidKey { recovery_hint, .. }
            | Self::Serialization { recovery_hint, .. } => recovery_hint.clone(),
            Self::Recompute { .. } => RecoveryHint::Manual {
                instructions: "Inspect the wrapped operation's error".to_string(),
            },
            Self::Aborted { .. } => RecoveryHint::Retry {
                after: std::time::Duration::ZERO,
            },
        }
    }

    /// Check if this error is transient and can be retried
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self.recovery_hint(),
            RecoveryHint::Retry { .. } | RecoveryHint::CheckBackend { .. }
        )
    }

    /// True when the storage layer failed, not the wrapped computation
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    /// True when the caller-supplied computation failed
    #[must_use]
    pub const fn is_recompute(&self) -> bool {
        matches!(self, Self::Recompute { .. })
    }

    /// True for errors raised at the call site before any work happened
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::InvalidKey { .. })
    }
}
