//! Cache key validation and generation

use crate::errors::{CacheError, Result, SerializationOp};
use serde::Serialize;

/// Separator between key segments
pub const KEY_SEPARATOR: &str = ":";

/// Validate that `key` can be used with any provider
pub fn validate_key(key: &str, max_len: usize) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::invalid_key(key, "Key cannot be empty"));
    }

    if key.len() > max_len {
        let shown: String = key.chars().take(50).collect();
        return Err(CacheError::invalid_key(
            format!("{shown}..."),
            format!("Key exceeds maximum length of {max_len} bytes"),
        ));
    }

    if key.contains('\0') {
        return Err(CacheError::invalid_key(key, "Key contains null bytes"));
    }

    Ok(())
}

/// Builds `prefix:owner:method:args` style keys for call-site caching
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    prefix: Option<String>,
    owner: String,
    method: String,
}

impl CacheKeyBuilder {
    pub fn new(owner: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            prefix: None,
            owner: owner.into(),
            method: method.into(),
        }
    }

    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    /// `owner:method`, used to label errors of uncached calls
    pub fn qualified_name(&self) -> String {
        format!("{}{KEY_SEPARATOR}{}", self.owner, self.method)
    }

    /// Key with a caller-computed argument segment
    pub fn build(&self, argument_part: &str) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(4);
        if let Some(prefix) = &self.prefix {
            parts.push(prefix);
        }
        parts.push(&self.owner);
        parts.push(&self.method);
        parts.push(argument_part);
        parts.join(KEY_SEPARATOR)
    }

    /// Key whose argument segment is the JSON form of `args`
    pub fn build_from_args<A: Serialize + ?Sized>(&self, args: &A) -> Result<String> {
        let argument_part = serde_json::to_string(args).map_err(|e| {
            CacheError::serialization(self.qualified_name(), SerializationOp::Encode, e)
        })?;
        Ok(self.build(&argument_part))
    }
}
