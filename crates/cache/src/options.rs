//! Per-call options for providers and the service

use crate::errors::{CacheError, Result};
use std::time::Duration;

/// Options accepted by `CacheProvider::set`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Entry is treated as absent once this much time has passed
    pub ttl: Option<Duration>,
    /// Invalidation groups; replaces any previous membership of the key
    pub tags: Vec<String>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
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

    /// Reject options that would silently misbehave
    pub fn validate(&self) -> Result<()> {
        validate_ttl(self.ttl)?;
        validate_tags(&self.tags)
    }
}

/// Options accepted by `CacheService::with_cache`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheOptions {
    pub ttl: Option<Duration>,
    pub tags: Vec<String>,
    /// Skip both the in-flight table and the provider read
    pub force_refresh: bool,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
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

    pub fn force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_ttl(self.ttl)?;
        validate_tags(&self.tags)
    }

    /// Options handed to the provider, falling back to `default_ttl`
    pub(crate) fn to_set_options(&self, default_ttl: Option<Duration>) -> SetOptions {
        SetOptions {
            ttl: self.ttl.or(default_ttl),
            tags: self.tags.clone(),
        }
    }
}

fn validate_ttl(ttl: Option<Duration>) -> Result<()> {
    match ttl {
        Some(ttl) if ttl.is_zero() => Err(CacheError::configuration(
            "ttl must be greater than zero; omit it for entries that never expire",
        )),
        _ => Ok(()),
    }
}

fn validate_tags(tags: &[String]) -> Result<()> {
    match tags.iter().find(|tag| tag.is_empty()) {
        Some(_) => Err(CacheError::configuration("tags must not be empty strings")),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ttl_rejected() {
        let options = CacheOptions::new().with_ttl(Duration::ZERO);
        let err = options.validate().unwrap_err();
        assert!(err.is_configuration());

        let options = SetOptions::new().with_ttl(Duration::ZERO);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_empty_tag_rejected() {
        let options = CacheOptions::new().with_tags(["projects", ""]);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_default_ttl_fallback() {
        let default_ttl = Some(Duration::from_secs(30));

        let options = CacheOptions::new().with_tags(["a"]);
        let set = options.to_set_options(default_ttl);
        assert_eq!(set.ttl, default_ttl);
        assert_eq!(set.tags, vec!["a".to_string()]);

        let options = CacheOptions::new().with_ttl(Duration::from_secs(5));
        let set = options.to_set_options(default_ttl);
        assert_eq!(set.ttl, Some(Duration::from_secs(5)));
    }
}
