use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache mode determines whether `CacheService` reads and writes its provider
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    /// Provider is bypassed; every miss recomputes, nothing is stored
    Off,
    /// Provider is read but never written
    Read,
    /// Provider is read and written (default)
    #[default]
    ReadWrite,
    /// Provider is written but never read
    Write,
}

impl From<&str> for CacheMode {
    fn from(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "off" => CacheMode::Off,
            "read" => CacheMode::Read,
            "read-write" => CacheMode::ReadWrite,
            "write" => CacheMode::Write,
            _ => {
                tracing::warn!(
                    value,
                    "Unknown cache mode, falling back to read-write mode"
                );
                CacheMode::ReadWrite
            }
        }
    }
}

impl From<String> for CacheMode {
    fn from(value: String) -> Self {
        CacheMode::from(value.as_str())
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode_str = match self {
            CacheMode::Off => "off",
            CacheMode::Read => "read",
            CacheMode::ReadWrite => "read-write",
            CacheMode::Write => "write",
        };
        write!(f, "{mode_str}")
    }
}

impl CacheMode {
    /// Check if the provider can be read from
    pub fn is_readable(&self) -> bool {
        matches!(self, CacheMode::Read | CacheMode::ReadWrite)
    }

    /// Check if the provider can be written to
    pub fn is_writable(&self) -> bool {
        matches!(self, CacheMode::Write | CacheMode::ReadWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        assert_eq!(CacheMode::from("off"), CacheMode::Off);
        assert_eq!(CacheMode::from("READ"), CacheMode::Read);
        assert_eq!(CacheMode::from("write"), CacheMode::Write);
        assert_eq!(CacheMode::from("read-write"), CacheMode::ReadWrite);
        assert_eq!(CacheMode::from("bogus"), CacheMode::ReadWrite);
    }

    #[test]
    fn test_capabilities() {
        assert!(!CacheMode::Off.is_readable());
        assert!(!CacheMode::Off.is_writable());
        assert!(CacheMode::Read.is_readable());
        assert!(!CacheMode::Read.is_writable());
        assert!(!CacheMode::Write.is_readable());
        assert!(CacheMode::Write.is_writable());
        assert_eq!(CacheMode::ReadWrite.to_string(), "read-write");
    }
}
