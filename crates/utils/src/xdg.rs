use std::env;
use std::path::PathBuf;

/// XDG Base Directory paths for coalesce
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CONFIG_HOME/coalesce or fallback
    pub fn config_dir() -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".config"))
                    .unwrap_or_else(|| PathBuf::from(".config"))
            })
            .join("coalesce")
    }

    /// Default location of the JSON config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.json")
    }
}
