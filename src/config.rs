//! Registry configuration parsing.

use serde::Deserialize;
use std::path::Path;

/// Registry configuration loaded from a TOML file.
///
/// Lists the stores a registry opens at construction, via
/// [`StoreRegistry::from_config`](crate::StoreRegistry::from_config).
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Stores to open.
    #[serde(default)]
    pub stores: Vec<StoreConfig>,
}

/// A single store entry.
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Path to the store directory.
    pub path: String,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(String, std::io::Error),
    /// TOML parse error.
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Failed to read config file '{}': {}", path, e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[[stores]]
path = "/var/lib/app/store-a"

[[stores]]
path = "/var/lib/app/store-b"
"#;
        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.stores.len(), 2);
        assert_eq!(
            config.stores.first().unwrap().path,
            "/var/lib/app/store-a"
        );
        assert_eq!(config.stores.get(1).unwrap().path, "/var/lib/app/store-b");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::from_str("").unwrap();
        assert!(config.stores.is_empty());
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::from_str("stores = 3");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/nonexistent/kv-registry.toml");
        assert!(matches!(result, Err(ConfigError::Io(_, _))));
    }
}
