//! RON configuration parsing for the API server

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Environment variable overriding `listen` (comma separated)
pub const LISTEN_ENV: &str = "MATHQUEST_LISTEN";

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Listen addresses (e.g., "0.0.0.0:5000")
    #[serde(default = "default_listen")]
    pub listen: Vec<String>,
    /// Storage backend
    #[serde(default)]
    pub storage: StorageConfig,
    /// Curriculum file or directory; the built-in catalog when absent
    #[serde(default)]
    pub curriculum: Option<String>,
    /// Acting user resolution
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Create the demo learner when the user table is empty
    #[serde(default = "default_true")]
    pub seed_demo_user: bool,
    /// Tokio worker threads (defaults to the CPU count)
    #[serde(default)]
    pub workers: Option<usize>,
}

fn default_listen() -> Vec<String> {
    vec!["127.0.0.1:5000".to_string()]
}

fn default_true() -> bool {
    true
}

/// Storage backend selection
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub enum StorageConfig {
    /// Process-lifetime maps; everything is lost on exit
    #[default]
    Memory,
    /// native_db database file at the given path
    NativeDb(String),
}

/// Where the acting user comes from
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentityConfig {
    /// Header carrying the authenticated user ID
    #[serde(default = "default_user_header")]
    pub user_header: String,
    /// User assumed by reads when no header is present
    #[serde(default = "default_placeholder_user")]
    pub placeholder_user: Option<u64>,
}

fn default_user_header() -> String {
    "x-user-id".to_string()
}

fn default_placeholder_user() -> Option<u64> {
    Some(1)
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_header: default_user_header(),
            placeholder_user: default_placeholder_user(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            storage: StorageConfig::default(),
            curriculum: None,
            identity: IdentityConfig::default(),
            seed_demo_user: default_true(),
            workers: None,
        }
    }
}

impl Config {
    /// Load configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse and validate a RON document
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            ron::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MATHQUEST_LISTEN` if set
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(LISTEN_ENV) {
            self.override_listen(&value);
        }
    }

    /// Replace `listen` with a comma separated address list
    pub fn override_listen(&mut self, value: &str) {
        let addrs: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if !addrs.is_empty() {
            self.listen = addrs;
        }
    }

    /// Parsed listen addresses
    pub fn listen_addrs(&self) -> Result<Vec<SocketAddr>, ConfigError> {
        self.listen
            .iter()
            .map(|addr| {
                addr.parse()
                    .map_err(|_| ConfigError::Validation(format!("invalid listen address: {addr}")))
            })
            .collect()
    }

    /// Worker thread count for the runtime
    pub fn worker_threads(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.is_empty() {
            return Err(ConfigError::Validation("listen must not be empty".to_string()));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::Validation("workers must be at least 1".to_string()));
        }
        if self.identity.placeholder_user == Some(0) {
            return Err(ConfigError::Validation(
                "placeholder_user must be a positive id".to_string(),
            ));
        }
        if self.identity.user_header.trim().is_empty() {
            return Err(ConfigError::Validation("user_header must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::parse("()").unwrap();
        assert_eq!(config.listen, vec!["127.0.0.1:5000"]);
        assert_eq!(config.storage, StorageConfig::Memory);
        assert_eq!(config.identity.user_header, "x-user-id");
        assert_eq!(config.identity.placeholder_user, Some(1));
        assert!(config.seed_demo_user);
        assert!(config.curriculum.is_none());
    }

    #[test]
    fn test_full_document() {
        let config = Config::parse(
            r#"
            (
                listen: ["0.0.0.0:8080", "[::1]:8080"],
                storage: NativeDb("data/mathquest.db"),
                curriculum: Some("config/curriculum.ron"),
                identity: (user_header: "x-auth-user", placeholder_user: None),
                seed_demo_user: false,
                workers: Some(2),
            )
            "#,
        )
        .unwrap();

        assert_eq!(config.listen_addrs().unwrap().len(), 2);
        assert_eq!(
            config.storage,
            StorageConfig::NativeDb("data/mathquest.db".to_string())
        );
        assert_eq!(config.identity.user_header, "x-auth-user");
        assert_eq!(config.identity.placeholder_user, None);
        assert!(!config.seed_demo_user);
        assert_eq!(config.worker_threads(), 2);
    }

    #[test]
    fn test_override_listen() {
        let mut config = Config::default();
        config.override_listen(" 127.0.0.1:9000 ,127.0.0.1:9001,");
        assert_eq!(config.listen, vec!["127.0.0.1:9000", "127.0.0.1:9001"]);

        config.override_listen(" , ");
        assert_eq!(config.listen.len(), 2);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Config::parse("(workers: Some(0))"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            Config::parse("(listen: [])"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            Config::parse("(listen: 5)"),
            Err(ConfigError::Parse(_))
        ));

        let config = Config::parse(r#"(listen: ["not an address"])"#).unwrap();
        assert!(config.listen_addrs().is_err());
    }
}
