//! TOML process configuration.
//!
//! The storage path acts as the connection string to the chosen backend.
//! A missing or malformed config file is a startup-time fatal error — storage
//! problems after startup surface per-request instead.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which record repository backs the credential store. Exactly one backend is
/// active per deployment; the credential store never knows which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Flatfile,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file for `sqlite`, JSON-lines file for `flatfile`.
    pub path: PathBuf,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [gateway]
            host = "0.0.0.0"
            port = 9000

            [storage]
            backend = "flatfile"
            path = "users.jsonl"
            "#,
        )
        .unwrap();
        assert_eq!(config.gateway.host, "0.0.0.0");
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.storage.backend, StorageBackend::Flatfile);
    }

    #[test]
    fn gateway_section_is_optional() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            backend = "sqlite"
            path = "alumni.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn storage_section_is_required() {
        let result: std::result::Result<Config, _> = toml::from_str("[gateway]\nport = 1234\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            [storage]
            backend = "mongodb"
            path = "x"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn load_missing_file_is_fatal() {
        let result = Config::load(Path::new("/nonexistent/alumnid.toml"));
        assert!(result.is_err());
    }
}
