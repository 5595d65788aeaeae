//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with INSIGHTCAST_)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! Secrets like the database URL and the SALT hashing secret stay in
//! environment variables, not in the config file.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Global application configuration
pub static APP_CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    })
});

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    /// Public base URL used when building upload links.
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "InsightCast".to_string(),
            base_url: "http://localhost:5000".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory uploaded images are written to and served from.
    pub directory: String,
    /// Upload size cap in bytes.
    pub max_file_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            directory: "uploads".to_string(),
            max_file_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub server: ServerConfig,
    pub uploads: UploadConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("INSIGHTCAST").separator("__"))
            .build()?
            .try_deserialize()
    }
}

/// Force the lazy config to load so startup failures surface early.
pub fn init() {
    let config = &*APP_CONFIG;
    log::debug!(
        "Configuration loaded: site '{}' at {}",
        config.site.name,
        config.site.base_url
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.uploads.max_file_bytes, 5 * 1024 * 1024);
        assert!(!config.uploads.directory.is_empty());
    }
}
