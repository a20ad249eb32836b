//! Service configuration.
//!
//! Defaults, then an optional TOML file, then `APPWATCH_`-prefixed
//! environment variables, then a couple of direct variables kept for
//! deployment convenience (`BIND_ADDR`, `DATABASE_URL`).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "127.0.0.1:8080".to_string(),
                log_level: "info".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/appwatch".to_string(),
                max_connections: 5,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration, optionally from an explicit file path.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut settings = config::Config::builder();

        let defaults = AppConfig::default();
        settings = settings.add_source(
            config::Config::try_from(&defaults).map_err(|e| Error::Config(e.to_string()))?,
        );

        let candidates = ["appwatch.toml", "config/appwatch.toml"];
        if let Some(path) = path {
            settings = settings.add_source(config::File::with_name(path));
        } else {
            for candidate in &candidates {
                if std::path::Path::new(candidate).exists() {
                    settings = settings.add_source(config::File::with_name(candidate));
                    break;
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("APPWATCH")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: AppConfig = settings
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))?;

        if let Ok(bind_addr) = std::env::var("BIND_ADDR") {
            config.server.bind_addr = bind_addr;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.database.max_connections, 5);
    }
}
