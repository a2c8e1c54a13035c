//! Configuration system for the incidents service.
//!
//! Uses `figment` for layered configuration: defaults → user config →
//! explicit config file → environment variables → CLI overrides.

use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration for the incidents server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Path of the SQLite database file.
    pub database_path: PathBuf,
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    /// Directory for JSON log files (disabled when unset).
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_path: PathBuf::from("./incidents.db"),
            busy_timeout_ms: 5000,
            log_dir: None,
        }
    }
}

impl ServerConfig {
    /// `host:port` string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Explicit overrides applied on top of every other layer.
///
/// Only the fields that are `Some` replace the lower layers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

/// Location of the per-user configuration file.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "incidents", "incidents")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration with layered merging.
///
/// Order (later wins):
/// 1. Built-in defaults
/// 2. User config (`~/.config/incidents/config.toml` or platform equivalent)
/// 3. `config_file`, which must exist when given
/// 4. Environment variables (`INCIDENTS_PORT`, `INCIDENTS_DATABASE_PATH`, ...)
/// 5. `overrides`
pub fn load_config(
    config_file: Option<&Path>,
    overrides: Option<&ConfigOverrides>,
) -> Result<ServerConfig> {
    let mut figment = Figment::from(Serialized::defaults(ServerConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("INCIDENTS_"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config = figment
        .extract()
        .map_err(|e| ConfigError::Extract(Box::new(e)))?;
    Ok(config)
}
