use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub env: String,
    pub http_server: HttpServerConfig,
    pub db: DbConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    /// Deadline applied to every storage call made on behalf of a request.
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub url: String,
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: "local".to_string(),
            http_server: HttpServerConfig::default(),
            db: DbConfig::default(),
        }
    }
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8085,
            request_timeout_ms: 4000,
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:workouts.db?mode=rwc".to_string(),
            pool_size: 5,
            busy_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Load `CONFIG_PATH` (default `config.toml`, skipped when absent), then
    /// apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut config = Self::from_file_if_exists(Path::new(&path))?;
        config.apply_overrides(|var| env::var(var).ok())?;
        Ok(config)
    }

    pub fn from_file_if_exists(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Override fields from variables returned by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("APP_ENV") {
            self.env = v;
        }
        if let Some(v) = lookup("HOST") {
            self.http_server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.http_server.port = parse_var("PORT", v)?;
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_MS") {
            self.http_server.request_timeout_ms = parse_var("REQUEST_TIMEOUT_MS", v)?;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.db.url = v;
        }
        if let Some(v) = lookup("DB_POOL_SIZE") {
            self.db.pool_size = parse_var("DB_POOL_SIZE", v)?;
        }
        if let Some(v) = lookup("DB_BUSY_TIMEOUT_MS") {
            self.db.busy_timeout_ms = parse_var("DB_BUSY_TIMEOUT_MS", v)?;
        }
        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.http_server.host, self.http_server.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.http_server.request_timeout_ms)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.db.busy_timeout_ms)
    }
}

fn parse_var<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}
