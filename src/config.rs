//! Runtime configuration for the CLI and HTTP binaries.

use crate::ids::TemplateId;
pub use crate::resolver::DEFAULT_MAX_SPAN_DAYS;
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
/// How far ahead `next_opening` looks for an open period.
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub http_addr: String,
    pub catalog_path: Option<PathBuf>,
    pub sqlite_path: Option<PathBuf>,
    pub default_template: Option<TemplateId>,
    pub horizon_days: u32,
    /// Longest date span a single calendar or export request may resolve.
    pub max_span_days: u32,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            catalog_path: None,
            sqlite_path: None,
            default_template: None,
            horizon_days: DEFAULT_HORIZON_DAYS,
            max_span_days: DEFAULT_MAX_SPAN_DAYS,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Reads the file named by `POOL_SCHEDULE_CONFIG` (if set), then applies
    /// the individual environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match env::var_os("POOL_SCHEDULE_CONFIG") {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        base.with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("POOL_SCHEDULE_HTTP_ADDR") {
            self.http_addr = addr;
        }
        if let Some(path) = lookup("POOL_SCHEDULE_CATALOG") {
            self.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("POOL_SCHEDULE_SQLITE") {
            self.sqlite_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup("POOL_SCHEDULE_TEMPLATE") {
            let id = raw.trim().parse::<i64>().map_err(|_| ConfigError::Invalid {
                key: "POOL_SCHEDULE_TEMPLATE".to_string(),
                message: format!("'{raw}' is not a template id"),
            })?;
            self.default_template = Some(TemplateId(id));
        }
        if let Some(raw) = lookup("POOL_SCHEDULE_HORIZON_DAYS") {
            self.horizon_days = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "POOL_SCHEDULE_HORIZON_DAYS".to_string(),
                message: format!("'{raw}' is not a day count"),
            })?;
        }
        if let Some(raw) = lookup("POOL_SCHEDULE_MAX_SPAN_DAYS") {
            self.max_span_days = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "POOL_SCHEDULE_MAX_SPAN_DAYS".to_string(),
                message: format!("'{raw}' is not a day count"),
            })?;
        }
        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = level;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.http_addr.parse().map_err(|_| ConfigError::Invalid {
            key: "http_addr".to_string(),
            message: format!("'{}' is not a socket address", self.http_addr),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.horizon_days == 0 {
            return Err(ConfigError::Invalid {
                key: "horizon_days".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_span_days == 0 {
            return Err(ConfigError::Invalid {
                key: "max_span_days".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
