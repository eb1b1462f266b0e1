//! # API Configuration
//!
//! Environment-based configuration for the analytics API service.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Default upload ceiling: 16 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Invalid configuration value
#[derive(Debug, Error)]
#[error("invalid value for {key}: '{value}'")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub server_addr: SocketAddr,

    /// CSV served by the default summary and analytics endpoints
    pub data_file: PathBuf,

    /// Maximum accepted request body for uploads
    pub max_upload_bytes: usize,

    /// Directory where uploads are staged while being analyzed
    pub upload_dir: PathBuf,

    /// Logging level
    pub log_level: String,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server_addr = match lookup("SERVER_ADDR") {
            Some(v) => v.parse().map_err(|_| ConfigError {
                key: "SERVER_ADDR",
                value: v,
            })?,
            None => defaults.server_addr,
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(v) => v.parse().map_err(|_| ConfigError {
                key: "MAX_UPLOAD_BYTES",
                value: v,
            })?,
            None => defaults.max_upload_bytes,
        };

        Ok(Self {
            server_addr,
            data_file: lookup("DATA_FILE").map_or(defaults.data_file, PathBuf::from),
            max_upload_bytes,
            upload_dir: lookup("UPLOAD_DIR").map_or(defaults.upload_dir, PathBuf::from),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            cors_origins: lookup("CORS_ORIGINS").map_or(defaults.cors_origins, |v| {
                v.split(',').map(|s| s.trim().to_owned()).collect()
            }),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            data_file: PathBuf::from("data/clinical_trials.csv"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_dir: env::temp_dir(),
            log_level: "info".to_owned(),
            cors_origins: vec!["*".to_owned()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server_addr.port(), 8000);
        assert_eq!(config.data_file, PathBuf::from("data/clinical_trials.csv"));
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.cors_origins, vec!["*"]);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_ADDR", "127.0.0.1:9000"),
            ("DATA_FILE", "/srv/trials.csv"),
            ("MAX_UPLOAD_BYTES", "1024"),
            ("UPLOAD_DIR", "/var/tmp/uploads"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
        ]))
        .unwrap();
        assert_eq!(config.server_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.data_file, PathBuf::from("/srv/trials.csv"));
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.upload_dir, PathBuf::from("/var/tmp/uploads"));
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_invalid_value() {
        let err = Config::from_lookup(lookup(&[("MAX_UPLOAD_BYTES", "lots")])).unwrap_err();
        assert_eq!(err.key, "MAX_UPLOAD_BYTES");
        assert!(err.to_string().contains("lots"));
    }
}
