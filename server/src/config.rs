//! Configuration management for the server.

use std::env;
use std::path::PathBuf;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address to bind
    pub host: String,
    pub port: u16,
    /// Quote list (import format) served at startup
    pub seed_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(port) => port.trim().parse().map_err(|_| ConfigError::InvalidPort(port))?,
            None => 3000,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            seed_file: lookup("SEED_FILE").map(PathBuf::from),
        })
    }

    /// `host:port` for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORT must be a number between 0 and 65535, got '{0}'")]
    InvalidPort(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_variables() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.seed_file, None);
    }

    #[test]
    fn reads_variables() {
        let config = Config::from_lookup(|key| match key {
            "HOST" => Some("127.0.0.1".into()),
            "PORT" => Some("8080".into()),
            "SEED_FILE" => Some("quotes.json".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.seed_file, Some(PathBuf::from("quotes.json")));
    }

    #[test]
    fn rejects_bad_port() {
        let result = Config::from_lookup(|key| (key == "PORT").then(|| "99999".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidPort(port)) if port == "99999"));
    }
}
