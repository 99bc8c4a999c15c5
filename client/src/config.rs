//! Configuration management for the client.

use crate::remote::{post_item_mapper, quote_item_mapper, ItemMapper};
use crate::resolver::ResolverMode;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Shape of the items the remote returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoteFormat {
    /// `{"text", "category"}` objects
    #[default]
    Quotes,
    /// `{"id", "title", "body"}` posts
    Posts,
}

impl RemoteFormat {
    /// The mapper that reads this format.
    pub fn mapper(&self) -> ItemMapper {
        match self {
            RemoteFormat::Quotes => quote_item_mapper(),
            RemoteFormat::Posts => post_item_mapper(),
        }
    }
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL returning the remote snapshot
    pub server_url: String,
    /// Time between periodic syncs; zero disables them
    pub sync_interval: Duration,
    /// Directory of the file-backed store
    pub storage_dir: PathBuf,
    /// How conflicts are decided
    pub resolution: ResolverMode,
    /// Shape of remote items
    pub remote_format: RemoteFormat,
    /// Timeout for one remote fetch
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_url = lookup("QUOTE_SERVER_URL").ok_or(ConfigError::MissingServerUrl)?;

        let sync_interval = lookup("SYNC_INTERVAL_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid("SYNC_INTERVAL_SECS"))?;

        let storage_dir = lookup("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".quotesync"));

        let resolution = match lookup("RESOLUTION_MODE") {
            Some(mode) => mode
                .parse()
                .map_err(|_| ConfigError::Invalid("RESOLUTION_MODE"))?,
            None => ResolverMode::default(),
        };

        let remote_format = match lookup("REMOTE_FORMAT").as_deref().map(str::trim) {
            None | Some("quotes") => RemoteFormat::Quotes,
            Some("posts") => RemoteFormat::Posts,
            Some(_) => return Err(ConfigError::Invalid("REMOTE_FORMAT")),
        };

        let http_timeout = lookup("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid("HTTP_TIMEOUT_SECS"))?;

        Ok(Self {
            server_url,
            sync_interval,
            storage_dir,
            resolution,
            remote_format,
            http_timeout,
        })
    }

    /// The periodic sync period, if enabled.
    pub fn sync_period(&self) -> Option<Duration> {
        (!self.sync_interval.is_zero()).then_some(self.sync_interval)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("QUOTE_SERVER_URL environment variable is required")]
    MissingServerUrl,

    #[error("Invalid {0} value")]
    Invalid(&'static str),
}
