//! Client configuration
//!
//! Configuration is built programmatically with `with_*` methods and can be
//! topped up from environment variables. There is no config-file surface in
//! this layer; the embedding application owns that concern.

use crate::error::{ChairsideError, ChairsideResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the backend base URL
pub const ENV_BASE_URL: &str = "CHAIRSIDE_BASE_URL";

/// Environment variable overriding the durable storage directory
pub const ENV_STORAGE_DIR: &str = "CHAIRSIDE_STORAGE_DIR";

/// Timeout configuration for connection and request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Maximum time to establish a connection, in seconds
    pub connect_timeout_secs: u64,
    /// Maximum time for a full request/response cycle, in seconds
    pub request_timeout_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl TimeoutConfig {
    /// Connection timeout as a `Duration`
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Configuration for the Chairside client data layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `https://api.example-practice.com`
    pub base_url: String,
    /// Custom HTTP headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Timeout configuration
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Directory holding durable client state (session blob).
    /// `None` falls back to [`ClientConfig::default_storage_dir`].
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Create a configuration pointing at the given backend
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: HashMap::new(),
            timeouts: TimeoutConfig::default(),
            storage_dir: None,
        }
    }

    /// Set the backend base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Add a custom header sent with every request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the timeout configuration
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the durable storage directory
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Apply environment variable overrides
    ///
    /// Recognizes [`ENV_BASE_URL`] and [`ENV_STORAGE_DIR`]; unset variables
    /// leave the current values untouched.
    pub fn from_env(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(dir) = std::env::var(ENV_STORAGE_DIR) {
            if !dir.trim().is_empty() {
                self.storage_dir = Some(PathBuf::from(dir));
            }
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ChairsideResult<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(ChairsideError::config("base_url must not be empty"));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ChairsideError::config(format!(
                "base_url must start with http:// or https://, got '{url}'"
            )));
        }
        Ok(())
    }

    /// Effective durable storage directory
    pub fn storage_dir(&self) -> ChairsideResult<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_storage_dir(),
        }
    }

    /// Default durable storage directory (`~/.config/chairside`)
    pub fn default_storage_dir() -> ChairsideResult<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ChairsideError::config("Could not determine home directory"))?;
        Ok(home.join(".config").join("chairside"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let config = ClientConfig::new("https://api.example.com")
            .with_header("X-Practice-Id", "42")
            .with_timeouts(TimeoutConfig {
                connect_timeout_secs: 5,
                request_timeout_secs: 15,
            })
            .with_storage_dir("/tmp/chairside-test");

        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.headers.get("X-Practice-Id").unwrap(), "42");
        assert_eq!(config.timeouts.request_timeout(), Duration::from_secs(15));
        assert_eq!(
            config.storage_dir().unwrap(),
            PathBuf::from("/tmp/chairside-test")
        );
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("ftp://nope").validate().is_err());
        assert!(ClientConfig::new("http://localhost:8080").validate().is_ok());
    }
}
