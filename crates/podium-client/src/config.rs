//! Client configuration
//!
//! Handles the backend URL, session credentials and request timeouts.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default backend location for local development
pub const DEFAULT_API_URL: &str = "http://localhost:5001/api";

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidEnvVar { name: &'static str, value: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Debate backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend API root (env: PODIUM_API_URL)
    pub api_url: String,
    /// Session cookie issued by the OAuth login (env: PODIUM_SESSION_COOKIE)
    pub session_cookie: Option<String>,
    /// Timeout for non-streaming calls (env: PODIUM_TIMEOUT_SECS)
    pub request_timeout: Duration,
    /// Timeout for establishing connections
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_cookie: None,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let request_timeout = match env::var("PODIUM_TIMEOUT_SECS") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidEnvVar {
                    name: "PODIUM_TIMEOUT_SECS",
                    value,
                })?,
            Err(_) => defaults.request_timeout,
        };

        let config = Self {
            api_url: env::var("PODIUM_API_URL").unwrap_or(defaults.api_url),
            session_cookie: env::var("PODIUM_SESSION_COOKIE")
                .ok()
                .filter(|c| !c.trim().is_empty()),
            request_timeout,
            connect_timeout: defaults.connect_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Use a different backend root
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_url must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }
        Ok(())
    }

    /// API root without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}
