//! Subcommands of the `podium` binary

pub mod info;
pub mod practice;
pub mod presets;
pub mod scores;
pub mod stats;
pub mod topics;

use anyhow::{Context, Result};
use clap::Args;
use podium_client::{ClientConfig, HttpBackend};

/// Where to reach the debate backend
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Backend API root
    #[arg(long, env = "PODIUM_API_URL")]
    pub api_url: Option<String>,

    /// Session cookie issued by the web login
    #[arg(long, env = "PODIUM_SESSION_COOKIE", hide_env_values = true)]
    pub session_cookie: Option<String>,
}

impl BackendArgs {
    /// Environment configuration with command-line overrides applied
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_env().context("Invalid backend configuration")?;
        if let Some(url) = &self.api_url {
            config = config.with_api_url(url.clone());
        }
        if let Some(cookie) = &self.session_cookie {
            config = config.with_session_cookie(cookie.clone());
        }
        config.validate()?;
        Ok(config)
    }

    pub fn connect(&self) -> Result<HttpBackend> {
        let config = self.client_config()?;
        HttpBackend::new(&config)
            .with_context(|| format!("Failed to create client for {}", config.api_url))
    }
}

/// `m:ss` rendering of a number of seconds
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
