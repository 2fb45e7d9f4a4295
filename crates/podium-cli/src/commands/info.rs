//! Info command - Show version and configuration
//!
//! Usage:
//! ```bash
//! podium info
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use podium_client::{ClientConfig, DEFAULT_API_URL};
use podium_core::{catalog, DurationPreset};

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs;

/// Run the info command
pub fn run(_args: InfoArgs) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    println!("{}", "Podium - Debate Practice".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!();

    println!("{}", "Version Information:".bold());
    println!("  {} {}", "CLI Version:".dimmed(), version.green());
    println!();

    println!("{}", "Catalog:".bold());
    println!(
        "  {} {} topics",
        "•".cyan(),
        catalog().len().to_string().green()
    );
    let presets: Vec<String> = DurationPreset::ALL.iter().map(|p| p.to_string()).collect();
    println!("  {} {}", "•".cyan(), presets.join(", ").green());
    println!();

    println!("{}", "Configuration:".bold());
    match ClientConfig::from_env() {
        Ok(config) => {
            println!("  {} {}", "API URL:".dimmed(), config.api_url.green());
            let signed_in = if config.session_cookie.is_some() {
                "set".green()
            } else {
                "not set".yellow()
            };
            println!("  {} {}", "Session cookie:".dimmed(), signed_in);
            println!(
                "  {} {}s",
                "Request timeout:".dimmed(),
                config.request_timeout.as_secs()
            );
        }
        Err(e) => crate::print_error(&e.to_string()),
    }
    println!();

    println!("{}", "Environment:".bold());
    println!(
        "  {} PODIUM_API_URL (default {})",
        "ℹ".blue(),
        DEFAULT_API_URL
    );
    println!("  {} PODIUM_SESSION_COOKIE", "ℹ".blue());
    println!("  {} PODIUM_TIMEOUT_SECS", "ℹ".blue());
    println!("  {} RUST_LOG", "ℹ".blue());
    println!();

    Ok(())
}
