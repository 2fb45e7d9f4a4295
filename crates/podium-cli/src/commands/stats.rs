//! Stats command - Aggregate statistics for the signed-in user
//!
//! Usage:
//! ```bash
//! podium stats
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use podium_client::DebateBackend;

use super::BackendArgs;

/// Arguments for the stats command
#[derive(Args)]
pub struct StatsArgs {
    /// Output raw JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    backend: BackendArgs,
}

/// Run the stats command
pub async fn run(args: StatsArgs) -> Result<()> {
    let backend = args.backend.connect()?;
    let stats = backend
        .get_user_stats()
        .await
        .context("Failed to load statistics")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "📈 Your Debates".bold().cyan());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Metric").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec![
        Cell::new("Debates started"),
        Cell::new(stats.total_debates).fg(Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Debates completed"),
        Cell::new(stats.completed_debates).fg(Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Average score"),
        Cell::new(
            stats
                .average_score
                .map(|s| format!("{:.1}", s))
                .unwrap_or_else(|| "-".to_string()),
        )
        .fg(Color::Yellow),
    ]);
    for (key, value) in &stats.extra {
        let rendered = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        table.add_row(vec![Cell::new(key), Cell::new(rendered)]);
    }

    println!("{table}");
    Ok(())
}
