//! Topics command - Browse the built-in topic catalog
//!
//! Usage:
//! ```bash
//! podium topics
//! podium topics --search ethics
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use podium_core::search_topics;

/// Arguments for the topics command
#[derive(Args)]
pub struct TopicsArgs {
    /// Only show topics whose name, description or category matches
    #[arg(long, short)]
    search: Option<String>,
}

/// Run the topics command
pub fn run(args: TopicsArgs) -> Result<()> {
    let query = args.search.unwrap_or_default();
    let topics = search_topics(&query);

    if topics.is_empty() {
        crate::print_warning(&format!("No topics match '{}'", query));
        println!(
            "Any text works as a topic: {}",
            "podium practice --topic \"<your topic>\"".green()
        );
        return Ok(());
    }

    println!("{}", "💡 Debate Topics".bold().cyan());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Id").fg(Color::Cyan),
            Cell::new("Topic").fg(Color::Cyan),
            Cell::new("Category").fg(Color::Cyan),
            Cell::new("Description").fg(Color::Cyan),
        ]);

    for topic in &topics {
        table.add_row(vec![
            Cell::new(topic.id),
            Cell::new(format!("{} {}", topic.icon, topic.name)).fg(Color::Green),
            Cell::new(&topic.category).fg(Color::Yellow),
            Cell::new(&topic.description),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "Start a debate: {}",
        "podium practice --topic <id or name>".green()
    );

    Ok(())
}
