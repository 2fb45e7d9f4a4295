//! Presets command - Session lengths and turn options
//!
//! Usage:
//! ```bash
//! podium presets
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use podium_core::DurationPreset;

/// Arguments for the presets command
#[derive(Args)]
pub struct PresetsArgs;

/// Run the presets command
pub fn run(_args: PresetsArgs) -> Result<()> {
    println!("{}", "⏱ Debate Lengths".bold().cyan());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Preset").fg(Color::Cyan),
            Cell::new("Length").fg(Color::Cyan),
            Cell::new("Turn options").fg(Color::Cyan),
            Cell::new("Description").fg(Color::Cyan),
        ]);

    for preset in DurationPreset::ALL {
        let turns: Vec<String> = preset
            .turn_options()
            .iter()
            .map(|option| {
                format!(
                    "{} min ({} turns each)",
                    option.seconds / 60,
                    option.turns_each
                )
            })
            .collect();

        table.add_row(vec![
            Cell::new(format!("{:?}", preset).to_lowercase()).fg(Color::Green),
            Cell::new(preset.to_string()),
            Cell::new(turns.join("\n")).fg(Color::Yellow),
            Cell::new(preset.description()),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "Example: {}",
        "podium practice --topic 1 --preset extended --turn 5".green()
    );

    Ok(())
}
