//! Scores command - Results of a finished debate
//!
//! Usage:
//! ```bash
//! podium scores <debate-id>
//! podium scores <debate-id> --json
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use podium_client::DebateBackend;
use podium_core::ScoreResult;

use super::BackendArgs;

/// Arguments for the scores command
#[derive(Args)]
pub struct ScoresArgs {
    /// Debate identifier
    debate_id: String,

    /// Also show the running feedback and transcript summary
    #[arg(long)]
    detailed: bool,

    /// Output raw JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    backend: BackendArgs,
}

/// Run the scores command
pub async fn run(args: ScoresArgs) -> Result<()> {
    let backend = args.backend.connect()?;
    let scores = backend
        .get_scores(&args.debate_id)
        .await
        .with_context(|| format!("Failed to load scores for debate {}", args.debate_id))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&scores)?);
        return Ok(());
    }

    println!("{}", "📊 Debate Results".bold().cyan());
    println!();
    println!("{}", score_table(&scores));

    if !scores.strengths.is_empty() {
        println!();
        println!("{}", "Strengths:".bold());
        for strength in &scores.strengths {
            println!("  {} {}", "✓".green(), strength);
        }
    }
    if !scores.improvements.is_empty() {
        println!();
        println!("{}", "Areas for improvement:".bold());
        for improvement in &scores.improvements {
            println!("  {} {}", "→".yellow(), improvement);
        }
    }

    if args.detailed {
        let debate = backend.get_debate(&args.debate_id).await?;
        let feedback = backend.get_feedback(&args.debate_id).await?;

        println!();
        println!("{}", "Debate:".bold());
        println!("  {} {}", "Title:".dimmed(), debate.title.green());
        println!("  {} {}", "Topic:".dimmed(), debate.topic);
        if let Some(status) = &debate.status {
            println!("  {} {}", "Status:".dimmed(), status);
        }
        println!(
            "  {} {} yours, {} from the AI",
            "Arguments:".dimmed(),
            debate.user_arguments.len(),
            debate.ai_arguments.len()
        );

        if !feedback.suggestions.is_empty() {
            println!();
            println!("{}", "Suggestions:".bold());
            for suggestion in &feedback.suggestions {
                println!("  {} {}", "•".cyan(), suggestion);
            }
        }
    }

    Ok(())
}

/// Category scores as a table
pub fn score_table(scores: &ScoreResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Category").fg(Color::Cyan),
            Cell::new("Score").fg(Color::Cyan),
        ]);

    let rows = [
        ("Overall", scores.overall_score),
        ("Logic", scores.logic_score),
        ("Persuasion", scores.persuasion_score),
        ("Structure", scores.structure_score),
    ];
    for (name, score) in rows {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{:.1}", score)).fg(score_color(score)),
        ]);
    }
    table
}

fn score_color(score: f64) -> Color {
    if score >= 8.0 {
        Color::Green
    } else if score >= 5.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_table_lists_categories() {
        let scores = ScoreResult {
            overall_score: 7.25,
            logic_score: 8.0,
            persuasion_score: 6.5,
            structure_score: 4.0,
            strengths: Vec::new(),
            improvements: Vec::new(),
        };
        let rendered = score_table(&scores).to_string();
        assert!(rendered.contains("Persuasion"));
        assert!(rendered.contains("7.2") || rendered.contains("7.3"));
        assert!(rendered.contains("4.0"));
    }

    #[test]
    fn test_score_color_bands() {
        assert_eq!(score_color(9.0), Color::Green);
        assert_eq!(score_color(5.0), Color::Yellow);
        assert_eq!(score_color(2.0), Color::Red);
    }
}
